use axum::Json;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{error, warn};

use crate::engine::ticket_repository::RepositoryError;

/// Header carrying the specific reason behind an error response.
pub const X_ERROR: HeaderName = HeaderName::from_static("x-error");

/// Error returned from HTTP handlers.
///
/// Body is `{"detail": "..."}`; repository errors also set `X-Error` with
/// the precise message (which id was missing, why the save failed).
#[derive(Debug)]
pub enum ApiError {
    Repository(RepositoryError),
    /// Rejected query parameters. Raised before the repository is touched.
    Validation(String),
    /// A blocking repository task panicked or was cancelled.
    Internal(String),
}

impl From<RepositoryError> for ApiError {
    fn from(e: RepositoryError) -> Self {
        ApiError::Repository(e)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Repository(RepositoryError::TicketNotFound(_))
            | ApiError::Repository(RepositoryError::MessageNotFound { .. })
            | ApiError::Repository(RepositoryError::AuthorNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Repository(RepositoryError::SaveFailed(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            ApiError::Repository(RepositoryError::TicketNotFound(_)) => "Ticket not found",
            ApiError::Repository(RepositoryError::MessageNotFound { .. }) => "Message not found",
            ApiError::Repository(RepositoryError::AuthorNotFound(_)) => "Author not found",
            ApiError::Repository(RepositoryError::SaveFailed(_)) => "Save failed.",
            ApiError::Validation(reason) => reason,
            ApiError::Internal(_) => "Internal server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response =
            (status, Json(serde_json::json!({ "detail": self.detail() }))).into_response();

        match &self {
            ApiError::Repository(e) => {
                let reason = e.to_string();
                warn!(status = status.as_u16(), error = %reason, "request failed");
                if let Ok(value) = HeaderValue::from_str(&reason) {
                    response.headers_mut().insert(X_ERROR, value);
                }
            }
            ApiError::Internal(reason) => error!(error = %reason, "repository task failed"),
            ApiError::Validation(_) => {}
        }
        response
    }
}
