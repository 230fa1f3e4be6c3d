use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum_extra::extract::Query;
use serde::Deserialize;
use tracing::info;

use crate::db::models::{Message, StatusCounts, Ticket, TicketWithMessage};
use crate::engine::validation::validate_ticket_query;

use super::api_error::ApiError;
use super::app_state::AppState;

/// GET /healthz
pub async fn healthz() -> Json<&'static str> {
    Json("OK")
}

/// GET /stats — ticket totals per status.
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatusCounts> {
    Json(state.repository.count_by_status())
}

/// Raw `GET /tickets` query. Values are kept as strings so that bad input
/// becomes a 422 with a precise reason instead of an extractor rejection.
/// Every key is collected as a list so repeats never fail extraction.
#[derive(Debug, Default, Deserialize)]
pub struct TicketListParams {
    #[serde(default)]
    pub skip: Vec<String>,
    #[serde(default)]
    pub limit: Vec<String>,
    /// Repeatable: `?status=open&status=resolved`.
    #[serde(default)]
    pub status: Vec<String>,
}

/// GET /tickets — a page of tickets, each with its primary message.
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TicketListParams>,
) -> Result<Json<Vec<TicketWithMessage>>, ApiError> {
    let query = validate_ticket_query(
        &params.skip,
        &params.limit,
        &params.status,
        state.default_page_size,
    )
    .map_err(ApiError::Validation)?;

    let tickets = state.repository.list_tickets_with_message(
        query.skip,
        Some(query.limit),
        query.statuses.as_deref(),
    )?;
    Ok(Json(tickets))
}

/// GET /ticket/{ticket_id}
pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
) -> Result<Json<Ticket>, ApiError> {
    Ok(Json(state.repository.get_ticket(&ticket_id)?))
}

/// PUT /ticket/{ticket_id} — mark the ticket resolved. The file rewrite runs
/// on the blocking pool.
pub async fn resolve_ticket(
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
) -> Result<Json<Ticket>, ApiError> {
    let ticket = tokio::task::spawn_blocking(move || state.repository.resolve_ticket(&ticket_id))
        .await??;
    info!(ticket_id = %ticket.id, "ticket resolved");
    Ok(Json(ticket))
}

/// DELETE /ticket/{ticket_id} — mark the ticket deleted. The record is kept.
pub async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
) -> Result<Json<Ticket>, ApiError> {
    let ticket = tokio::task::spawn_blocking(move || state.repository.delete_ticket(&ticket_id))
        .await??;
    info!(ticket_id = %ticket.id, "ticket deleted");
    Ok(Json(ticket))
}

/// GET /ticket/{ticket_id}/message — the ticket's primary message.
pub async fn get_ticket_message(
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    Ok(Json(state.repository.get_ticket_message(&ticket_id)?))
}

/// GET /ticket/{ticket_id}/context-messages
pub async fn get_ticket_context_messages(
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    Ok(Json(
        state.repository.get_ticket_context_messages(&ticket_id)?,
    ))
}

/// GET /message/{message_id}
pub async fn get_message(
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    Ok(Json(state.repository.get_message(&message_id)?))
}
