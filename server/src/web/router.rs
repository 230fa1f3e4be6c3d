use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tracing::warn;

use super::app_state::AppState;
use super::rest_api;

const FALLBACK_ORIGIN: &str = "http://localhost:3000";

/// Build the axum router with all HTTP routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Only the configured frontend origin, and only the verbs the API uses
    let origin = state.cors_origin.parse::<HeaderValue>().unwrap_or_else(|_| {
        warn!(
            origin = %state.cors_origin,
            "invalid CORS origin, falling back to {}", FALLBACK_ORIGIN
        );
        HeaderValue::from_static(FALLBACK_ORIGIN)
    });
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::PUT, Method::DELETE]);

    Router::new()
        .route("/healthz", get(rest_api::healthz))
        .route("/stats", get(rest_api::get_stats))
        .route("/tickets", get(rest_api::list_tickets))
        .route(
            "/ticket/{ticket_id}",
            get(rest_api::get_ticket)
                .put(rest_api::resolve_ticket)
                .delete(rest_api::delete_ticket),
        )
        .route(
            "/ticket/{ticket_id}/message",
            get(rest_api::get_ticket_message),
        )
        .route(
            "/ticket/{ticket_id}/context-messages",
            get(rest_api::get_ticket_context_messages),
        )
        .route("/message/{message_id}", get(rest_api::get_message))
        .layer(cors)
        .with_state(state)
}
