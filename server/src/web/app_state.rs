use crate::engine::ticket_repository::TicketRepository;

/// Shared state handed to every HTTP handler.
pub struct AppState {
    pub repository: TicketRepository,
    /// Page size for `GET /tickets` when the client omits `limit`.
    pub default_page_size: usize,
    /// The single origin allowed by CORS.
    pub cors_origin: String,
}
