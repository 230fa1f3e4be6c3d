pub mod api_error;
pub mod app_state;
pub mod rest_api;
pub mod router;
