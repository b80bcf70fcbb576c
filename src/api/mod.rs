// ============================================================================
// HTTP API - orders, views, health and metrics over actix-web
// ============================================================================

pub mod errors;
pub mod routes;
pub mod server;

pub use errors::ApiError;
pub use routes::AppState;
pub use server::{configure, start_api_server};
