//! HTTP API serving forecast overlays

pub mod handlers;
pub mod models;
pub mod routes;

pub use handlers::{ApiError, AppState};
pub use routes::create_router;
