//! HTTP API module.
//!
//! Serves the investigation agent surface: the streaming investigate
//! endpoint, the customer details tool, and health.

mod error;
mod handlers;
mod routes;
mod state;

// Re-export error types for external use
#[allow(unused_imports)]
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::{build_cors_layer, create_router};
pub use state::AppState;
