//! Gateway module.
//!
//! The public entry point of the system: a path-routing reverse proxy in
//! front of the default agent backend and the investigation backend. The
//! gateway owns no paths of its own; every method and path forwards.

mod forward;
mod headers;
mod relay;
mod route;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::api::build_cors_layer;

pub use forward::forward;
pub use headers::sanitize;
pub use relay::{RelayError, relay};
pub use route::{
    DEFAULT_TIMEOUT, INVESTIGATION_PATH, INVESTIGATION_TIMEOUT, RouteDecision, RouteTable,
};

/// Shared gateway state; cheap to clone per request.
#[derive(Clone)]
pub struct ProxyState {
    pub routes: Arc<RouteTable>,
}

impl ProxyState {
    pub fn new(routes: RouteTable) -> Self {
        Self {
            routes: Arc::new(routes),
        }
    }
}

/// Build the gateway router: a catch-all that proxies every method and
/// path, wrapped in CORS and request tracing.
pub fn create_gateway_router(state: ProxyState, allowed_origins: &[String]) -> Router {
    let cors = build_cors_layer(allowed_origins);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .fallback(forward)
        .with_state(state)
        .layer(cors)
        .layer(trace_layer)
}
