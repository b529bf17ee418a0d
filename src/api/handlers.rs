//! API request handlers.

use std::convert::Infallible;

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Uri, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::agent::bridge;
use crate::diag::DiagnosticChunk;

use super::error::{ApiError, ApiResult};
use super::state::AppState;

/// Longest request-body prefix included in debug logs.
const BODY_PREVIEW_LEN: usize = 200;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Body accepted by the investigation endpoint.
#[derive(Debug, Deserialize)]
pub struct InvestigateRequest {
    pub query: String,
}

/// Streaming investigation endpoint.
///
/// Always answers 200 with a chunked `application/json` body. A malformed
/// request is reported in-band as a single diagnostic chunk so streaming
/// clients keep one read path; the producer is never started for it.
#[instrument(skip(state, headers, body))]
pub async fn investigate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    info!("investigation request received");
    debug!(headers = ?headers, "investigation request headers");
    debug!(body = %preview(&body), "investigation request body");

    let query = match parse_query(&body) {
        Ok(query) => query,
        Err(reason) => {
            error!(%reason, "rejecting investigation request");
            let chunk = DiagnosticChunk::new(format!("Invalid or missing JSON body: {reason}"));
            let body = Body::from_stream(stream::once(async move {
                Ok::<_, Infallible>(chunk.to_bytes())
            }));
            return stream_response(body);
        }
    };

    info!(query = %query, "starting investigation");
    let events = state.investigator.investigate(query.clone());
    stream_response(Body::from_stream(bridge(events, query)))
}

/// Decode the investigation request body.
///
/// An empty `query` counts as missing: there is nothing to investigate.
fn parse_query(raw: &[u8]) -> Result<String, String> {
    let req: InvestigateRequest = serde_json::from_slice(raw).map_err(|e| e.to_string())?;
    if req.query.is_empty() {
        return Err("Missing 'query' field in JSON body".to_string());
    }
    Ok(req.query)
}

/// Wrap a chunked body in a streaming JSON response.
fn stream_response(body: Body) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

fn preview(body: &Bytes) -> String {
    String::from_utf8_lossy(&body[..body.len().min(BODY_PREVIEW_LEN)]).into_owned()
}

/// Body accepted by the customer details tool.
#[derive(Debug, Deserialize)]
pub struct ToolInvokeRequest {
    pub customer_id: String,
}

/// Tool invocation response envelope.
#[derive(Debug, Serialize)]
pub struct ToolInvokeResponse {
    pub output: Value,
}

/// Invoke the customer details tool over HTTP.
#[instrument(skip(state, body))]
pub async fn invoke_customer_tool(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<ToolInvokeResponse>> {
    let req: ToolInvokeRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid tool invocation body: {e}")))?;

    info!(customer_id = %req.customer_id, "tool invocation: get_customer_details");
    Ok(Json(ToolInvokeResponse {
        output: state.customers.lookup_output(&req.customer_id),
    }))
}

/// JSON 404 for unknown routes.
pub async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {uri}"))
}
