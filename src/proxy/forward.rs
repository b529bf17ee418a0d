//! Reverse proxy request forwarding.
//!
//! One handler serves every proxied method and path: resolve the backend,
//! sanitize headers, forward with a per-request client, then relay the
//! response. POST responses are buffered and replayed as one chunk; every
//! other method streams through the relay guard. A failure before the
//! first backend byte is a 502 carrying a diagnostic chunk.

use std::convert::Infallible;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::StreamExt;
use log::{debug, error, info};

use crate::diag::DiagnosticChunk;

use super::ProxyState;
use super::headers::sanitize;
use super::relay::{RelayError, relay};

/// Bytes of payload included in debug previews.
const PREVIEW_LEN: usize = 200;

/// Forward one inbound request to its resolved backend and relay the
/// response.
pub async fn forward(State(state): State<ProxyState>, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let method = parts.method.clone();
    let path = parts.uri.path().to_string();
    let query = parts.uri.query().map(str::to_owned);

    let decision = state.routes.resolve(&path);
    let backend_url = decision.backend_url.clone();

    info!("[PROXY] incoming {method} {path} -> {backend_url}{path}");
    debug!("[PROXY] request headers: {:?}", parts.headers);

    let req_body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            error!("[PROXY] failed to read request body: {err} | backend_url={backend_url} method={method}");
            return proxy_error_response(format!("Proxy error: {err}"), &backend_url, &method);
        }
    };
    debug!(
        "[PROXY] request body (first {PREVIEW_LEN} bytes): {}",
        preview(&req_body)
    );

    let clean_headers = sanitize(&parts.headers, &path);
    debug!("[PROXY] outgoing headers to backend: {clean_headers:?}");

    // A fresh client per request: connection state never crosses requests,
    // and the route deadline applies to the whole exchange.
    let client = match reqwest::Client::builder().timeout(decision.timeout).build() {
        Ok(client) => client,
        Err(err) => {
            error!("[PROXY] failed to build outbound client: {err}");
            return proxy_error_response(format!("Proxy error: {err}"), &backend_url, &method);
        }
    };

    let mut target = format!("{backend_url}{path}");
    if let Some(ref q) = query {
        target.push('?');
        target.push_str(q);
    }
    debug!("[PROXY] sending request to backend: {target}");

    let outbound = client
        .request(method.clone(), &target)
        .headers(clean_headers)
        .body(req_body);

    let backend_resp = match outbound.send().await {
        Ok(resp) => resp,
        Err(err) => {
            error!("[PROXY] exception before backend response: {err} | backend_url={backend_url} method={method}");
            return proxy_error_response(format!("Proxy error: {err}"), &backend_url, &method);
        }
    };

    let status = backend_resp.status();
    info!("[PROXY] backend response status: {status}");
    debug!("[PROXY] backend response headers: {:?}", backend_resp.headers());

    let headers = response_headers(backend_resp.headers());

    if method == Method::POST {
        // Buffer the full body and reply with a single-chunk stream.
        let body = match backend_resp.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => {
                error!("[PROXY] failed reading backend response: {err} | backend_url={backend_url} method={method}");
                return proxy_error_response(format!("Proxy error: {err}"), &backend_url, &method);
            }
        };
        debug!(
            "[PROXY] backend response body (first {PREVIEW_LEN} bytes): {}",
            preview(&body)
        );
        let single = futures::stream::once(async move { Ok::<_, Infallible>(body) });
        build_response(status, headers, Body::from_stream(single))
    } else {
        let upstream = backend_resp
            .bytes_stream()
            .map(|item| item.map_err(RelayError::from));
        let guarded = relay(upstream, backend_url, method.to_string());
        build_response(status, headers, Body::from_stream(guarded))
    }
}

/// Backend headers minus the fields that no longer describe the relayed
/// body.
fn response_headers(raw: &HeaderMap) -> HeaderMap {
    let mut headers = raw.clone();
    headers.remove(header::CONTENT_ENCODING);
    headers.remove(header::CONTENT_LENGTH);
    headers
}

fn build_response(status: StatusCode, headers: HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// 502 with a diagnostic chunk naming the target, for failures before any
/// backend byte reached the client.
fn proxy_error_response(message: String, backend_url: &str, method: &Method) -> Response {
    let chunk = DiagnosticChunk::new(message).with_backend(backend_url, method.as_str());
    (
        StatusCode::BAD_GATEWAY,
        [(header::CONTENT_TYPE, "application/json")],
        chunk.to_bytes(),
    )
        .into_response()
}

fn preview(bytes: &[u8]) -> String {
    let end = bytes.len().min(PREVIEW_LEN);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
