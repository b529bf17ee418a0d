//! Request header sanitization.

use axum::http::{HeaderMap, HeaderValue, header};

use super::route::INVESTIGATION_PATH;

/// Framing and hop-by-hop headers never forwarded to a backend. Header
/// names are compared lowercased, which `HeaderName` guarantees.
const DENY_LIST: [&str; 5] = [
    "host",
    "content-length",
    "transfer-encoding",
    "connection",
    "accept-encoding",
];

/// Copy `raw` minus the deny-list. Duplicate names collapse to the last
/// value seen. The investigation route additionally gets its content type
/// pinned to JSON no matter what the client sent.
pub fn sanitize(raw: &HeaderMap, path: &str) -> HeaderMap {
    let mut clean = HeaderMap::new();
    for (name, value) in raw {
        if DENY_LIST.contains(&name.as_str()) {
            continue;
        }
        clean.insert(name.clone(), value.clone());
    }

    if path == INVESTIGATION_PATH {
        clean.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
    }

    clean
}
