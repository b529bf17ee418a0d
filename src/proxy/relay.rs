//! Guarded relay of backend byte streams.
//!
//! Chunks pass through untouched. A failure mid-stream becomes a trailing
//! diagnostic chunk instead of a silent truncation, and a stream that
//! closes without ever producing a byte becomes a "no data" diagnostic, so
//! the client can always tell how its body ended.

use std::convert::Infallible;

use async_stream::stream;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use log::{debug, error};
use thiserror::Error;

use crate::diag::DiagnosticChunk;

/// Transport failure surfaced while draining a backend stream.
#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct RelayError {
    pub kind: &'static str,
    pub message: String,
}

impl RelayError {
    pub fn new(kind: &'static str, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.is_empty() {
            message = "Unknown backend/proxy stream error".to_string();
        }
        Self { kind, message }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            "Timeout"
        } else if err.is_connect() {
            "Connect"
        } else if err.is_decode() {
            "Decode"
        } else if err.is_body() {
            "Body"
        } else {
            "Request"
        };
        Self::new(kind, err.to_string())
    }
}

/// Forward every chunk as received, converting a mid-stream failure or an
/// empty stream into a terminal diagnostic chunk. Never re-raises.
pub fn relay<S>(
    upstream: S,
    backend_url: String,
    method: String,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, RelayError>> + Send + 'static,
{
    stream! {
        let mut upstream = Box::pin(upstream);
        let mut yielded = false;
        let mut failed = false;

        while let Some(item) = upstream.next().await {
            match item {
                Ok(chunk) => {
                    debug!("[PROXY] relaying backend chunk of {} bytes", chunk.len());
                    yielded = true;
                    yield Ok(chunk);
                }
                Err(err) => {
                    error!(
                        "[PROXY] streaming error: {err} | backend_url={backend_url} method={method}"
                    );
                    let chunk = DiagnosticChunk::new(format!("Proxy streaming error: {err}"))
                        .with_backend(&backend_url, &method);
                    failed = true;
                    yield Ok(chunk.to_bytes_newline_prefixed());
                    break;
                }
            }
        }

        if !yielded && !failed {
            error!(
                "[PROXY] backend yielded no chunks | backend_url={backend_url} method={method}"
            );
            let chunk = DiagnosticChunk::new("Proxy backend yielded no data")
                .with_backend(&backend_url, &method);
            yield Ok(chunk.to_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    async fn collect<S: Stream<Item = Result<Bytes, Infallible>>>(s: S) -> Vec<Bytes> {
        s.map(|item| item.unwrap()).collect().await
    }

    fn guarded(
        items: Vec<Result<Bytes, RelayError>>,
    ) -> impl Stream<Item = Result<Bytes, Infallible>> {
        relay(
            stream::iter(items),
            "http://localhost:8001".to_string(),
            "GET".to_string(),
        )
    }

    #[tokio::test]
    async fn test_clean_stream_passes_through_unchanged() {
        let chunks = collect(guarded(vec![
            Ok(Bytes::from_static(b"b1")),
            Ok(Bytes::from_static(b"b2")),
        ]))
        .await;
        assert_eq!(chunks, vec!["b1", "b2"]);
    }

    #[tokio::test]
    async fn test_empty_stream_yields_no_data_diagnostic() {
        let chunks = collect(guarded(vec![])).await;
        assert_eq!(chunks.len(), 1);
        let value: serde_json::Value = serde_json::from_slice(&chunks[0]).unwrap();
        assert_eq!(value["error"], "Proxy backend yielded no data");
        assert_eq!(value["backend_url"], "http://localhost:8001");
        assert_eq!(value["method"], "GET");
    }

    #[tokio::test]
    async fn test_error_after_chunk_appends_diagnostic() {
        let chunks = collect(guarded(vec![
            Ok(Bytes::from_static(b"b1")),
            Err(RelayError::new("Timeout", "deadline exceeded")),
        ]))
        .await;
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "b1");

        // Newline prefix keeps any partially written payload parseable.
        assert_eq!(chunks[1][0], b'\n');
        let value: serde_json::Value = serde_json::from_slice(&chunks[1][1..]).unwrap();
        assert_eq!(
            value["error"],
            "Proxy streaming error: [Timeout] deadline exceeded"
        );
        assert_eq!(value["method"], "GET");
    }

    #[tokio::test]
    async fn test_error_before_any_chunk_yields_only_the_error_diagnostic() {
        let chunks = collect(guarded(vec![Err(RelayError::new("Connect", "refused"))])).await;
        assert_eq!(chunks.len(), 1);
        let value: serde_json::Value = serde_json::from_slice(&chunks[0][1..]).unwrap();
        assert_eq!(value["error"], "Proxy streaming error: [Connect] refused");
    }

    #[tokio::test]
    async fn test_stream_terminates_at_first_error() {
        let chunks = collect(guarded(vec![
            Err(RelayError::new("Decode", "bad frame")),
            Ok(Bytes::from_static(b"never seen")),
        ]))
        .await;
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_empty_message_replaced() {
        let err = RelayError::new("Request", "");
        assert_eq!(err.to_string(), "[Request] Unknown backend/proxy stream error");
    }
}
