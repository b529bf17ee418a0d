//! Diagnostic chunk payloads.
//!
//! Every failure reported on a streaming path, by the gateway or by the
//! agent service, is one JSON object with an `error` field plus optional
//! context. A client tells a clean end-of-stream from a failure by checking
//! whether the tail of the body parses as this shape.

use bytes::Bytes;
use serde::Serialize;

/// Structured error payload emitted as a single chunk of a response body.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticChunk {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

impl DiagnosticChunk {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            backend_url: None,
            method: None,
        }
    }

    /// Attach the backend target and HTTP method for proxy-side context.
    pub fn with_backend(
        mut self,
        backend_url: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        self.backend_url = Some(backend_url.into());
        self.method = Some(method.into());
        self
    }

    /// Wire bytes, falling back to a literal payload if serialization fails.
    pub fn to_bytes(&self) -> Bytes {
        match serde_json::to_vec(self) {
            Ok(buf) => Bytes::from(buf),
            Err(_) => Bytes::from_static(br#"{"error": "diagnostic serialization failed"}"#),
        }
    }

    /// Wire bytes with a leading newline, for streams that may already have
    /// written payload bytes.
    pub fn to_bytes_newline_prefixed(&self) -> Bytes {
        let mut buf = vec![b'\n'];
        buf.extend_from_slice(&self.to_bytes());
        Bytes::from(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_diagnostic_has_no_context_fields() {
        let chunk = DiagnosticChunk::new("something failed");
        let text = String::from_utf8(chunk.to_bytes().to_vec()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["error"], "something failed");
        assert!(value.get("backend_url").is_none());
        assert!(value.get("method").is_none());
    }

    #[test]
    fn test_backend_context_included() {
        let chunk = DiagnosticChunk::new("Proxy error: connect refused")
            .with_backend("http://localhost:8001", "GET");
        let value: serde_json::Value =
            serde_json::from_slice(&chunk.to_bytes()).unwrap();
        assert_eq!(value["backend_url"], "http://localhost:8001");
        assert_eq!(value["method"], "GET");
    }

    #[test]
    fn test_newline_prefix() {
        let chunk = DiagnosticChunk::new("mid-stream failure");
        let bytes = chunk.to_bytes_newline_prefixed();
        assert_eq!(bytes[0], b'\n');
        let value: serde_json::Value = serde_json::from_slice(&bytes[1..]).unwrap();
        assert_eq!(value["error"], "mid-stream failure");
    }
}
