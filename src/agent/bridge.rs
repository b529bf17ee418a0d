//! Streaming bridge from a producer event channel to response body chunks.
//!
//! One bridge serves one investigation request. Fragments pass through as
//! raw UTF-8 bytes; a run that never produces a fragment ends with a single
//! diagnostic chunk, and a producer failure ends the stream with a
//! diagnostic built from its message. Nothing escapes to the HTTP layer as
//! an error: the body itself is the error channel.

use std::convert::Infallible;

use async_stream::stream;
use bytes::Bytes;
use futures::Stream;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::diag::DiagnosticChunk;

use super::events::AgentEvent;
use super::normalizer::{self, EventTrace};

/// Item a producer task sends for one run.
pub type EventResult = anyhow::Result<AgentEvent>;

/// Consumer handle for one run. Dropping it stops the producer at its next
/// send.
pub type EventRx = mpsc::Receiver<EventResult>;

/// Terminal payload when a run produced no client-visible fragment.
pub const NO_EVENTS_MESSAGE: &str = "No response from agent (no events yielded).";

/// Drain one run's events into response body chunks.
pub fn bridge(
    mut events: EventRx,
    query: String,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    stream! {
        debug!(query = %query, "bridging investigation events");

        let mut emitted = false;
        let mut failed = false;
        let mut trace = EventTrace::new();

        while let Some(item) = events.recv().await {
            match item {
                Ok(event) => {
                    trace.record(&event);
                    if let Some(fragment) = normalizer::normalize(&event) {
                        emitted = true;
                        yield Ok(Bytes::from(fragment.into_bytes()));
                    }
                }
                Err(err) => {
                    error!(query = %query, "agent run failed: {err:#}");
                    failed = true;
                    yield Ok(DiagnosticChunk::new(format!("Agent error: {err}")).to_bytes());
                    break;
                }
            }
        }

        let outcome = if failed {
            "producer_error"
        } else if emitted {
            "completed"
        } else {
            yield Ok(DiagnosticChunk::new(NO_EVENTS_MESSAGE).to_bytes());
            "no_fragments"
        };
        trace.flush(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use futures::StreamExt;

    async fn collect(stream: impl Stream<Item = Result<Bytes, Infallible>>) -> Vec<Bytes> {
        stream.map(|item| item.unwrap()).collect().await
    }

    fn channel() -> (mpsc::Sender<EventResult>, EventRx) {
        mpsc::channel(16)
    }

    #[tokio::test]
    async fn test_fragments_pass_through_without_trailer() {
        let (tx, rx) = channel();
        tx.send(Ok(AgentEvent::text("agent", "first chunk")))
            .await
            .unwrap();
        tx.send(Ok(AgentEvent::text("agent", "second chunk")))
            .await
            .unwrap();
        drop(tx);

        let chunks = collect(bridge(rx, "q".to_string())).await;
        assert_eq!(chunks, vec!["first chunk", "second chunk"]);
    }

    #[tokio::test]
    async fn test_empty_run_yields_single_diagnostic() {
        let (tx, rx) = channel();
        drop(tx);

        let chunks = collect(bridge(rx, "q".to_string())).await;
        assert_eq!(chunks.len(), 1);
        let value: serde_json::Value = serde_json::from_slice(&chunks[0]).unwrap();
        assert_eq!(value["error"], NO_EVENTS_MESSAGE);
    }

    #[tokio::test]
    async fn test_noise_only_run_yields_single_diagnostic() {
        let (tx, rx) = channel();
        tx.send(Ok(AgentEvent::text("agent", "   ")))
            .await
            .unwrap();
        tx.send(Ok(AgentEvent::tool_call(
            "agent",
            "get_customer_details",
            serde_json::json!({"customer_id": "CUST-007"}),
        )))
        .await
        .unwrap();
        drop(tx);

        let chunks = collect(bridge(rx, "q".to_string())).await;
        assert_eq!(chunks.len(), 1);
        let value: serde_json::Value = serde_json::from_slice(&chunks[0]).unwrap();
        assert_eq!(value["error"], NO_EVENTS_MESSAGE);
    }

    #[tokio::test]
    async fn test_producer_error_after_fragment() {
        let (tx, rx) = channel();
        tx.send(Ok(AgentEvent::text("agent", "partial answer")))
            .await
            .unwrap();
        tx.send(Err(anyhow!("model unavailable"))).await.unwrap();
        drop(tx);

        let chunks = collect(bridge(rx, "q".to_string())).await;
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "partial answer");
        let value: serde_json::Value = serde_json::from_slice(&chunks[1]).unwrap();
        assert_eq!(value["error"], "Agent error: model unavailable");
    }

    #[tokio::test]
    async fn test_producer_error_without_fragment_reports_only_the_error() {
        let (tx, rx) = channel();
        tx.send(Err(anyhow!("boom"))).await.unwrap();
        drop(tx);

        let chunks = collect(bridge(rx, "q".to_string())).await;
        assert_eq!(chunks.len(), 1);
        let value: serde_json::Value = serde_json::from_slice(&chunks[0]).unwrap();
        assert_eq!(value["error"], "Agent error: boom");
    }

    #[tokio::test]
    async fn test_dropping_the_bridge_closes_the_channel() {
        let (tx, rx) = channel();
        let stream = bridge(rx, "q".to_string());
        drop(stream);
        assert!(tx.send(Ok(AgentEvent::text("agent", "late"))).await.is_err());
    }
}
