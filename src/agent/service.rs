//! Producer contract and the production investigation service.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::customers::CustomerStore;
use crate::regulations::RegulationStore;

use super::bridge::EventRx;
use super::orchestrator;

/// Capacity of the per-run event channel. A slow client applies
/// backpressure to the producer instead of buffering the whole run.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// A source of investigation runs.
///
/// One call starts one run. The returned receiver is the run's only
/// consumer handle; dropping it closes the channel and the producer task
/// stops at its next send.
pub trait Investigator: Send + Sync {
    fn investigate(&self, query: String) -> EventRx;
}

/// Production investigator backed by the customer and regulations stores.
pub struct AgentService {
    customers: Arc<CustomerStore>,
    regulations: Arc<RegulationStore>,
}

impl AgentService {
    pub fn new(customers: Arc<CustomerStore>, regulations: Arc<RegulationStore>) -> Self {
        Self {
            customers,
            regulations,
        }
    }
}

impl Investigator for AgentService {
    fn investigate(&self, query: String) -> EventRx {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let customers = Arc::clone(&self.customers);
        let regulations = Arc::clone(&self.regulations);
        tokio::spawn(async move {
            orchestrator::run(query, customers, regulations, tx).await;
            debug!("investigation producer task finished");
        });
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::normalizer;
    use std::time::Duration;

    fn service() -> AgentService {
        AgentService::new(
            Arc::new(CustomerStore::with_mock_data()),
            Arc::new(RegulationStore::empty(Duration::from_secs(1))),
        )
    }

    #[tokio::test]
    async fn test_run_ends_with_report_text_event() {
        let mut rx = service().investigate("Investigate CUST-007 for structuring".to_string());

        let mut fragments = Vec::new();
        let mut events = 0;
        while let Some(item) = rx.recv().await {
            let event = item.unwrap();
            events += 1;
            if let Some(fragment) = normalizer::normalize(&event) {
                fragments.push(fragment);
            }
        }

        assert!(events >= 3, "expected tool events plus a report, got {events}");
        assert_eq!(fragments.len(), 1, "exactly one client-visible fragment");
        assert!(fragments[0].contains("Investigation Report"));
        assert!(fragments[0].contains("John Doe"));
    }

    #[tokio::test]
    async fn test_dropped_receiver_stops_producer() {
        let rx = service().investigate("Investigate CUST-007".to_string());
        drop(rx);
        // The spawned task exits at its next send; give it a tick.
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
