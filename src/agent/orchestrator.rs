//! Deterministic investigation orchestration.
//!
//! Drives one run: pull a customer id out of the query, call the lookup
//! tools, then emit a single report event. Tool traffic goes out as
//! structured events so the run trace captures it; only the report carries
//! client-visible text.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::customers::{CustomerRecord, CustomerStore};
use crate::regulations::RegulationStore;

use super::bridge::EventResult;
use super::events::AgentEvent;

/// Author tag on every event this orchestrator emits.
const AUTHOR: &str = "investigation_orchestrator";

/// Customer ids look like `CUST-007`.
static CUSTOMER_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bCUST-\d+\b").expect("Invalid regex pattern for customer ids"));

/// Run one investigation to completion, or stop early once the consumer
/// hangs up.
pub(crate) async fn run(
    query: String,
    customers: Arc<CustomerStore>,
    regulations: Arc<RegulationStore>,
    tx: mpsc::Sender<EventResult>,
) {
    info!(query = %query, "investigation run started");

    let customer_id = CUSTOMER_ID.find(&query).map(|m| m.as_str().to_string());
    let mut customer: Option<CustomerRecord> = None;

    if let Some(ref id) = customer_id {
        let call = AgentEvent::tool_call(AUTHOR, "get_customer_details", json!({"customer_id": id}));
        if tx.send(Ok(call)).await.is_err() {
            return;
        }

        customer = customers.lookup(id);
        let output = customers.lookup_output(id);
        let result = AgentEvent::tool_result(AUTHOR, "get_customer_details", output);
        if tx.send(Ok(result)).await.is_err() {
            return;
        }
    } else {
        debug!("no customer id in query, skipping customer lookup");
    }

    let call = AgentEvent::tool_call(AUTHOR, "lookup_aml_regulations", json!({"query": query}));
    if tx.send(Ok(call)).await.is_err() {
        return;
    }

    let regulatory_context = regulations.lookup(&query).await;
    let result = AgentEvent::tool_result(
        AUTHOR,
        "lookup_aml_regulations",
        json!({"context": regulatory_context}),
    );
    if tx.send(Ok(result)).await.is_err() {
        return;
    }

    let report = build_report(&query, customer_id.as_deref(), customer.as_ref(), &regulatory_context);
    let _ = tx.send(Ok(AgentEvent::text(AUTHOR, report))).await;
    info!(query = %query, "investigation run completed");
}

fn build_report(
    query: &str,
    customer_id: Option<&str>,
    customer: Option<&CustomerRecord>,
    regulatory_context: &str,
) -> String {
    let mut report = String::new();
    report.push_str("=== Investigation Report ===\n\n");
    report.push_str(&format!("## Query\n{query}\n\n"));

    report.push_str("## Customer Information\n");
    match (customer_id, customer) {
        (Some(id), Some(record)) => {
            report.push_str(&format!("- Customer ID: {id}\n"));
            report.push_str(&format!("- Name: {}\n", record.name));
            report.push_str(&format!("- Risk score: {}\n", record.risk_score));
            report.push_str(&format!("- Account opened: {}\n", record.account_open_date));
            report.push_str(&format!("- Recent activity: {}\n", record.recent_activity));
            report.push_str(&format!("- Occupation: {}\n", record.occupation));
        }
        (Some(id), None) => {
            report.push_str(&format!("- Customer ID: {id}\n- Customer not found.\n"));
        }
        (None, _) => {
            report.push_str("- No customer identifier found in the query.\n");
        }
    }
    report.push('\n');

    report.push_str("## AML Regulatory Context\n");
    report.push_str(regulatory_context);
    report.push_str("\n\n");

    report.push_str("Next step: Escalate to AML team for review.");
    report
}
