//! Mock customer data store.
//!
//! Stands in for the bank's customer system. Seeded with a small book of
//! business; lookups are exact-match on customer id.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

/// Error text returned through the tool surface for unknown ids.
pub const CUSTOMER_NOT_FOUND: &str = "Customer not found.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub name: String,
    pub risk_score: String,
    pub account_open_date: String,
    pub recent_activity: String,
    pub occupation: String,
}

#[derive(Debug, Default)]
pub struct CustomerStore {
    records: HashMap<String, CustomerRecord>,
}

impl CustomerStore {
    /// Store seeded with the demo records.
    pub fn with_mock_data() -> Self {
        let mut records = HashMap::new();
        records.insert(
            "CUST-007".to_string(),
            CustomerRecord {
                name: "John Doe".to_string(),
                risk_score: "High".to_string(),
                account_open_date: "2022-01-15".to_string(),
                recent_activity: "Multiple cash deposits of $9,500 in the last 7 days."
                    .to_string(),
                occupation: "Owner, Cash-Intensive Business".to_string(),
            },
        );
        records.insert(
            "CUST-101".to_string(),
            CustomerRecord {
                name: "Jane Smith".to_string(),
                risk_score: "Low".to_string(),
                account_open_date: "2018-05-20".to_string(),
                recent_activity: "Regular payroll deposits, occasional bill payments."
                    .to_string(),
                occupation: "Software Engineer".to_string(),
            },
        );
        Self { records }
    }

    pub fn lookup(&self, customer_id: &str) -> Option<CustomerRecord> {
        debug!(customer_id, "customer lookup");
        self.records.get(customer_id).cloned()
    }

    /// Tool-shaped lookup: the record as JSON, or the not-found error
    /// object. Always produces a value.
    pub fn lookup_output(&self, customer_id: &str) -> Value {
        match self.records.get(customer_id) {
            Some(record) => serde_json::to_value(record)
                .unwrap_or_else(|_| json!({"error": "Customer record unavailable."})),
            None => json!({"error": CUSTOMER_NOT_FOUND}),
        }
    }
}
