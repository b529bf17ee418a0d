//! Application state shared across handlers.

use std::sync::Arc;

use crate::agent::Investigator;
use crate::customers::CustomerStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Producer behind the streaming investigation endpoint.
    pub investigator: Arc<dyn Investigator>,
    /// Customer record store backing the tool endpoint.
    pub customers: Arc<CustomerStore>,
}

impl AppState {
    /// Create new application state.
    pub fn new(investigator: impl Investigator + 'static, customers: Arc<CustomerStore>) -> Self {
        Self {
            investigator: Arc::new(investigator),
            customers,
        }
    }
}
