//! Normalization of producer events into client-visible text fragments.
//!
//! Only the first part with non-empty text survives, stripped down to word
//! characters and whitespace. Everything else an event carried is still
//! recorded in the run trace so a failed or silent run stays diagnosable.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use super::events::AgentEvent;

/// Characters that are neither word characters nor whitespace.
static NON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("Invalid regex pattern for fragment cleaning"));

/// Reduce one event to at most one cleaned text fragment.
///
/// Selection: the first part whose text is non-empty after trimming.
/// Cleaning: newlines, carriage returns, and tabs each become one space,
/// then every character outside `\w` and `\s` is dropped. An event with no
/// text parts, or whose fragment cleans down to nothing, yields `None`.
pub fn normalize(event: &AgentEvent) -> Option<String> {
    let passage = event
        .parts
        .iter()
        .filter_map(|part| part.text())
        .map(|text| {
            text.replace('\n', " ")
                .replace('\r', " ")
                .replace('\t', " ")
        })
        .find(|text| !text.trim().is_empty())?;

    let cleaned = NON_WORD.replace_all(&passage, "").into_owned();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// One trace record per event, kept independently of filtering.
#[derive(Debug, Clone, Serialize)]
pub struct TraceRecord {
    pub index: usize,
    pub author: String,
    pub part_kinds: Vec<&'static str>,
    pub text_parts: Vec<String>,
}

/// Side-channel bookkeeping for one investigation run.
///
/// Never surfaces to the client; flushed to the debug log when the bridge
/// reaches a terminal state.
#[derive(Debug, Default)]
pub struct EventTrace {
    records: Vec<TraceRecord>,
}

impl EventTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: &AgentEvent) {
        self.records.push(TraceRecord {
            index: self.records.len(),
            author: event.author.clone(),
            part_kinds: event.parts.iter().map(|p| p.kind()).collect(),
            text_parts: event
                .parts
                .iter()
                .filter_map(|p| p.text())
                .map(str::to_owned)
                .collect(),
        });
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Emit the accumulated trace at debug level and consume it.
    pub fn flush(self, outcome: &str) {
        let dump = serde_json::to_string(&self.records).unwrap_or_else(|_| "[]".to_string());
        debug!(events = self.records.len(), outcome, trace = %dump, "investigation run trace");
    }
}
