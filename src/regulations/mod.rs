//! AML regulations retrieval with a deterministic fallback.
//!
//! Retrieval is keyword overlap over a passage corpus loaded from disk.
//! Every lookup is total: a missing corpus, a timeout, or an empty result
//! set all fall back to the canned mock regulations, so callers never have
//! to handle a retrieval failure.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::task;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// How many passages a successful lookup returns.
const TOP_PASSAGES: usize = 3;

/// Query tokens shorter than this are ignored when scoring.
const MIN_TOKEN_LEN: usize = 3;

/// Store over a passage corpus; cheap to share behind an `Arc`.
#[derive(Debug)]
pub struct RegulationStore {
    passages: Arc<Vec<String>>,
    lookup_timeout: Duration,
}

impl RegulationStore {
    /// Load passages from every `.txt` and `.md` file under `corpus_dir`,
    /// split on blank lines. A missing or unreadable corpus produces an
    /// empty store (every lookup then takes the mock fallback) rather than
    /// an error.
    pub fn load(corpus_dir: Option<&Path>, lookup_timeout: Duration) -> Self {
        let mut passages = Vec::new();

        if let Some(dir) = corpus_dir {
            match fs::read_dir(dir) {
                Ok(entries) => {
                    for entry in entries.flatten() {
                        let path = entry.path();
                        let is_text = path
                            .extension()
                            .and_then(|ext| ext.to_str())
                            .is_some_and(|ext| ext == "txt" || ext == "md");
                        if !is_text {
                            continue;
                        }
                        match fs::read_to_string(&path) {
                            Ok(text) => {
                                passages.extend(split_passages(&text));
                            }
                            Err(err) => {
                                warn!("skipping unreadable corpus file {}: {err}", path.display());
                            }
                        }
                    }
                    info!(
                        passages = passages.len(),
                        "loaded regulations corpus from {}",
                        dir.display()
                    );
                }
                Err(err) => {
                    warn!(
                        "regulations corpus {} unavailable ({err}), lookups will use the mock fallback",
                        dir.display()
                    );
                }
            }
        } else {
            debug!("no regulations corpus configured, lookups will use the mock fallback");
        }

        Self {
            passages: Arc::new(passages),
            lookup_timeout,
        }
    }

    /// Store with no corpus; every lookup returns the mock fallback.
    pub fn empty(lookup_timeout: Duration) -> Self {
        Self {
            passages: Arc::new(Vec::new()),
            lookup_timeout,
        }
    }

    /// Top passages for `query`, or the mock regulations text. Never fails.
    pub async fn lookup(&self, query: &str) -> String {
        info!(query = %query, "regulations lookup");

        if self.passages.is_empty() {
            debug!("no passages loaded, returning mock regulations");
            return mock_result(query);
        }

        let passages = Arc::clone(&self.passages);
        let owned_query = query.to_string();
        let scored = timeout(
            self.lookup_timeout,
            task::spawn_blocking(move || best_passages(&passages, &owned_query)),
        )
        .await;

        match scored {
            Ok(Ok(found)) if !found.is_empty() => {
                debug!(passages = found.len(), "regulations retrieved");
                format!(
                    "Retrieved the following context based on the query '{query}':\n{}",
                    found.join("\n\n---\n\n")
                )
            }
            Ok(Ok(_)) => {
                debug!("no passage matched, returning mock regulations");
                mock_result(query)
            }
            Ok(Err(err)) => {
                warn!("regulations scoring task failed ({err}), returning mock regulations");
                mock_result(query)
            }
            Err(_) => {
                warn!("regulations lookup timed out, returning mock regulations");
                mock_result(query)
            }
        }
    }
}

fn mock_result(query: &str) -> String {
    format!(
        "[MOCK AML REGULATIONS]\n\
         - Regulation 1: All cash transactions above $10,000 must be reported.\n\
         - Regulation 2: Transactions involving structuring or layering are considered suspicious.\n\
         - Regulation 3: Unusual transaction patterns must be escalated to compliance.\n\
         \n\
         [This is a mock result. Real regulations would be retrieved from the AML database based on query: '{query}']"
    )
}

fn split_passages(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|passage| !passage.is_empty())
        .map(str::to_owned)
        .collect()
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() >= MIN_TOKEN_LEN)
        .map(str::to_owned)
        .collect()
}

/// Score passages by distinct query-token overlap; top matches, best first.
fn best_passages(passages: &[String], query: &str) -> Vec<String> {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(usize, &String)> = passages
        .iter()
        .filter_map(|passage| {
            let lowered = passage.to_lowercase();
            let score = query_tokens
                .iter()
                .filter(|token| lowered.contains(token.as_str()))
                .count();
            (score > 0).then_some((score, passage))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .take(TOP_PASSAGES)
        .map(|(_, passage)| passage.clone())
        .collect()
}
