//! Event model for the investigation producer.
//!
//! A run emits a sequence of events, each carrying zero or more parts.
//! Parts are resolved into "text a client may see" vs. "structured tool
//! traffic" exactly once, here, so the rest of the pipeline never probes
//! producer-internal shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One content part within a producer event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPart {
    /// Plain text authored by the agent.
    Text { text: String },
    /// A tool invocation requested during the run.
    ToolCall { name: String, args: Value },
    /// The result a tool returned.
    ToolResult { name: String, output: Value },
}

impl EventPart {
    /// Text payload of this part, if it carries one.
    pub fn text(&self) -> Option<&str> {
        match self {
            EventPart::Text { text } => Some(text),
            EventPart::ToolCall { .. } | EventPart::ToolResult { .. } => None,
        }
    }

    /// Short label used in trace records.
    pub fn kind(&self) -> &'static str {
        match self {
            EventPart::Text { .. } => "text",
            EventPart::ToolCall { .. } => "tool_call",
            EventPart::ToolResult { .. } => "tool_result",
        }
    }
}

/// One unit emitted by the investigation producer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEvent {
    /// Which stage of the run produced this event.
    pub author: String,
    /// Zero or more parts; at most one becomes client-visible text.
    #[serde(default)]
    pub parts: Vec<EventPart>,
}

impl AgentEvent {
    pub fn text(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            parts: vec![EventPart::Text { text: text.into() }],
        }
    }

    pub fn tool_call(author: impl Into<String>, name: impl Into<String>, args: Value) -> Self {
        Self {
            author: author.into(),
            parts: vec![EventPart::ToolCall {
                name: name.into(),
                args,
            }],
        }
    }

    pub fn tool_result(author: impl Into<String>, name: impl Into<String>, output: Value) -> Self {
        Self {
            author: author.into(),
            parts: vec![EventPart::ToolResult {
                name: name.into(),
                output,
            }],
        }
    }
}
