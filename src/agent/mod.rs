//! Investigation agent module.
//!
//! The producer side of the streaming pipeline: event model, normalization,
//! the bridge onto HTTP body chunks, and the orchestrator that runs one
//! investigation per request.

mod bridge;
mod events;
mod normalizer;
mod orchestrator;
mod service;

pub use bridge::{EventResult, EventRx, NO_EVENTS_MESSAGE, bridge};
pub use events::{AgentEvent, EventPart};
pub use normalizer::{EventTrace, normalize};
pub use service::{AgentService, Investigator};
