//! Port for structured conversation logging.
//!
//! Defines the [`ConversationLogger`] trait for recording what an agent saw
//! and produced (raw and normalized message lists, context checks, model
//! responses, roster composition) to a structured file sink.
//!
//! This is separate from the [`OperatorLog`](super::operator_log::OperatorLog)
//! port: the operator log carries warnings meant for a human running the
//! benchmark, while this port captures the transcript in a machine-readable
//! format (JSONL).

use serde_json::Value;

/// A structured conversation event for logging.
///
/// Each event has a type string and a JSON payload containing
/// event-specific fields. The sink adds the timestamp.
#[derive(Debug, Clone)]
pub struct ConversationEvent {
    /// Event type identifier (e.g., "raw_messages", "llm_response").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging conversation events to a structured log.
///
/// The `log` method is synchronous and non-fallible: a failing transcript
/// sink must not abort a turn.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
