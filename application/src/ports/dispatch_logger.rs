//! Port for structured dispatch logging.
//!
//! Separate from `tracing`: tracing carries human-readable diagnostics,
//! this port records every call and envelope in a machine-readable form
//! (JSONL in the infrastructure adapter).

use serde_json::Value;

/// A structured dispatch event.
pub struct DispatchEvent {
    /// Event type identifier ("tool_call", "tool_result").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl DispatchEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Records dispatch events.
///
/// `log` is synchronous and infallible; write failures are dropped so
/// logging never changes a dispatch result.
pub trait DispatchLogger: Send + Sync {
    fn log(&self, event: DispatchEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoDispatchLogger;

impl DispatchLogger for NoDispatchLogger {
    fn log(&self, _event: DispatchEvent) {}
}
