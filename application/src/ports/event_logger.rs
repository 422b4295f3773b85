//! Structured cycle event port
//!
//! Machine-readable events (`cycle_started`, `phase_completed`,
//! `vote_completed`, `peer_review`, `report_generated`) go through
//! [`EventLogger`]. Diagnostics keep using `tracing`.

use serde_json::Value;

/// One structured event
#[derive(Debug, Clone)]
pub struct CycleEvent {
    pub event_type: &'static str,
    pub payload: Value,
}

impl CycleEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Sink for cycle events
///
/// Logging never fails from the caller's point of view.
pub trait EventLogger: Send + Sync {
    fn log(&self, event: CycleEvent);
}

/// Discards every event
pub struct NoEventLogger;

impl EventLogger for NoEventLogger {
    fn log(&self, _event: CycleEvent) {}
}
