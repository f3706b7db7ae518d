//! Event Sink Adapters
//!
//! Implements the `EventSink` port.

use parking_lot::RwLock;
use tracing::info;

use crate::events::LedgerEvent;
use crate::ports::outbound::EventSink;

/// Records every event in memory.
#[derive(Debug, Default)]
pub struct InMemoryEventSink {
    events: RwLock<Vec<LedgerEvent>>,
}

impl InMemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events published so far, oldest first.
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events.read().clone()
    }

    /// Events matching `predicate`.
    pub fn filter(&self, predicate: impl Fn(&LedgerEvent) -> bool) -> Vec<LedgerEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }

    /// Number of events named `name`.
    pub fn count(&self, name: &str) -> usize {
        self.events.read().iter().filter(|e| e.name() == name).count()
    }

    pub fn clear(&self) {
        self.events.write().clear();
    }
}

impl EventSink for InMemoryEventSink {
    fn publish(&self, event: LedgerEvent) {
        self.events.write().push(event);
    }
}

/// Emits every event as a structured log line.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn publish(&self, event: LedgerEvent) {
        match serde_json::to_string(&event) {
            Ok(json) => info!(event = event.name(), payload = %json, "[lm-03] ledger event"),
            Err(_) => info!(event = event.name(), "[lm-03] ledger event"),
        }
    }
}
