//! Time Source Adapters
//!
//! Implements the `TimeSource` port.

use parking_lot::RwLock;
use shared_types::Timestamp;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ports::outbound::TimeSource;

/// Wall clock in unix seconds.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Manually driven clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    current: RwLock<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: RwLock::new(start),
        }
    }

    /// Set current time for testing.
    pub fn set(&self, timestamp: Timestamp) {
        *self.current.write() = timestamp;
    }

    /// Advance time for testing.
    pub fn advance(&self, steps: Timestamp) {
        *self.current.write() += steps;
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.read()
    }
}
