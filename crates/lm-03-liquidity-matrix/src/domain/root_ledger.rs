//! # Root Timestamp Ledger
//!
//! Roots received from one remote chain, in strictly increasing timestamp
//! order. Delivery is at-least-once and unordered, so anything not newer
//! than the last stored entry is dropped rather than reordered.

use serde::{Deserialize, Serialize};
use shared_types::Timestamp;
use std::collections::HashMap;

use crate::domain::value_objects::{RootsOutcome, SyncedRoots};

/// Synced roots for a single chain.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SyncedRootLedger {
    entries: Vec<SyncedRoots>,
    index: HashMap<Timestamp, usize>,
}

impl SyncedRootLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `timestamp` would be stored.
    pub fn classify(&self, timestamp: Timestamp) -> RootsOutcome {
        match self.entries.last() {
            Some(last) if timestamp <= last.timestamp => RootsOutcome::Stale {
                last: last.timestamp,
            },
            _ => RootsOutcome::Stored,
        }
    }

    /// Store `roots` unless stale.
    pub fn record(&mut self, roots: SyncedRoots) -> RootsOutcome {
        let outcome = self.classify(roots.timestamp);
        if outcome == RootsOutcome::Stored {
            self.index.insert(roots.timestamp, self.entries.len());
            self.entries.push(roots);
        }
        outcome
    }

    pub fn last(&self) -> Option<SyncedRoots> {
        self.entries.last().copied()
    }

    /// Roots received for exactly `timestamp`.
    pub fn at(&self, timestamp: Timestamp) -> Option<SyncedRoots> {
        self.index.get(&timestamp).map(|&i| self.entries[i])
    }

    /// Latest roots with `timestamp <= at`.
    pub fn floor(&self, at: Timestamp) -> Option<SyncedRoots> {
        let pos = self.entries.partition_point(|r| r.timestamp <= at);
        pos.checked_sub(1).map(|i| self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
