//! # Version History
//!
//! Maps wall-clock timestamps to chronicle versions. A version bump isolates
//! all state written after its activation from the state written before it,
//! which is how a ledger recovers from a chain reorganization.

use serde::{Deserialize, Serialize};
use shared_types::{Timestamp, Version};

use crate::error::{LedgerError, LedgerResult};

/// First version, active from timestamp zero.
pub const INITIAL_VERSION: Version = 1;

/// Strictly increasing `(activation timestamp, version)` pairs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionHistory {
    activations: Vec<(Timestamp, Version)>,
}

impl Default for VersionHistory {
    fn default() -> Self {
        Self {
            activations: vec![(0, INITIAL_VERSION)],
        }
    }
}

impl VersionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule the next version to activate at `timestamp`.
    ///
    /// Activation must be after the previous one and not before `now`.
    pub fn add_version(&mut self, timestamp: Timestamp, now: Timestamp) -> LedgerResult<Version> {
        let (after, last) = self.latest();
        if timestamp <= after || timestamp < now {
            return Err(LedgerError::InvalidVersionTimestamp {
                timestamp,
                after,
                now,
            });
        }
        let version = last + 1;
        self.activations.push((timestamp, version));
        Ok(version)
    }

    /// Version active at `timestamp`.
    pub fn version_at(&self, timestamp: Timestamp) -> Version {
        let pos = self.activations.partition_point(|(t, _)| *t <= timestamp);
        // activations[0] is at timestamp zero, so pos >= 1
        self.activations[pos.saturating_sub(1)].1
    }

    /// Activation timestamp of `version`.
    pub fn activation_of(&self, version: Version) -> Option<Timestamp> {
        self.activations
            .iter()
            .find(|(_, v)| *v == version)
            .map(|(t, _)| *t)
    }

    /// Most recently scheduled `(activation, version)`.
    pub fn latest(&self) -> (Timestamp, Version) {
        self.activations
            .last()
            .copied()
            .unwrap_or((0, INITIAL_VERSION))
    }
}
