//! # Checkpoint Sequence
//!
//! Ordered history of timestamped values for a single owner key
//! (an account balance, a total, or a data hash).
//!
//! ## Invariants
//!
//! - Recorded timestamps are strictly increasing.
//! - `index[t]` points at the slot holding timestamp `t`.
//! - Appends older than the last accepted write fail with `StaleTimestamp`,
//!   including writes skipped because the value did not change.

use serde::{Deserialize, Serialize};
use shared_types::Timestamp;
use std::collections::HashMap;

use crate::error::{CheckpointError, CheckpointResult};

/// Timestamped value history with floor lookups.
///
/// `V::default()` is the zero sentinel returned for times before the first
/// entry and for an empty history.
///
/// Deserialization goes through [`CheckpointsSnapshot`]: the ordering
/// invariants are checked and the exact index is rebuilt.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(try_from = "CheckpointsSnapshot<V>")]
pub struct Checkpoints<V> {
    /// Recorded timestamps, strictly increasing.
    timestamps: Vec<Timestamp>,
    /// Values, parallel to `timestamps`.
    values: Vec<V>,
    /// Direct `timestamp -> slot` index for exact hits and overwrites.
    #[serde(skip_serializing)]
    index: HashMap<Timestamp, usize>,
    /// Most recent accepted append, recorded or skipped.
    last_write: Option<Timestamp>,
}

/// Persisted form of [`Checkpoints`].
#[derive(Deserialize)]
pub struct CheckpointsSnapshot<V> {
    timestamps: Vec<Timestamp>,
    values: Vec<V>,
    last_write: Option<Timestamp>,
}

impl<V> TryFrom<CheckpointsSnapshot<V>> for Checkpoints<V> {
    type Error = CheckpointError;

    fn try_from(snapshot: CheckpointsSnapshot<V>) -> CheckpointResult<Self> {
        let CheckpointsSnapshot {
            timestamps,
            values,
            last_write,
        } = snapshot;
        let corrupt = |reason: String| Err(CheckpointError::CorruptSnapshot { reason });

        if timestamps.len() != values.len() {
            return corrupt(format!(
                "{} timestamps but {} values",
                timestamps.len(),
                values.len()
            ));
        }
        if let Some(pair) = timestamps.windows(2).find(|pair| pair[0] >= pair[1]) {
            return corrupt(format!("timestamp {} follows {}", pair[1], pair[0]));
        }
        match (timestamps.last(), last_write) {
            (Some(_), None) => return corrupt("entries without a last write".into()),
            (Some(&last), Some(write)) if write < last => {
                return corrupt(format!("last write {write} precedes entry {last}"));
            }
            _ => {}
        }

        let index = timestamps
            .iter()
            .enumerate()
            .map(|(slot, t)| (*t, slot))
            .collect();
        Ok(Self {
            timestamps,
            values,
            index,
            last_write,
        })
    }
}

impl<V> Checkpoints<V>
where
    V: Copy + Default + PartialEq,
{
    /// Create an empty history.
    pub fn new() -> Self {
        Self {
            timestamps: Vec::new(),
            values: Vec::new(),
            index: HashMap::new(),
            last_write: None,
        }
    }

    /// Record `value` as of `timestamp`.
    ///
    /// A write at the timestamp of the last recorded entry overwrites it in
    /// place. A write that would not change the current value is accepted
    /// without growing the sequence.
    pub fn append(&mut self, value: V, timestamp: Timestamp) -> CheckpointResult<()> {
        if let Some(last) = self.last_write {
            if timestamp < last {
                return Err(CheckpointError::StaleTimestamp {
                    last,
                    attempted: timestamp,
                });
            }
        }
        self.last_write = Some(timestamp);

        if let Some(&slot) = self.index.get(&timestamp) {
            self.values[slot] = value;
            return Ok(());
        }

        if self.latest() == value {
            return Ok(());
        }

        self.index.insert(timestamp, self.timestamps.len());
        self.timestamps.push(timestamp);
        self.values.push(value);
        Ok(())
    }

    /// Value of the latest entry with `timestamp <= at`, or the zero sentinel.
    pub fn get(&self, at: Timestamp) -> V {
        if let Some(&slot) = self.index.get(&at) {
            return self.values[slot];
        }
        self.floor(at).map(|(_, value)| value).unwrap_or_default()
    }

    /// Latest entry with `timestamp <= at`.
    pub fn floor(&self, at: Timestamp) -> Option<(Timestamp, V)> {
        let pos = self.timestamps.partition_point(|t| *t <= at);
        if pos == 0 {
            return None;
        }
        Some((self.timestamps[pos - 1], self.values[pos - 1]))
    }

    /// Most recent value, or the zero sentinel.
    pub fn latest(&self) -> V {
        self.values.last().copied().unwrap_or_default()
    }

    /// Timestamp of the most recent recorded entry.
    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.timestamps.last().copied()
    }

    /// Timestamp of the most recent accepted append.
    pub fn last_write(&self) -> Option<Timestamp> {
        self.last_write
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Recorded entries in timestamp order.
    pub fn iter(&self) -> impl Iterator<Item = (Timestamp, V)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Hash, ZERO_HASH};

    // ========== Test Group 1: Reads ==========

    #[test]
    fn test_empty_returns_zero_sentinel() {
        let history: Checkpoints<i128> = Checkpoints::new();
        assert_eq!(history.get(0), 0);
        assert_eq!(history.get(u64::MAX), 0);
        assert_eq!(history.latest(), 0);
        assert!(history.last_timestamp().is_none());
        assert!(history.is_empty());
    }

    #[test]
    fn test_query_before_first_entry_is_zero() {
        let mut history = Checkpoints::new();
        history.append(7i128, 100).unwrap();
        assert_eq!(history.get(99), 0);
        assert_eq!(history.get(100), 7);
    }

    #[test]
    fn test_floor_between_entries() {
        let mut history = Checkpoints::new();
        history.append(1i128, 10).unwrap();
        history.append(2i128, 20).unwrap();
        history.append(3i128, 40).unwrap();

        assert_eq!(history.get(19), 1);
        assert_eq!(history.get(20), 2);
        assert_eq!(history.get(39), 2);
        assert_eq!(history.get(1_000), 3);
        assert_eq!(history.floor(25), Some((20, 2)));
    }

    #[test]
    fn test_hash_values_use_zero_hash_sentinel() {
        let mut history: Checkpoints<Hash> = Checkpoints::new();
        assert_eq!(history.get(5), ZERO_HASH);
        history.append([9u8; 32], 5).unwrap();
        assert_eq!(history.get(5), [9u8; 32]);
    }

    // ========== Test Group 2: Writes ==========

    #[test]
    fn test_stale_append_rejected() {
        let mut history = Checkpoints::new();
        history.append(1i128, 50).unwrap();
        let err = history.append(2i128, 49).unwrap_err();
        assert_eq!(
            err,
            CheckpointError::StaleTimestamp {
                last: 50,
                attempted: 49
            }
        );
        assert_eq!(history.latest(), 1);
    }

    #[test]
    fn test_same_timestamp_overwrites_in_place() {
        let mut history = Checkpoints::new();
        history.append(1i128, 10).unwrap();
        history.append(5i128, 10).unwrap();
        history.append(6i128, 10).unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(history.get(10), 6);
    }

    #[test]
    fn test_unchanged_value_does_not_grow() {
        let mut history = Checkpoints::new();
        history.append(4i128, 10).unwrap();
        history.append(4i128, 20).unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(history.get(25), 4);
        assert_eq!(history.last_write(), Some(20));
    }

    #[test]
    fn test_skipped_write_still_advances_clock() {
        let mut history = Checkpoints::new();
        history.append(4i128, 10).unwrap();
        history.append(4i128, 20).unwrap();
        assert!(history.append(5i128, 15).is_err());
    }

    #[test]
    fn test_overwrite_back_to_previous_value() {
        let mut history = Checkpoints::new();
        history.append(1i128, 10).unwrap();
        history.append(2i128, 20).unwrap();
        history.append(1i128, 20).unwrap();

        assert_eq!(history.get(20), 1);
        assert_eq!(history.get(10), 1);
    }

    #[test]
    fn test_serde_preserves_history() {
        let mut history = Checkpoints::new();
        history.append(-3i128, 1).unwrap();
        history.append(8i128, 4).unwrap();

        let json = serde_json::to_string(&history).unwrap();
        let restored: Checkpoints<i128> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.get(2), -3);
        assert_eq!(restored.get(4), 8);
        assert!(restored.clone().append(0, 3).is_err());
    }

    #[test]
    fn test_serde_rebuilds_exact_index() {
        let mut history = Checkpoints::new();
        history.append(5i128, 10).unwrap();
        history.append(6i128, 20).unwrap();

        let json = serde_json::to_string(&history).unwrap();
        assert!(!json.contains("index"));
        let mut restored: Checkpoints<i128> = serde_json::from_str(&json).unwrap();
        restored.append(9, 20).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.get(20), 9);
    }

    #[test]
    fn test_serde_rejects_broken_snapshots() {
        let cases = [
            r#"{"timestamps":[1,2],"values":[7],"last_write":2}"#,
            r#"{"timestamps":[5,5],"values":[1,2],"last_write":5}"#,
            r#"{"timestamps":[9,3],"values":[1,2],"last_write":9}"#,
            r#"{"timestamps":[4],"values":[1],"last_write":null}"#,
            r#"{"timestamps":[4],"values":[1],"last_write":2}"#,
        ];
        for json in cases {
            let err = serde_json::from_str::<Checkpoints<i128>>(json).unwrap_err();
            assert!(
                err.to_string().contains("Corrupt checkpoint snapshot"),
                "{json}: {err}"
            );
        }
    }
}
