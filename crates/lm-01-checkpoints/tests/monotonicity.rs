//! Property tests for point-in-time reads.

use lm_01_checkpoints::{CheckpointError, Checkpoints};
use proptest::prelude::*;

/// Reference answer: latest write with `t <= at`, later writes at the same
/// timestamp winning.
fn naive_get(writes: &[(u64, i128)], at: u64) -> i128 {
    writes
        .iter()
        .filter(|(t, _)| *t <= at)
        .last()
        .map(|(_, v)| *v)
        .unwrap_or(0)
}

fn sorted_writes() -> impl Strategy<Value = Vec<(u64, i128)>> {
    prop::collection::vec((0u64..50, -5i128..5), 0..40).prop_map(|mut writes| {
        writes.sort_by_key(|(t, _)| *t);
        writes
    })
}

proptest! {
    #[test]
    fn prop_get_matches_latest_write_at_or_before(
        writes in sorted_writes(),
        queries in prop::collection::vec(0u64..60, 1..20),
    ) {
        let mut history = Checkpoints::new();
        for (t, v) in &writes {
            history.append(*v, *t).unwrap();
        }
        for at in queries {
            prop_assert_eq!(history.get(at), naive_get(&writes, at));
        }
    }

    #[test]
    fn prop_append_before_last_fails(
        writes in sorted_writes().prop_filter("needs a write after zero", |w| {
            w.last().map(|(t, _)| *t > 0).unwrap_or(false)
        }),
        value in any::<i128>(),
    ) {
        let mut history = Checkpoints::new();
        for (t, v) in &writes {
            history.append(*v, *t).unwrap();
        }
        let last = writes.last().map(|(t, _)| *t).unwrap();
        let before = history.clone();

        let err = history.append(value, last - 1).unwrap_err();
        prop_assert_eq!(err, CheckpointError::StaleTimestamp { last, attempted: last - 1 });
        for at in 0..=last {
            prop_assert_eq!(history.get(at), before.get(at));
        }
    }

    #[test]
    fn prop_recorded_timestamps_strictly_increase(writes in sorted_writes()) {
        let mut history = Checkpoints::new();
        for (t, v) in &writes {
            history.append(*v, *t).unwrap();
        }
        let recorded: Vec<u64> = history.iter().map(|(t, _)| t).collect();
        prop_assert!(recorded.windows(2).all(|w| w[0] < w[1]));
    }
}
