//! # lm-01-checkpoints
//!
//! Append-only history of `(timestamp, value)` pairs answering
//! "value as of time T" queries.
//!
//! ## Overview
//!
//! - **Monotonic**: appends must not go back in time.
//! - **Idempotent per step**: a second append at an already recorded
//!   timestamp overwrites that slot instead of growing the sequence.
//! - **Point-in-time reads**: exact hits resolve through a direct
//!   `timestamp -> slot` index, everything else through a binary search for
//!   the floor entry.
//!
//! ```text
//! t:      10     20           45
//! value:  [a]    [b]          [c]
//!         get(5) = 0   get(20) = b   get(30) = b   get(99) = c
//! ```
//!
//! ## Example
//!
//! ```rust
//! use lm_01_checkpoints::Checkpoints;
//!
//! let mut history: Checkpoints<i128> = Checkpoints::new();
//! history.append(100, 10).unwrap();
//! history.append(250, 20).unwrap();
//!
//! assert_eq!(history.get(5), 0);
//! assert_eq!(history.get(15), 100);
//! assert_eq!(history.latest(), 250);
//! ```

pub mod checkpoints;
pub mod error;

pub use checkpoints::Checkpoints;
pub use error::{CheckpointError, CheckpointResult};
