//! # Shared Types Crate
//!
//! Primitive aliases and encodings used by every LiquidityMatrix crate.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: chain, app, account and time identifiers are
//!   defined once here.
//! - **Word Encoding**: every value committed into a Merkle leaf is a 32-byte
//!   big-endian word, so roots computed here match roots computed by any other
//!   runtime that uses the same word layout.

pub mod entities;
pub mod errors;
pub mod hashing;

pub use entities::*;
pub use errors::*;
pub use hashing::*;
