//! # LiquidityMatrix Test Suite
//!
//! Cross-crate tests that need more than one ledger.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/integration/   # multi-chain relay, settlement and reorg flows
//! └── benches/           # criterion benchmarks
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p lm-tests
//! cargo test -p lm-tests integration::
//!
//! # Benchmarks
//! cargo bench -p lm-tests
//! ```

#![allow(dead_code)]

pub mod integration;
