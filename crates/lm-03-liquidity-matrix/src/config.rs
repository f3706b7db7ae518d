//! # Configuration Store
//!
//! Matrix-wide settings are loaded once at construction and then mutated only
//! through the admin entry points on the service. Per-app settings are
//! supplied at registration.

use lm_02_merkle::{DEFAULT_TREE_HEIGHT, MAX_TREE_HEIGHT};
use serde::{Deserialize, Serialize};
use shared_types::{Address, ChainUid};
use std::collections::BTreeSet;

use crate::error::{LedgerError, LedgerResult};

/// How the settler-supplied total liquidity is treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalLiquidityPolicy {
    /// Record the asserted total as-is.
    #[default]
    Trusted,
    /// Reject batches whose asserted total differs from the sum of entries.
    CrossCheck,
}

/// Matrix configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    /// Identifier of the chain hosting this ledger
    pub local_chain: ChainUid,
    /// Height of every app and main tree
    pub tree_height: u8,
    /// Chains whose roots may be received and settled
    pub remote_chains: BTreeSet<ChainUid>,
    /// Settlers allowed to settle for every app
    pub settlers: BTreeSet<Address>,
    /// Treatment of asserted total liquidity
    pub total_liquidity_policy: TotalLiquidityPolicy,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            local_chain: 1,
            tree_height: DEFAULT_TREE_HEIGHT,
            remote_chains: BTreeSet::new(),
            settlers: BTreeSet::new(),
            total_liquidity_policy: TotalLiquidityPolicy::Trusted,
        }
    }
}

impl MatrixConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> LedgerResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| LedgerError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if self.tree_height == 0 || self.tree_height > MAX_TREE_HEIGHT {
            return Err(LedgerError::InvalidConfig {
                reason: format!(
                    "tree_height {} outside 1..={}",
                    self.tree_height, MAX_TREE_HEIGHT
                ),
            });
        }
        if self.remote_chains.contains(&self.local_chain) {
            return Err(LedgerError::InvalidConfig {
                reason: format!("local chain {} listed as remote", self.local_chain),
            });
        }
        Ok(())
    }

    pub fn with_remote_chain(mut self, chain: ChainUid) -> Self {
        self.remote_chains.insert(chain);
        self
    }

    pub fn with_settler(mut self, settler: Address) -> Self {
        self.settlers.insert(settler);
        self
    }

    pub fn with_policy(mut self, policy: TotalLiquidityPolicy) -> Self {
        self.total_liquidity_policy = policy;
        self
    }
}

/// Per-app behavior switches
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Drop settled entries for remote accounts without a local mapping
    pub sync_mapped_accounts_only: bool,
    /// Invoke the app hook on settlement and mapping
    pub use_hook: bool,
    /// Consult the mapping validator before committing a mapping
    pub validate_account_mapping: bool,
    /// App-specific settler, in addition to the whitelist
    pub settler: Option<Address>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MatrixConfig::default();
        assert_eq!(config.tree_height, DEFAULT_TREE_HEIGHT);
        assert_eq!(config.total_liquidity_policy, TotalLiquidityPolicy::Trusted);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = MatrixConfig::from_json_str(
            r#"{ "local_chain": 10, "remote_chains": [20, 30], "total_liquidity_policy": "cross_check" }"#,
        )
        .unwrap();
        assert_eq!(config.local_chain, 10);
        assert!(config.remote_chains.contains(&30));
        assert_eq!(config.total_liquidity_policy, TotalLiquidityPolicy::CrossCheck);
        assert_eq!(config.tree_height, DEFAULT_TREE_HEIGHT);
    }

    #[test]
    fn test_rejects_local_chain_as_remote() {
        let err = MatrixConfig::from_json_str(r#"{ "local_chain": 5, "remote_chains": [5] }"#)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidConfig { .. }));
    }

    #[test]
    fn test_rejects_bad_height() {
        let err = MatrixConfig::from_json_str(r#"{ "tree_height": 0 }"#).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidConfig { .. }));
    }

    #[test]
    fn test_malformed_json() {
        assert!(MatrixConfig::from_json_str("{ not json").is_err());
    }
}
