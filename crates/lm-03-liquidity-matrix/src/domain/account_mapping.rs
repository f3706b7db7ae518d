//! # Account Mapping
//!
//! Per-(app, chain) one-to-one identity links from a remote account to a
//! local account. Links are permanent once recorded.

use serde::{Deserialize, Serialize};
use shared_types::{Address, ChainUid};
use std::collections::{HashMap, HashSet};

use crate::error::{fmt_address, LedgerError, LedgerResult};

/// Remote <-> local links for one app on one chain.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AccountMapping {
    remote_to_local: HashMap<Address, Address>,
    local_to_remote: HashMap<Address, Address>,
}

impl AccountMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject a batch if any side is already linked, here or earlier in the
    /// same batch.
    pub fn check_batch(
        &self,
        chain: ChainUid,
        remotes: &[Address],
        locals: &[Address],
    ) -> LedgerResult<()> {
        let mut seen_remote = HashSet::new();
        let mut seen_local = HashSet::new();
        for (remote, local) in remotes.iter().zip(locals) {
            if self.remote_to_local.contains_key(remote) || !seen_remote.insert(*remote) {
                return Err(LedgerError::RemoteAccountAlreadyMapped {
                    chain,
                    remote: fmt_address(remote),
                });
            }
            if self.local_to_remote.contains_key(local) || !seen_local.insert(*local) {
                return Err(LedgerError::LocalAccountAlreadyMapped {
                    chain,
                    local: fmt_address(local),
                });
            }
        }
        Ok(())
    }

    /// Record a link. Callers run [`Self::check_batch`] first.
    pub fn insert(&mut self, remote: Address, local: Address) {
        self.remote_to_local.insert(remote, local);
        self.local_to_remote.insert(local, remote);
    }

    pub fn local_of(&self, remote: &Address) -> Option<Address> {
        self.remote_to_local.get(remote).copied()
    }

    pub fn remote_of(&self, local: &Address) -> Option<Address> {
        self.local_to_remote.get(local).copied()
    }

    pub fn len(&self) -> usize {
        self.remote_to_local.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remote_to_local.is_empty()
    }
}
