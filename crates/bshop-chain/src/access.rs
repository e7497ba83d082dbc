//! # Access Oracle Abstraction
//!
//! The delivery flow depends on the [`AccessOracle`] trait rather than on a
//! concrete chain client, so tests and local deployments can substitute a
//! fixed grant table for the JSON-RPC reader.

use std::collections::HashSet;

use async_trait::async_trait;
use bshop_core::{ContentId, EvmAddress};
use dashmap::DashSet;

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessResult {
    /// The contract reports a purchase.
    Granted,
    /// The contract reports no purchase.
    Denied,
    /// The check could not complete. Carries the reason for logs.
    Unknown(String),
}

impl AccessResult {
    /// Fail-closed view: only a definite grant counts.
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// Read-only purchase lookup.
#[async_trait]
pub trait AccessOracle: Send + Sync {
    /// Whether `buyer` holds a purchase grant for `cid`.
    ///
    /// Implementations never error; failures are reported as
    /// [`AccessResult::Unknown`].
    async fn check_access(&self, buyer: &EvmAddress, cid: &ContentId) -> AccessResult;
}

/// In-memory grant table.
///
/// Used when no marketplace contract is configured and in tests.
#[derive(Debug, Default)]
pub struct StaticAccessOracle {
    grants: DashSet<(EvmAddress, ContentId)>,
}

impl StaticAccessOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an oracle pre-loaded with `grants`.
    pub fn with_grants(grants: impl IntoIterator<Item = (EvmAddress, ContentId)>) -> Self {
        let oracle = Self::new();
        for (buyer, cid) in grants {
            oracle.grant(buyer, cid);
        }
        oracle
    }

    pub fn grant(&self, buyer: EvmAddress, cid: ContentId) {
        self.grants.insert((buyer, cid));
    }

    pub fn revoke(&self, buyer: &EvmAddress, cid: &ContentId) {
        self.grants.remove(&(*buyer, cid.clone()));
    }

    /// Snapshot of the current grants.
    pub fn grants(&self) -> HashSet<(EvmAddress, ContentId)> {
        self.grants.iter().map(|entry| entry.key().clone()).collect()
    }
}

#[async_trait]
impl AccessOracle for StaticAccessOracle {
    async fn check_access(&self, buyer: &EvmAddress, cid: &ContentId) -> AccessResult {
        if self.grants.contains(&(*buyer, cid.clone())) {
            AccessResult::Granted
        } else {
            AccessResult::Denied
        }
    }
}
