//! # Chain Selection
//!
//! The marketplace contract is deployed on Polygon. Deployments pick the
//! network by name; anything other than the production names resolves to
//! the Amoy test network.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The EVM network the access oracle queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainSelection {
    /// Polygon Amoy test network.
    #[default]
    Amoy,
    /// Polygon PoS mainnet.
    Polygon,
}

impl ChainSelection {
    /// Resolve a configured network name.
    ///
    /// `polygon` and `mainnet` (any case) select Polygon PoS; every other
    /// value, including an empty one, selects Amoy.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "polygon" | "mainnet" => Self::Polygon,
            _ => Self::Amoy,
        }
    }

    /// EIP-155 chain id.
    pub fn chain_id(&self) -> u64 {
        match self {
            Self::Amoy => 80002,
            Self::Polygon => 137,
        }
    }

    /// Public JSON-RPC endpoint used when no override is configured.
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Self::Amoy => "https://rpc-amoy.polygon.technology",
            Self::Polygon => "https://polygon-rpc.com",
        }
    }

    /// Short name for logs and metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amoy => "amoy",
            Self::Polygon => "polygon",
        }
    }
}

impl fmt::Display for ChainSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
