//! # EVM JSON-RPC Access Oracle
//!
//! Reads the marketplace contract's purchase table with a single
//! `eth_call`:
//!
//! ```solidity
//! function hasBuyerAccess(address buyer, string cid) external view returns (bool);
//! ```
//!
//! ## Calldata Layout
//!
//! ```text
//! selector (4) || buyer, left-padded (32) || 0x40 offset (32)
//!              || cid length (32) || cid bytes, right-padded to 32
//! ```
//!
//! ## Failure Policy
//!
//! HTTP errors, JSON-RPC errors (reverts included), timeouts and results
//! that do not decode as an ABI `bool` all become
//! [`AccessResult::Unknown`]. Only a well-formed `true` is a grant.

use std::time::Duration;

use async_trait::async_trait;
use bshop_core::{ChainSelection, ContentId, EvmAddress};
use bshop_crypto::keccak256;

use crate::access::{AccessOracle, AccessResult};
use crate::error::ChainError;

/// Canonical signature of the purchase lookup.
pub const HAS_BUYER_ACCESS_SIGNATURE: &str = "hasBuyerAccess(address,string)";

const WORD: usize = 32;

/// Configuration for [`EvmAccessOracle`].
#[derive(Debug, Clone)]
pub struct EvmOracleConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,
    /// Marketplace contract address.
    pub contract_address: EvmAddress,
    /// Network the contract lives on.
    pub chain: ChainSelection,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl EvmOracleConfig {
    /// Configuration using the chain's public RPC endpoint and a 10s timeout.
    pub fn new(chain: ChainSelection, contract_address: EvmAddress) -> Self {
        Self {
            rpc_url: chain.default_rpc_url().to_string(),
            contract_address,
            chain,
            timeout_secs: 10,
        }
    }

    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Access oracle backed by a marketplace contract on an EVM chain.
#[derive(Debug)]
pub struct EvmAccessOracle {
    client: reqwest::Client,
    config: EvmOracleConfig,
    selector: [u8; 4],
}

impl EvmAccessOracle {
    pub fn new(config: EvmOracleConfig) -> Result<Self, ChainError> {
        if config.rpc_url.trim().is_empty() {
            return Err(ChainError::Config("RPC URL is empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChainError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            selector: function_selector(HAS_BUYER_ACCESS_SIGNATURE),
        })
    }

    pub fn config(&self) -> &EvmOracleConfig {
        &self.config
    }

    /// Query the contract. Errors are returned as-is; see
    /// [`AccessOracle::check_access`] for the fail-closed mapping.
    pub async fn has_buyer_access(
        &self,
        buyer: &EvmAddress,
        cid: &ContentId,
    ) -> Result<bool, ChainError> {
        let call = serde_json::json!({
            "to": self.config.contract_address.to_hex(),
            "data": format!("0x{}", hex::encode(encode_has_buyer_access(self.selector, buyer, cid))),
        });
        let result = self
            .rpc_call("eth_call", serde_json::json!([call, "latest"]))
            .await?;

        let encoded = result.as_str().ok_or_else(|| self.malformed("eth_call result is not a string"))?;
        decode_bool(encoded).ok_or_else(|| self.malformed(&format!("not an ABI bool: {encoded}")))
    }

    async fn rpc_call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ChainError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let resp = self
            .client
            .post(&self.config.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChainError::Timeout {
                        chain: self.chain_name(),
                    }
                } else {
                    ChainError::Transport {
                        chain: self.chain_name(),
                        reason: e.to_string(),
                    }
                }
            })?;

        if !resp.status().is_success() {
            return Err(ChainError::HttpStatus {
                chain: self.chain_name(),
                status: resp.status().as_u16(),
            });
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| self.malformed(&format!("invalid JSON response: {e}")))?;

        if let Some(error) = json.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown RPC error");
            return Err(ChainError::Rpc {
                chain: self.chain_name(),
                message: message.to_string(),
            });
        }

        json.get("result")
            .cloned()
            .ok_or_else(|| self.malformed("JSON-RPC response missing 'result' field"))
    }

    fn chain_name(&self) -> String {
        self.config.chain.as_str().to_string()
    }

    fn malformed(&self, reason: &str) -> ChainError {
        ChainError::MalformedResponse {
            chain: self.chain_name(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl AccessOracle for EvmAccessOracle {
    async fn check_access(&self, buyer: &EvmAddress, cid: &ContentId) -> AccessResult {
        match self.has_buyer_access(buyer, cid).await {
            Ok(true) => AccessResult::Granted,
            Ok(false) => AccessResult::Denied,
            Err(e) => {
                tracing::warn!(
                    chain = %self.config.chain,
                    cid = %cid,
                    error = %e,
                    "access check failed, treating as no access"
                );
                AccessResult::Unknown(e.to_string())
            }
        }
    }
}

/// First four bytes of the Keccak-256 of a function signature.
pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// ABI-encode a `hasBuyerAccess(address,string)` call.
pub fn encode_has_buyer_access(selector: [u8; 4], buyer: &EvmAddress, cid: &ContentId) -> Vec<u8> {
    let cid_bytes = cid.as_str().as_bytes();
    let padded_len = cid_bytes.len().div_ceil(WORD) * WORD;

    let mut out = Vec::with_capacity(4 + 3 * WORD + padded_len);
    out.extend_from_slice(&selector);

    let mut address_word = [0u8; WORD];
    address_word[12..].copy_from_slice(buyer.as_bytes());
    out.extend_from_slice(&address_word);

    out.extend_from_slice(&uint_word(2 * WORD as u64));
    out.extend_from_slice(&uint_word(cid_bytes.len() as u64));
    out.extend_from_slice(cid_bytes);
    out.resize(4 + 3 * WORD + padded_len, 0);
    out
}

/// Decode a single ABI `bool` return value. Anything other than a zero or
/// one word is rejected.
pub fn decode_bool(encoded: &str) -> Option<bool> {
    let hex_part = encoded.strip_prefix("0x").unwrap_or(encoded);
    if hex_part.len() != WORD * 2 {
        return None;
    }
    let mut word = [0u8; WORD];
    hex::decode_to_slice(hex_part, &mut word).ok()?;
    if word[..WORD - 1].iter().any(|b| *b != 0) {
        return None;
    }
    match word[WORD - 1] {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}

fn uint_word(value: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    word
}
