//! # Gateway Fetcher
//!
//! Retrieves raw object bytes by content id from an HTTP gateway at
//! `{base_url}/ipfs/{cid}`. Any non-2xx status, transport failure or body
//! read error is an [`StorageError::UpstreamFetch`]. Fetches are not
//! retried; a timeout bounds each one.

use std::time::Duration;

use async_trait::async_trait;
use bshop_core::ContentId;
use url::Url;

use crate::error::StorageError;

/// Default public gateway.
pub const DEFAULT_GATEWAY_URL: &str = "https://gateway.lighthouse.storage";

/// Source of object bytes by content id.
#[async_trait]
pub trait ObjectFetcher: Send + Sync {
    async fn fetch(&self, cid: &ContentId) -> Result<Vec<u8>, StorageError>;
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Gateway base URL, without the `/ipfs` suffix.
    pub base_url: String,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: 30,
        }
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new(DEFAULT_GATEWAY_URL)
    }
}

/// HTTP gateway client.
#[derive(Debug, Clone)]
pub struct GatewayFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl GatewayFetcher {
    pub fn new(config: GatewayConfig) -> Result<Self, StorageError> {
        Url::parse(&config.base_url)
            .map_err(|e| StorageError::Config(format!("gateway URL {}: {e}", config.base_url)))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StorageError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL the object for `cid` is served from.
    pub fn object_url(&self, cid: &ContentId) -> String {
        format!("{}/ipfs/{}", self.base_url, cid)
    }
}

#[async_trait]
impl ObjectFetcher for GatewayFetcher {
    async fn fetch(&self, cid: &ContentId) -> Result<Vec<u8>, StorageError> {
        let url = self.object_url(cid);
        let resp = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                StorageError::fetch(cid.as_str(), "request timed out")
            } else {
                StorageError::fetch(cid.as_str(), e.to_string())
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StorageError::fetch(cid.as_str(), format!("HTTP {status}")));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| StorageError::fetch(cid.as_str(), format!("reading body: {e}")))?;
        tracing::debug!(cid = %cid, len = bytes.len(), "fetched object from gateway");
        Ok(bytes.to_vec())
    }
}
