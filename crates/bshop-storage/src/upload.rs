//! # Storage-Node Uploader
//!
//! Pushes (already sealed) object bytes to a storage node:
//!
//! ```text
//! POST {base_url}/api/v0/add
//! Authorization: Bearer <api key>
//! Content-Type: multipart/form-data   (single part named "file")
//! ```
//!
//! The node answers `{"Name": ..., "Hash": "<cid>", "Size": ...}`.
//!
//! Only connection failures are retried. Once a connection is accepted the
//! node may already hold part or all of the body, so timeouts, broken
//! streams and error statuses are returned after a single attempt.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bshop_core::ContentId;
use serde::Deserialize;
use url::Url;

use crate::error::StorageError;

/// Default storage node.
pub const DEFAULT_UPLOAD_URL: &str = "https://node.lighthouse.storage";

/// Attempts at reaching the storage node before giving up.
const CONNECT_ATTEMPTS: u32 = 3;

/// Pause after a refused connection, multiplied by the attempt number.
const CONNECT_BACKOFF: Duration = Duration::from_millis(250);

/// Sink for new objects. Returns the content id the network assigned.
#[async_trait]
pub trait ObjectUploader: Send + Sync {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<ContentId, StorageError>;
}

/// Storage node settings.
///
/// `Debug` redacts the API key.
#[derive(Clone)]
pub struct StorageNodeConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl fmt::Debug for StorageNodeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageNodeConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl StorageNodeConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout_secs: 30,
        }
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: Option<String>,
}

/// HTTP client for the storage node.
#[derive(Debug, Clone)]
pub struct StorageUploader {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl StorageUploader {
    pub fn new(config: StorageNodeConfig) -> Result<Self, StorageError> {
        Url::parse(&config.base_url).map_err(|e| {
            StorageError::Config(format!("storage node URL {}: {e}", config.base_url))
        })?;
        if config.api_key.trim().is_empty() {
            return Err(StorageError::Config("storage API key is empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StorageError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/v0/add", config.base_url.trim_end_matches('/')),
            api_key: config.api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post_object(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<reqwest::Response, reqwest::Error> {
        let mut attempt = 1;
        loop {
            let part = reqwest::multipart::Part::bytes(bytes.to_vec())
                .file_name(file_name.to_string());
            let form = reqwest::multipart::Form::new().part("file", part);
            let result = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .multipart(form)
                .send()
                .await;

            match result {
                Err(e) if e.is_connect() && attempt < CONNECT_ATTEMPTS => {
                    let delay = CONNECT_BACKOFF * attempt;
                    tracing::warn!(
                        endpoint = %self.endpoint,
                        attempt,
                        bytes = bytes.len(),
                        "storage node unreachable, retrying in {delay:?}: {e}"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

#[async_trait]
impl ObjectUploader for StorageUploader {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<ContentId, StorageError> {
        let resp = self
            .post_object(file_name, &bytes)
            .await
            .map_err(|source| StorageError::Http {
            endpoint: self.endpoint.clone(),
            source,
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StorageError::UploadRejected {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: AddResponse =
            resp.json()
                .await
                .map_err(|source| StorageError::Deserialization {
                    endpoint: self.endpoint.clone(),
                    source,
                })?;

        let hash = parsed
            .hash
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| StorageError::MissingHash {
                endpoint: self.endpoint.clone(),
            })?;
        let cid = ContentId::new(hash.trim()).map_err(|_| StorageError::InvalidHash { hash })?;

        tracing::info!(cid = %cid, "uploaded object to storage node");
        Ok(cid)
    }
}
