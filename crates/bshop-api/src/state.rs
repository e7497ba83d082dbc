//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor. Every collaborator sits behind a trait object so
//! tests can swap the chain, storage and vault backends.
//!
//! No request writes to state; the only mutable resource is the key vault,
//! behind its own synchronization. The database pool, when present, lives
//! inside the Postgres vault and is closed by `main` on shutdown.

use std::fmt;
use std::sync::Arc;

use bshop_chain::{AccessOracle, EvmAccessOracle, EvmOracleConfig, StaticAccessOracle};
use bshop_storage::{
    GatewayConfig, GatewayFetcher, ObjectFetcher, ObjectUploader, StorageNodeConfig,
    StorageUploader,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::db::keys::PgKeyVault;
use crate::pipeline::DecryptFailurePolicy;
use crate::vault::{KeyVault, MemoryKeyVault};

/// Default request body limit for uploads.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub vault: Arc<dyn KeyVault>,
    pub oracle: Arc<dyn AccessOracle>,
    pub fetcher: Arc<dyn ObjectFetcher>,
    /// `None` when no storage API key is configured; uploads answer 503.
    pub uploader: Option<Arc<dyn ObjectUploader>>,
    pub decrypt_failure: DecryptFailurePolicy,
    pub max_upload_bytes: usize,
    /// Present when metrics are enabled; renders `/metrics`.
    pub metrics: Option<PrometheusHandle>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("uploader", &self.uploader.is_some())
            .field("decrypt_failure", &self.decrypt_failure)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// State with the given collaborators, no uploader, fail-soft decryption
    /// and metrics off.
    pub fn new(
        vault: Arc<dyn KeyVault>,
        oracle: Arc<dyn AccessOracle>,
        fetcher: Arc<dyn ObjectFetcher>,
    ) -> Self {
        Self {
            vault,
            oracle,
            fetcher,
            uploader: None,
            decrypt_failure: DecryptFailurePolicy::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            metrics: None,
        }
    }

    pub fn with_uploader(mut self, uploader: Arc<dyn ObjectUploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    pub fn with_decrypt_failure(mut self, policy: DecryptFailurePolicy) -> Self {
        self.decrypt_failure = policy;
        self
    }

    pub fn with_max_upload_bytes(mut self, limit: usize) -> Self {
        self.max_upload_bytes = limit;
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Build production state from configuration.
    ///
    /// With a pool the vault is Postgres-backed, otherwise in-memory. Without
    /// a marketplace address every access check is denied.
    pub fn from_config(config: &AppConfig, db_pool: Option<PgPool>) -> Result<Self, BootstrapError> {
        let vault: Arc<dyn KeyVault> = match db_pool {
            Some(pool) => Arc::new(PgKeyVault::new(pool)),
            None => Arc::new(MemoryKeyVault::new()),
        };

        let oracle: Arc<dyn AccessOracle> = match config.marketplace_address {
            Some(contract) => {
                let oracle_config = EvmOracleConfig::new(config.chain, contract)
                    .with_rpc_url(config.rpc_url.as_str())
                    .with_timeout_secs(config.rpc_timeout_secs);
                tracing::info!(chain = %config.chain, contract = %contract, "on-chain access checks enabled");
                Arc::new(EvmAccessOracle::new(oracle_config)?)
            }
            None => {
                tracing::warn!(
                    "BSHOP_MARKETPLACE_ADDRESS not set: every download will be denied"
                );
                Arc::new(StaticAccessOracle::new())
            }
        };

        let fetcher = GatewayFetcher::new(
            GatewayConfig::new(config.gateway_url.as_str())
                .with_timeout_secs(config.gateway_timeout_secs),
        )?;

        let mut state = Self::new(vault, oracle, Arc::new(fetcher))
            .with_decrypt_failure(config.decrypt_failure)
            .with_max_upload_bytes(config.max_upload_bytes);

        match &config.storage_api_key {
            Some(api_key) => {
                let uploader = StorageUploader::new(
                    StorageNodeConfig::new(config.upload_url.as_str(), api_key.clone())
                        .with_timeout_secs(config.gateway_timeout_secs),
                )?;
                state = state.with_uploader(Arc::new(uploader));
            }
            None => {
                tracing::warn!("LIGHTHOUSE_API_KEY not set: uploads will return 503");
            }
        }

        Ok(state)
    }
}

/// Errors constructing state from configuration.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("access oracle: {0}")]
    Chain(#[from] bshop_chain::ChainError),
    #[error("storage client: {0}")]
    Storage(#[from] bshop_storage::StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|var| map.get(var).cloned()).unwrap()
    }

    #[tokio::test]
    async fn minimal_config_builds_in_memory_state() {
        let state = AppState::from_config(&config(&[]), None).unwrap();
        assert!(state.uploader.is_none());
        assert!(state.vault.health_check().await.is_ok());
        assert_eq!(state.decrypt_failure, DecryptFailurePolicy::ServeOriginal);
    }

    #[test]
    fn api_key_enables_uploads() {
        let state = AppState::from_config(
            &config(&[
                ("LIGHTHOUSE_API_KEY", "lh-key"),
                ("BSHOP_MARKETPLACE_ADDRESS", "0x5fbdb2315678afecb367f032d93f642f64180aa3"),
                ("BSHOP_DECRYPT_FAILURE", "reject"),
            ]),
            None,
        )
        .unwrap();
        assert!(state.uploader.is_some());
        assert_eq!(state.decrypt_failure, DecryptFailurePolicy::Reject);
    }

    #[test]
    fn debug_does_not_panic_without_pool() {
        let state = AppState::from_config(&config(&[]), None).unwrap();
        assert!(format!("{state:?}").contains("AppState"));
    }
}
