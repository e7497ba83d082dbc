//! # Key Vault
//!
//! Maps a content id to the symmetric key and IV created when the object
//! was uploaded. At most one record exists per content id; `store` is an
//! upsert. Records are never rotated or deleted.
//!
//! Two backends implement [`KeyVault`]: [`MemoryKeyVault`] for development
//! and tests, and [`crate::db::keys::PgKeyVault`] when `DATABASE_URL` is set.

use std::fmt;

use async_trait::async_trait;
use bshop_core::ContentId;
use bshop_crypto::{ContentKey, KeyAlgorithm};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use thiserror::Error;

/// Key material for one stored object.
///
/// `Debug` redacts the key.
#[derive(Clone, PartialEq, Eq)]
pub struct ContentKeyRecord {
    pub content_id: ContentId,
    pub algorithm: KeyAlgorithm,
    /// 32-byte key, base64.
    pub key_b64: String,
    /// 12-byte IV, base64.
    pub iv_b64: String,
    pub created_at: DateTime<Utc>,
}

impl ContentKeyRecord {
    /// AES-256-GCM record for a freshly generated key.
    pub fn for_key(content_id: ContentId, key: &ContentKey) -> Self {
        Self {
            content_id,
            algorithm: KeyAlgorithm::Aes256Gcm,
            key_b64: key.key_base64(),
            iv_b64: key.nonce_base64(),
            created_at: Utc::now(),
        }
    }
}

impl fmt::Debug for ContentKeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentKeyRecord")
            .field("content_id", &self.content_id)
            .field("algorithm", &self.algorithm)
            .field("key_b64", &"[REDACTED]")
            .field("iv_b64", &self.iv_b64)
            .field("created_at", &self.created_at)
            .finish()
    }
}

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row cannot be turned into a record.
    #[error("corrupt key record for {cid}: {reason}")]
    Corrupt { cid: String, reason: String },
}

#[async_trait]
pub trait KeyVault: Send + Sync {
    /// Key record for `cid`, if the object was stored encrypted.
    async fn lookup(&self, cid: &ContentId) -> Result<Option<ContentKeyRecord>, VaultError>;

    /// Insert or replace the record for `record.content_id`.
    async fn store(&self, record: ContentKeyRecord) -> Result<(), VaultError>;

    /// Cheap liveness check for readiness probes.
    async fn health_check(&self) -> Result<(), VaultError> {
        Ok(())
    }
}

/// In-process vault. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryKeyVault {
    records: DashMap<ContentId, ContentKeyRecord>,
}

impl MemoryKeyVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl KeyVault for MemoryKeyVault {
    async fn lookup(&self, cid: &ContentId) -> Result<Option<ContentKeyRecord>, VaultError> {
        Ok(self.records.get(cid).map(|entry| entry.value().clone()))
    }

    async fn store(&self, record: ContentKeyRecord) -> Result<(), VaultError> {
        self.records.insert(record.content_id.clone(), record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(s: &str) -> ContentId {
        ContentId::new(s).unwrap()
    }

    #[tokio::test]
    async fn lookup_missing_is_none() {
        let vault = MemoryKeyVault::new();
        assert!(vault.lookup(&cid("Qm123")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn store_is_an_upsert() {
        let vault = MemoryKeyVault::new();
        let first = ContentKeyRecord::for_key(cid("Qm123"), &ContentKey::generate());
        let second = ContentKeyRecord::for_key(cid("Qm123"), &ContentKey::generate());

        vault.store(first).await.unwrap();
        vault.store(second.clone()).await.unwrap();

        assert_eq!(vault.len(), 1);
        assert_eq!(vault.lookup(&cid("Qm123")).await.unwrap(), Some(second));
    }

    #[test]
    fn record_uses_aes_tag_and_redacts_key() {
        let key = ContentKey::generate();
        let record = ContentKeyRecord::for_key(cid("Qm123"), &key);
        assert_eq!(record.algorithm.as_str(), "aes-256-gcm");
        let debug = format!("{record:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains(&key.key_base64()));
    }
}
