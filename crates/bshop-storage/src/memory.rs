//! In-process object store for tests and local runs without a storage node.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bshop_core::ContentId;
use dashmap::DashMap;

use crate::error::StorageError;
use crate::gateway::ObjectFetcher;
use crate::upload::ObjectUploader;

#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: DashMap<ContentId, Vec<u8>>,
    next_id: AtomicU64,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bytes` under a caller-chosen id.
    pub fn insert(&self, cid: ContentId, bytes: Vec<u8>) {
        self.objects.insert(cid, bytes);
    }

    pub fn get(&self, cid: &ContentId) -> Option<Vec<u8>> {
        self.objects.get(cid).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectFetcher for MemoryObjectStore {
    async fn fetch(&self, cid: &ContentId) -> Result<Vec<u8>, StorageError> {
        self.get(cid)
            .ok_or_else(|| StorageError::fetch(cid.as_str(), "not found"))
    }
}

#[async_trait]
impl ObjectUploader for MemoryObjectStore {
    async fn upload(&self, _file_name: &str, bytes: Vec<u8>) -> Result<ContentId, StorageError> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let cid = ContentId::new(format!("Qmmem{n:08}"))
            .map_err(|_| StorageError::InvalidHash { hash: format!("Qmmem{n:08}") })?;
        self.objects.insert(cid.clone(), bytes);
        Ok(cid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_then_fetch() {
        let store = MemoryObjectStore::new();
        let a = store.upload("a.bin", b"one".to_vec()).await.unwrap();
        let b = store.upload("b.bin", b"two".to_vec()).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.fetch(&a).await.unwrap(), b"one");
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn missing_object_is_upstream_fetch_error() {
        let store = MemoryObjectStore::new();
        let cid = ContentId::new("Qm404").unwrap();
        assert!(matches!(
            store.fetch(&cid).await,
            Err(StorageError::UpstreamFetch { .. })
        ));
    }
}
