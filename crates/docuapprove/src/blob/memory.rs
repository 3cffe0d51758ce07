//! In-memory blob backend.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tokio::sync::RwLock;

use super::{validate_key, BlobStore};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct StoredBlob {
    bytes: Vec<u8>,
    content_type: String,
}

/// Keeps objects in a map. Contents are lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, StoredBlob>>,
    base_url: String,
}

impl MemoryBlobStore {
    /// Create an empty store publishing under `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            base_url: base_url.into(),
        }
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Check if the store holds no objects.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Content type recorded for `key`.
    pub async fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|blob| blob.content_type.clone())
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBlobStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        validate_key(key)?;
        self.objects.write().await.insert(
            key.to_string(),
            StoredBlob {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn put_new(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<bool> {
        validate_key(key)?;
        match self.objects.write().await.entry(key.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(StoredBlob {
                    bytes: bytes.to_vec(),
                    content_type: content_type.to_string(),
                });
                Ok(true)
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        validate_key(key)?;
        self.objects
            .read()
            .await
            .get(key)
            .map(|blob| blob.bytes.clone())
            .ok_or_else(|| Error::BlobNotFound {
                key: key.to_string(),
            })
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        Ok(self.objects.write().await.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryBlobStore::new("/blobs");
        assert!(store.is_empty().await);

        store
            .put("documents/u1/a.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("documents/u1/a.png").await.unwrap(), vec![1, 2, 3]);
        assert_eq!(
            store.content_type("documents/u1/a.png").await.as_deref(),
            Some("image/png")
        );

        assert!(store.delete("documents/u1/a.png").await.unwrap());
        assert!(!store.delete("documents/u1/a.png").await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_put_new_refuses_taken_key() {
        let store = MemoryBlobStore::new("/blobs");
        let key = "documents/u1/a.pdf";

        assert!(store.put_new(key, b"%PDF-A", "application/pdf").await.unwrap());
        assert!(!store.put_new(key, b"%PDF-B", "application/pdf").await.unwrap());
        assert_eq!(store.get(key).await.unwrap(), b"%PDF-A");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = MemoryBlobStore::new("/blobs");
        let err = store.get("documents/u1/none.pdf").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_rejects_invalid_key() {
        let store = MemoryBlobStore::new("/blobs");
        assert!(store.put("", vec![1], "image/png").await.is_err());
        assert!(store.is_empty().await);
    }

    #[test]
    fn test_public_url() {
        let store = MemoryBlobStore::new("/blobs");
        assert_eq!(store.public_url("documents/u1/a.pdf"), "/blobs/documents/u1/a.pdf");
        assert_eq!(store.name(), "memory");
    }
}
