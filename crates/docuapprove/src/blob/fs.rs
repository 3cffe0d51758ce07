//! Filesystem blob backend.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{validate_key, BlobStore};
use crate::error::{Error, Result};

/// Stores each object as a file under a root directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    base_url: String,
}

impl FsBlobStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(key
            .split('/')
            .fold(self.root.clone(), |path, segment| path.join(segment)))
    }
}

async fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    Ok(())
}

#[async_trait::async_trait]
impl BlobStore for FsBlobStore {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let path = self.path_for(key)?;
        create_parent(&path).await?;

        let size = bytes.len();
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| Error::blob(key, e.to_string()))?;

        debug!(key = %key, size, content_type = %content_type, "Stored blob");
        Ok(())
    }

    async fn put_new(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        create_parent(&path).await?;

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(Error::blob(key, e.to_string())),
        };

        let written = match file.write_all(bytes).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(Error::blob(key, e.to_string()));
        }

        debug!(key = %key, size = bytes.len(), content_type = %content_type, "Stored new blob");
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::BlobNotFound {
                key: key.to_string(),
            }),
            Err(e) => Err(Error::blob(key, e.to_string())),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key = %key, "Deleted blob");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::blob(key, e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TempDir(PathBuf);

    impl TempDir {
        fn new() -> Self {
            let path = std::env::temp_dir().join(format!(
                "docuapprove_blobs_{}",
                uuid::Uuid::new_v4().simple()
            ));
            Self(path)
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    const KEY: &str = "documents/user123/2023-10-26T12-34-56-789Z-a.pdf";

    #[tokio::test]
    async fn test_put_and_get() {
        let dir = TempDir::new();
        let store = FsBlobStore::new(&dir.0, "/blobs");

        store
            .put(KEY, b"%PDF-1.7".to_vec(), "application/pdf")
            .await
            .unwrap();

        assert_eq!(store.get(KEY).await.unwrap(), b"%PDF-1.7");
        assert!(dir.0.join("documents").join("user123").is_dir());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let dir = TempDir::new();
        let store = FsBlobStore::new(&dir.0, "/blobs");

        store.put(KEY, b"first".to_vec(), "application/pdf").await.unwrap();
        store.put(KEY, b"second".to_vec(), "application/pdf").await.unwrap();

        assert_eq!(store.get(KEY).await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_put_new_keeps_existing_file() {
        let dir = TempDir::new();
        let store = FsBlobStore::new(&dir.0, "/blobs");

        assert!(store.put_new(KEY, b"first", "application/pdf").await.unwrap());
        assert!(!store.put_new(KEY, b"second", "application/pdf").await.unwrap());
        assert_eq!(store.get(KEY).await.unwrap(), b"first");

        store.delete(KEY).await.unwrap();
        assert!(store.put_new(KEY, b"third", "application/pdf").await.unwrap());
        assert_eq!(store.get(KEY).await.unwrap(), b"third");
    }

    #[tokio::test]
    async fn test_get_missing() {
        let dir = TempDir::new();
        let store = FsBlobStore::new(&dir.0, "/blobs");

        let err = store.get(KEY).await.unwrap_err();
        assert!(matches!(err, Error::BlobNotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = TempDir::new();
        let store = FsBlobStore::new(&dir.0, "/blobs");
        store.put(KEY, b"x".to_vec(), "application/pdf").await.unwrap();

        assert!(store.delete(KEY).await.unwrap());
        assert!(!store.delete(KEY).await.unwrap());
        assert!(store.get(KEY).await.is_err());
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let dir = TempDir::new();
        let store = FsBlobStore::new(&dir.0, "/blobs");

        let err = store
            .put("../outside.pdf", b"x".to_vec(), "application/pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Blob { .. }));
        assert!(store.get("/etc/passwd").await.is_err());
        assert!(store.delete("").await.is_err());
    }

    #[test]
    fn test_public_url_round_trip() {
        let store = FsBlobStore::new("/tmp/unused", "https://files.example.com/blobs/");
        let url = store.public_url(KEY);
        assert_eq!(url, format!("https://files.example.com/blobs/{KEY}"));
        assert_eq!(store.key_from_url(&url).as_deref(), Some(KEY));
        assert_eq!(store.name(), "filesystem");
    }
}
