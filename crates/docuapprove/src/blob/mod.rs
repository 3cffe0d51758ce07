//! Blob storage for uploaded files.
//!
//! This module defines the [`BlobStore`] trait that file backends implement,
//! plus a filesystem backend and an in-memory one.

mod fs;
mod memory;

use crate::error::{Error, Result};

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;

/// The path segment at which object keys start inside a public URL.
const KEY_ROOT_SEGMENT: &str = "documents";

/// A trait for file storage backends.
///
/// Keys are `/`-separated relative paths such as
/// `documents/user123/2024-01-01T00-00-00-000Z-report.pdf`. [`BlobStore::put`]
/// replaces an existing key; [`BlobStore::put_new`] refuses to.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug {
    /// Short backend name for logs and status output.
    fn name(&self) -> &'static str;

    /// Base URL that [`BlobStore::public_url`] prefixes keys with.
    fn base_url(&self) -> &str;

    /// Store `bytes` under `key`, replacing any existing object.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the write fails.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;

    /// Read the object stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlobNotFound`] if nothing is stored there.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Store `bytes` under `key` only if nothing is stored there yet.
    ///
    /// Returns `false`, leaving the existing object untouched, when the key is
    /// taken. The check and the write are one step, so two concurrent callers
    /// never both get `true` for the same key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the write fails.
    async fn put_new(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<bool>;

    /// Remove the object under `key`.
    ///
    /// Returns `true` if something was removed, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the removal fails.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Public URL of the object under `key`.
    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url().trim_end_matches('/'), key)
    }

    /// Recover the object key from a URL produced by [`BlobStore::public_url`].
    fn key_from_url(&self, url: &str) -> Option<String> {
        key_from_url(url)
    }
}

/// Extract an object key from a URL.
///
/// The key starts at the first `documents` path segment. Query strings and
/// fragments are ignored. Returns `None` when the URL has no such segment or
/// nothing follows it.
#[must_use]
pub fn key_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = path.split('/').collect();
    let start = segments.iter().position(|s| *s == KEY_ROOT_SEGMENT)?;

    let key = segments[start..].join("/");
    if segments.len() <= start + 1 || validate_key(&key).is_err() {
        return None;
    }
    Some(key)
}

/// Check that `key` is a safe relative object key.
///
/// # Errors
///
/// Returns [`Error::Blob`] for empty keys, absolute keys, backslashes, and
/// empty, `.` or `..` segments.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::blob(key, "key must not be empty"));
    }
    if key.starts_with('/') {
        return Err(Error::blob(key, "key must be relative"));
    }
    if key.contains('\\') {
        return Err(Error::blob(key, "key must not contain backslashes"));
    }
    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(Error::blob(key, "key contains an invalid path segment"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_accepts_object_keys() {
        assert!(validate_key("documents/user123/2023-10-26T12-34-56-789Z-a.pdf").is_ok());
        assert!(validate_key("a").is_ok());
    }

    #[test]
    fn test_validate_key_rejects_unsafe_keys() {
        for key in [
            "",
            "/etc/passwd",
            "documents/../../secret",
            "documents/./x",
            "documents//x",
            "documents/x/",
            "documents\\x",
        ] {
            assert!(validate_key(key).is_err(), "accepted {key:?}");
        }
    }

    #[test]
    fn test_key_from_url() {
        assert_eq!(
            key_from_url("https://files.example.com/bucket/documents/u1/a.pdf").as_deref(),
            Some("documents/u1/a.pdf")
        );
        assert_eq!(
            key_from_url("/blobs/documents/u1/a.pdf?token=abc#page=2").as_deref(),
            Some("documents/u1/a.pdf")
        );
    }

    #[test]
    fn test_key_from_url_without_documents_segment() {
        assert!(key_from_url("https://files.example.com/other/a.pdf").is_none());
        assert!(key_from_url("https://files.example.com/documents").is_none());
        assert!(key_from_url("https://files.example.com/my-documents/a.pdf").is_none());
    }

    #[test]
    fn test_key_from_url_rejects_traversal() {
        assert!(key_from_url("/blobs/documents/../../etc/passwd").is_none());
    }
}
