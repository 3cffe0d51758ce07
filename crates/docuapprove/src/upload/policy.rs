//! The upload policy: allow-list, size limit and content checks.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::{sniff_content_type, Upload, UploadError};
use crate::config::UploadConfig;

fn mime_pattern() -> &'static Regex {
    static MIME: OnceLock<Regex> = OnceLock::new();
    MIME.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9!#$&^_.+-]*/[a-z0-9][a-z0-9!#$&^_.+-]*$")
            .expect("static regex is valid")
    })
}

/// Lowercase a MIME type and strip any parameters.
///
/// `"Application/PDF; charset=binary"` becomes `"application/pdf"`.
#[must_use]
pub fn normalize_mime(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Check that `mime` is a bare `type/subtype` string.
#[must_use]
pub fn is_valid_mime(mime: &str) -> bool {
    mime_pattern().is_match(&normalize_mime(mime))
}

/// Rules every upload must satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    allowed_types: Vec<String>,
    max_size_bytes: u64,
}

impl UploadPolicy {
    /// Create a policy from an allow-list and a byte limit.
    #[must_use]
    pub fn new(allowed_types: Vec<String>, max_size_bytes: u64) -> Self {
        Self {
            allowed_types: allowed_types.iter().map(|t| normalize_mime(t)).collect(),
            max_size_bytes,
        }
    }

    /// Create a policy from the `[upload]` config section.
    #[must_use]
    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(config.allowed_types.clone(), config.max_size_bytes)
    }

    /// The normalized allow-list.
    #[must_use]
    pub fn allowed_types(&self) -> &[String] {
        &self.allowed_types
    }

    /// The size limit in bytes.
    #[must_use]
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Check if a MIME type is accepted.
    #[must_use]
    pub fn allows(&self, mime: &str) -> bool {
        let mime = normalize_mime(mime);
        self.allowed_types.iter().any(|t| *t == mime)
    }

    /// Validate an upload.
    ///
    /// # Errors
    ///
    /// Returns the first [`UploadError`] the upload trips, checked in the
    /// order: name, emptiness, type, size, content.
    pub fn validate(&self, upload: &Upload) -> Result<(), UploadError> {
        if upload.file_name.trim().is_empty() {
            return Err(UploadError::MissingFileName);
        }

        if upload.bytes.is_empty() {
            return Err(UploadError::EmptyFile);
        }

        let declared = normalize_mime(&upload.content_type);
        if !self.allows(&declared) {
            debug!(file_type = %declared, "Upload rejected: type not allowed");
            return Err(UploadError::UnsupportedType {
                found: declared,
                allowed: self.allowed_types.clone(),
            });
        }

        let size = upload.size();
        if size > self.max_size_bytes {
            debug!(size, max = self.max_size_bytes, "Upload rejected: too large");
            return Err(UploadError::TooLarge {
                size,
                max: self.max_size_bytes,
            });
        }

        if let Some(detected) = sniff_content_type(&upload.bytes) {
            if detected != declared {
                debug!(declared = %declared, detected, "Upload rejected: content mismatch");
                return Err(UploadError::ContentMismatch { declared, detected });
            }
        }

        Ok(())
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::from_config(&UploadConfig::default())
    }
}
