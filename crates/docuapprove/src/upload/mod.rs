//! Upload validation and blob key layout.
//!
//! Every upload passes through an [`UploadPolicy`] before any byte reaches
//! blob storage:
//!
//! - **Type allow-list**: the declared MIME type must be one of the
//!   configured types. Parameters such as `; charset=` are ignored.
//!
//! - **Size limit**: payloads above the configured byte limit are rejected.
//!
//! - **Content sniffing**: when the leading bytes identify a known format
//!   (PDF, PNG, JPEG, GIF) that disagrees with the declared type, the upload
//!   is rejected.
//!
//! Accepted files are stored under a key built by [`object_key`].
//!
//! # Example
//!
//! ```
//! use docuapprove::upload::{Upload, UploadPolicy};
//!
//! let policy = UploadPolicy::default();
//! let upload = Upload::new("report.pdf", "application/pdf", b"%PDF-1.7".to_vec());
//! assert!(policy.validate(&upload).is_ok());
//! ```

mod naming;
mod policy;
mod sniff;

use thiserror::Error;

pub use naming::{object_key, sanitize_file_name, KEY_PREFIX};
pub use policy::{is_valid_mime, normalize_mime, UploadPolicy};
pub use sniff::sniff_content_type;

/// A file offered for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// Original file name.
    pub file_name: String,
    /// Declared MIME type.
    pub content_type: String,
    /// File contents.
    pub bytes: Vec<u8>,
    /// Optional note from the uploader.
    pub reason: Option<String>,
}

impl Upload {
    /// Create an upload without a reason.
    #[must_use]
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
            reason: None,
        }
    }

    /// Attach an uploader note. Blank notes are dropped.
    #[must_use]
    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        self
    }

    /// Size of the payload in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Reasons an upload is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// No file name was given.
    #[error("a file name is required")]
    MissingFileName,

    /// The payload is empty.
    #[error("a document is required")]
    EmptyFile,

    /// The declared type is not in the allow-list.
    #[error("unsupported file type '{found}', allowed: {}", allowed.join(", "))]
    UnsupportedType {
        /// Declared MIME type.
        found: String,
        /// Configured allow-list.
        allowed: Vec<String>,
    },

    /// The payload exceeds the size limit.
    #[error("file is {size} bytes, the limit is {max} bytes")]
    TooLarge {
        /// Actual size.
        size: u64,
        /// Configured limit.
        max: u64,
    },

    /// The bytes look like a different format than declared.
    #[error("file declared as '{declared}' but its content looks like '{detected}'")]
    ContentMismatch {
        /// Declared MIME type.
        declared: String,
        /// Type detected from magic bytes.
        detected: &'static str,
    },
}
