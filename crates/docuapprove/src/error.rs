//! Error type shared by the library.
//!
//! Variants are grouped by the layer that raises them. The HTTP layer maps
//! them to status codes through the `is_*` predicates and a few direct matches.

use std::path::PathBuf;
use thiserror::Error;

use crate::upload::UploadError;

/// The main error type for docuapprove operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Auth Errors ===
    /// No session was presented, or the token is unknown.
    #[error("authentication required")]
    Unauthenticated,

    /// The session exists but has expired.
    #[error("session expired, please log in again")]
    SessionExpired,

    /// Email/password pair did not match a configured account.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The caller is authenticated but not allowed to do this.
    #[error("forbidden: {reason}")]
    Forbidden {
        /// Why access was denied.
        reason: String,
    },

    // === Document Errors ===
    /// No document record with this id.
    #[error("document not found: {id}")]
    DocumentNotFound {
        /// The requested document id.
        id: String,
    },

    /// Declining a document requires feedback for the uploader.
    #[error("a suggestion is required when declining a document")]
    SuggestionRequired,

    /// The requested decision is not a valid admin action.
    #[error("invalid decision: {message}")]
    InvalidDecision {
        /// Description of the problem.
        message: String,
    },

    /// A status string could not be parsed.
    #[error("unknown document status: {0}")]
    UnknownStatus(String),

    // === Upload Errors ===
    /// The upload failed validation.
    #[error("upload rejected: {0}")]
    Upload(#[from] UploadError),

    // === Blob Storage Errors ===
    /// The blob store refused or failed an operation.
    #[error("blob storage error for '{key}': {message}")]
    Blob {
        /// Key of the object involved.
        key: String,
        /// Description of what went wrong.
        message: String,
    },

    /// The requested blob does not exist.
    #[error("blob not found: {key}")]
    BlobNotFound {
        /// Key of the missing object.
        key: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for docuapprove operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a forbidden error with a reason.
    #[must_use]
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    /// Create a document-not-found error.
    #[must_use]
    pub fn document_not_found(id: impl Into<String>) -> Self {
        Self::DocumentNotFound { id: id.into() }
    }

    /// Create a blob storage error.
    #[must_use]
    pub fn blob(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Blob {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a config validation error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Check if this error means the caller must (re)authenticate.
    #[must_use]
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::Unauthenticated | Self::SessionExpired | Self::InvalidCredentials
        )
    }

    /// Check if this error is a permission issue.
    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }

    /// Check if this error refers to something that does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DocumentNotFound { .. } | Self::BlobNotFound { .. })
    }

    /// Check if this error was caused by bad caller input.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::SuggestionRequired
                | Self::InvalidDecision { .. }
                | Self::UnknownStatus(_)
                | Self::Upload(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Unauthenticated;
        assert_eq!(err.to_string(), "authentication required");

        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");
    }

    #[test]
    fn test_is_auth_error() {
        assert!(Error::Unauthenticated.is_auth_error());
        assert!(Error::SessionExpired.is_auth_error());
        assert!(Error::InvalidCredentials.is_auth_error());
        assert!(!Error::forbidden("nope").is_auth_error());
    }

    #[test]
    fn test_is_forbidden() {
        let err = Error::forbidden("admin access required");
        assert!(err.is_forbidden());
        assert!(err.to_string().contains("admin access required"));
        assert!(!Error::Unauthenticated.is_forbidden());
    }

    #[test]
    fn test_document_not_found() {
        let err = Error::document_not_found("abc-123");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "document not found: abc-123");
    }

    #[test]
    fn test_blob_not_found_is_not_found() {
        let err = Error::BlobNotFound {
            key: "documents/u/x.pdf".to_string(),
        };
        assert!(err.is_not_found());
        assert!(err.to_string().contains("documents/u/x.pdf"));
    }

    #[test]
    fn test_blob_error_display() {
        let err = Error::blob("documents/u/x.pdf", "disk full");
        let msg = err.to_string();
        assert!(msg.contains("documents/u/x.pdf"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn test_invalid_input_errors() {
        assert!(Error::SuggestionRequired.is_invalid_input());
        assert!(Error::UnknownStatus("Maybe".to_string()).is_invalid_input());
        assert!(Error::Upload(UploadError::EmptyFile).is_invalid_input());
        assert!(!Error::internal("x").is_invalid_input());
    }

    #[test]
    fn test_from_upload_error() {
        let err: Error = UploadError::TooLarge {
            size: 20,
            max: 10,
        }
        .into();
        assert!(matches!(err, Error::Upload(UploadError::TooLarge { .. })));
        assert!(err.to_string().starts_with("upload rejected"));
    }

    #[test]
    fn test_library_errors_convert() {
        let io: Error = std::io::Error::other("disk gone").into();
        assert!(matches!(io, Error::Io(_)));

        let sql: Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(sql, Error::DatabaseQuery(_)));
        assert!(!sql.is_not_found());

        let json: Error = serde_json::from_str::<u8>("[]").unwrap_err().into();
        assert!(matches!(json, Error::Json(_)));
    }

    #[test]
    fn test_blob_dir_creation_names_path() {
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/srv/docuapprove/blobs"),
            source: std::io::Error::other("read-only file system"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/srv/docuapprove/blobs"));
        assert!(msg.contains("read-only"));
    }
}
