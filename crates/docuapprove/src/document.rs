//! Document records and review decisions.
//!
//! A [`Document`] is one user submission. Its lifecycle is a single status
//! field that an admin moves from [`DocumentStatus::Pending`] to approved or
//! declined, optionally with a suggestion for the uploader.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Review status of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentStatus {
    /// Waiting for an admin.
    Pending,
    /// Accepted by an admin.
    Approved,
    /// Sent back by an admin, usually with a suggestion.
    #[serde(alias = "Rejected")]
    Declined,
}

impl DocumentStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::Approved, Self::Declined];

    /// The canonical string form, also used in the database.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Declined => "Declined",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "declined" | "rejected" => Ok(Self::Declined),
            _ => Err(Error::UnknownStatus(s.to_string())),
        }
    }
}

/// A submitted document and its review state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Unique identifier (UUID).
    pub id: String,

    /// Original file name as uploaded.
    pub name: String,

    /// Owner's user id.
    pub user_id: String,

    /// Owner's email at upload time.
    pub user_email: String,

    /// When the file was uploaded.
    pub upload_date: DateTime<Utc>,

    /// Current review status.
    pub status: DocumentStatus,

    /// Admin feedback, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    /// Why the user uploaded the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Public URL of the stored file.
    pub url: String,

    /// Key of the file in the blob store.
    pub storage_key: String,

    /// File size in bytes.
    pub file_size: u64,

    /// MIME type of the file.
    pub file_type: String,

    /// BLAKE3 hex digest of the file bytes.
    pub content_hash: String,

    /// Record creation time.
    pub created_at: DateTime<Utc>,

    /// Last write time.
    pub updated_at: DateTime<Utc>,

    /// When an admin last decided on this document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_decision_date: Option<DateTime<Utc>>,

    /// Email of the admin who decided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_decision_by: Option<String>,
}

/// Everything needed to create a new record; the rest is defaulted.
#[derive(Debug, Clone)]
pub struct NewDocument {
    /// Original file name.
    pub name: String,
    /// Owner's user id.
    pub user_id: String,
    /// Owner's email.
    pub user_email: String,
    /// Optional uploader note.
    pub reason: Option<String>,
    /// Public URL of the stored file.
    pub url: String,
    /// Blob store key.
    pub storage_key: String,
    /// Size in bytes.
    pub file_size: u64,
    /// MIME type.
    pub file_type: String,
    /// BLAKE3 hex digest.
    pub content_hash: String,
}

impl Document {
    /// Build a fresh pending record stamped at `now`.
    #[must_use]
    pub fn create(new: NewDocument, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: new.name,
            user_id: new.user_id,
            user_email: new.user_email,
            upload_date: now,
            status: DocumentStatus::Pending,
            suggestion: None,
            reason: new.reason,
            url: new.url,
            storage_key: new.storage_key,
            file_size: new.file_size,
            file_type: new.file_type,
            content_hash: new.content_hash,
            created_at: now,
            updated_at: now,
            admin_decision_date: None,
            admin_decision_by: None,
        }
    }

    /// Compute the BLAKE3 hex digest of file bytes.
    #[must_use]
    pub fn compute_hash(bytes: &[u8]) -> String {
        blake3::hash(bytes).to_hex().to_string()
    }

    /// Check if the document still awaits review.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == DocumentStatus::Pending
    }

    /// Check if an admin has decided on the document.
    #[must_use]
    pub fn is_decided(&self) -> bool {
        !self.is_pending()
    }

    /// Check if `user_id` owns this document.
    #[must_use]
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// An admin's verdict on a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Accept, with optional feedback.
    Approve {
        /// Optional feedback.
        suggestion: Option<String>,
    },
    /// Send back; feedback is mandatory.
    Decline {
        /// Why the document was declined.
        suggestion: String,
    },
}

impl Decision {
    /// Build a decision from a status and free-text suggestion.
    ///
    /// Blank suggestions are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SuggestionRequired`] when declining without a
    /// suggestion, and [`Error::InvalidDecision`] for `Pending`.
    pub fn new(status: DocumentStatus, suggestion: Option<String>) -> Result<Self> {
        let suggestion = suggestion
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        match status {
            DocumentStatus::Approved => Ok(Self::Approve { suggestion }),
            DocumentStatus::Declined => suggestion
                .map(|suggestion| Self::Decline { suggestion })
                .ok_or(Error::SuggestionRequired),
            DocumentStatus::Pending => Err(Error::InvalidDecision {
                message: "a document cannot be moved back to Pending".to_string(),
            }),
        }
    }

    /// The status this decision sets.
    #[must_use]
    pub fn status(&self) -> DocumentStatus {
        match self {
            Self::Approve { .. } => DocumentStatus::Approved,
            Self::Decline { .. } => DocumentStatus::Declined,
        }
    }

    /// The feedback attached to this decision.
    #[must_use]
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Approve { suggestion } => suggestion.as_deref(),
            Self::Decline { suggestion } => Some(suggestion),
        }
    }
}
