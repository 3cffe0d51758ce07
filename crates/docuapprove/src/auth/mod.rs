//! Identity and access control.
//!
//! Accounts come from configuration through an [`AccountDirectory`]. A
//! successful login opens a session tracked by the [`SessionManager`]; every
//! authenticated request resolves its bearer token back into an
//! [`Identity`].
//!
//! Access rules are simple: an admin may see and act on every document, any
//! other user only on their own.

mod accounts;
mod session;

use serde::Serialize;

use crate::document::Document;
use crate::error::{Error, Result};

pub use accounts::{default_user_id, hash_password, AccountDirectory, UNKNOWN_USERNAME};
pub use session::{hash_token, Session, SessionManager};

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Stable user id; owns documents.
    pub user_id: String,
    /// Login email.
    pub email: String,
    /// Display name.
    pub username: String,
    /// Whether the caller is the configured admin.
    pub is_admin: bool,
}

impl Identity {
    /// Check if the caller may see `doc`.
    #[must_use]
    pub fn can_view(&self, doc: &Document) -> bool {
        self.is_admin || doc.is_owned_by(&self.user_id)
    }

    /// Check if the caller may delete `doc`.
    ///
    /// Owners can withdraw a document until it has been decided on.
    #[must_use]
    pub fn can_delete(&self, doc: &Document) -> bool {
        self.is_admin || (doc.is_owned_by(&self.user_id) && doc.is_pending())
    }
}

/// Fail with [`Error::Forbidden`] unless `identity` is the admin.
///
/// # Errors
///
/// Returns [`Error::Forbidden`] for non-admin callers.
pub fn require_admin(identity: &Identity) -> Result<()> {
    if identity.is_admin {
        Ok(())
    } else {
        Err(Error::forbidden("admin access required"))
    }
}

/// Fail with [`Error::Forbidden`] unless `identity` may see `doc`.
///
/// # Errors
///
/// Returns [`Error::Forbidden`] when the caller neither owns the document
/// nor is the admin.
pub fn ensure_can_view(identity: &Identity, doc: &Document) -> Result<()> {
    if identity.can_view(doc) {
        Ok(())
    } else {
        Err(Error::forbidden("you do not have access to this document"))
    }
}
