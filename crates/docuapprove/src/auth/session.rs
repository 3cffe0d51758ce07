//! Bearer-token sessions.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::{AccountDirectory, Identity};
use crate::error::{Error, Result};
use crate::storage::{SessionRecord, SharedStorage};

/// Hash a bearer token for storage and lookup.
#[must_use]
pub fn hash_token(token: &str) -> String {
    blake3::hash(token.as_bytes()).to_hex().to_string()
}

/// A freshly opened session. The token is only ever visible here.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    /// Opaque bearer token.
    pub token: String,
    /// When the token stops working.
    pub expires_at: DateTime<Utc>,
    /// Who logged in.
    pub user: Identity,
}

/// Issues, resolves and revokes sessions.
#[derive(Debug, Clone)]
pub struct SessionManager {
    storage: SharedStorage,
    directory: Arc<AccountDirectory>,
    ttl: Duration,
}

impl SessionManager {
    /// Create a session manager.
    #[must_use]
    pub fn new(storage: SharedStorage, directory: Arc<AccountDirectory>, ttl: Duration) -> Self {
        Self {
            storage,
            directory,
            ttl,
        }
    }

    /// The account directory sessions are checked against.
    #[must_use]
    pub fn directory(&self) -> &AccountDirectory {
        &self.directory
    }

    /// Check credentials and open a session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentials`] on a bad email/password, or a
    /// storage error.
    pub fn login(&self, email: &str, password: &str) -> Result<Session> {
        self.login_at(email, password, Utc::now())
    }

    fn login_at(&self, email: &str, password: &str, now: DateTime<Utc>) -> Result<Session> {
        let identity = self.directory.authenticate(email, password)?;
        let token = uuid::Uuid::new_v4().simple().to_string();
        let record = SessionRecord {
            token_hash: hash_token(&token),
            user_id: identity.user_id.clone(),
            email: identity.email.clone(),
            created_at: now,
            expires_at: now + self.ttl,
        };
        self.storage.with(|s| s.insert_session(&record))?;

        info!(user_id = %identity.user_id, admin = identity.is_admin, "User logged in");
        Ok(Session {
            token,
            expires_at: record.expires_at,
            user: identity,
        })
    }

    /// Resolve a bearer token into the caller's identity.
    ///
    /// An expired session is deleted on sight.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`] for unknown tokens or accounts that
    /// no longer exist, and [`Error::SessionExpired`] for expired ones.
    pub fn resolve(&self, token: &str) -> Result<Identity> {
        self.resolve_at(token, Utc::now())
    }

    fn resolve_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity> {
        let token_hash = hash_token(token);
        let record = self
            .storage
            .with(|s| s.get_session(&token_hash))?
            .ok_or(Error::Unauthenticated)?;

        if record.is_expired(now) {
            self.storage.with(|s| s.delete_session(&token_hash))?;
            debug!(user_id = %record.user_id, "Session expired");
            return Err(Error::SessionExpired);
        }

        self.directory
            .identity_for_email(&record.email)
            .filter(|identity| identity.user_id == record.user_id)
            .ok_or(Error::Unauthenticated)
    }

    /// Revoke a session. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn logout(&self, token: &str) -> Result<bool> {
        let token_hash = hash_token(token);
        let removed = self.storage.with(|s| s.delete_session(&token_hash))?;
        if removed {
            info!("Session revoked");
        }
        Ok(removed)
    }

    /// Revoke every session of a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn logout_everywhere(&self, user_id: &str) -> Result<usize> {
        self.storage.with(|s| s.delete_sessions_for_user(user_id))
    }

    /// Delete expired sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn prune_expired(&self) -> Result<usize> {
        self.storage.with(|s| s.prune_expired_sessions(Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::accounts::tests::test_auth_config;
    use crate::storage::tests::create_test_storage;

    fn manager() -> SessionManager {
        SessionManager::new(
            SharedStorage::new(create_test_storage()),
            Arc::new(AccountDirectory::from_config(&test_auth_config())),
            Duration::hours(12),
        )
    }

    #[test]
    fn test_login_and_resolve() {
        let sessions = manager();
        let session = sessions.login("student@example.com", "student-pass").unwrap();

        assert_eq!(session.user.user_id, "user123");
        assert!(session.expires_at > Utc::now());

        let identity = sessions.resolve(&session.token).unwrap();
        assert_eq!(identity, session.user);
    }

    #[test]
    fn test_login_bad_password() {
        let err = manager()
            .login("student@example.com", "wrong")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials));
    }

    #[test]
    fn test_token_is_not_stored_in_clear() {
        let sessions = manager();
        let session = sessions.login("student@example.com", "student-pass").unwrap();

        let raw = sessions.storage.with(|s| s.get_session(&session.token)).unwrap();
        assert!(raw.is_none());
        let hashed = sessions
            .storage
            .with(|s| s.get_session(&hash_token(&session.token)))
            .unwrap();
        assert!(hashed.is_some());
    }

    #[test]
    fn test_resolve_unknown_token() {
        let err = manager().resolve("not-a-token").unwrap_err();
        assert!(matches!(err, Error::Unauthenticated));
    }

    #[test]
    fn test_resolve_expired_session() {
        let sessions = manager();
        let past = Utc::now() - Duration::hours(13);
        let session = sessions
            .login_at("student@example.com", "student-pass", past)
            .unwrap();

        let err = sessions.resolve(&session.token).unwrap_err();
        assert!(matches!(err, Error::SessionExpired));

        // expired sessions are removed on first sight
        let err = sessions.resolve(&session.token).unwrap_err();
        assert!(matches!(err, Error::Unauthenticated));
    }

    #[test]
    fn test_resolve_account_removed() {
        let sessions = manager();
        let session = sessions.login("student@example.com", "student-pass").unwrap();

        let restricted = SessionManager::new(
            sessions.storage.clone(),
            Arc::new(AccountDirectory::from_config(&crate::config::AuthConfig::default())),
            Duration::hours(12),
        );
        let err = restricted.resolve(&session.token).unwrap_err();
        assert!(matches!(err, Error::Unauthenticated));
    }

    #[test]
    fn test_logout() {
        let sessions = manager();
        let session = sessions.login("student@example.com", "student-pass").unwrap();

        assert!(sessions.logout(&session.token).unwrap());
        assert!(!sessions.logout(&session.token).unwrap());
        assert!(sessions.resolve(&session.token).is_err());
    }

    #[test]
    fn test_logout_everywhere() {
        let sessions = manager();
        let a = sessions.login("student@example.com", "student-pass").unwrap();
        let b = sessions.login("student@example.com", "student-pass").unwrap();
        assert_ne!(a.token, b.token);

        assert_eq!(sessions.logout_everywhere("user123").unwrap(), 2);
        assert!(sessions.resolve(&a.token).is_err());
    }

    #[test]
    fn test_prune_expired() {
        let sessions = manager();
        let past = Utc::now() - Duration::days(2);
        sessions
            .login_at("student@example.com", "student-pass", past)
            .unwrap();
        sessions.login("student@example.com", "student-pass").unwrap();

        assert_eq!(sessions.prune_expired().unwrap(), 1);
        assert_eq!(sessions.prune_expired().unwrap(), 0);
    }

    #[test]
    fn test_session_serializes() {
        let session = manager()
            .login("student@example.com", "student-pass")
            .unwrap();
        let json = serde_json::to_value(&session).unwrap();
        assert!(json.get("expires_at").is_some());
        assert_eq!(json["user"]["userId"], "user123");
    }
}
