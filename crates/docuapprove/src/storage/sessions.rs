//! Session rows.
//!
//! Only a hash of each bearer token is stored.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use tracing::debug;

use super::{format_timestamp, parse_timestamp, Storage};
use crate::error::Result;

/// A persisted login session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// BLAKE3 hex digest of the bearer token.
    pub token_hash: String,
    /// User the session belongs to.
    pub user_id: String,
    /// Email the user logged in with.
    pub email: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session stops being valid.
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Check if the session is expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl Storage {
    /// Insert a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_session(&self, session: &SessionRecord) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO sessions (token_hash, user_id, email, created_at, expires_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                session.token_hash,
                session.user_id,
                session.email,
                format_timestamp(session.created_at),
                format_timestamp(session.expires_at),
            ],
        )?;
        debug!(user_id = %session.user_id, "Inserted session");
        Ok(())
    }

    /// Look up a session by token hash. Expired sessions are still returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_session(&self, token_hash: &str) -> Result<Option<SessionRecord>> {
        let session = self
            .conn
            .query_row(
                r"
                SELECT token_hash, user_id, email, created_at, expires_at
                FROM sessions WHERE token_hash = ?1
                ",
                [token_hash],
                |row| {
                    Ok(SessionRecord {
                        token_hash: row.get(0)?,
                        user_id: row.get(1)?,
                        email: row.get(2)?,
                        created_at: parse_timestamp(3, &row.get::<_, String>(3)?)?,
                        expires_at: parse_timestamp(4, &row.get::<_, String>(4)?)?,
                    })
                },
            )
            .optional()?;
        Ok(session)
    }

    /// Delete one session. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_session(&self, token_hash: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM sessions WHERE token_hash = ?1", [token_hash])?;
        Ok(affected > 0)
    }

    /// Delete every session of a user. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_sessions_for_user(&self, user_id: &str) -> Result<usize> {
        let affected = self
            .conn
            .execute("DELETE FROM sessions WHERE user_id = ?1", [user_id])?;
        Ok(affected)
    }

    /// Delete sessions that expired at or before `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn prune_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        let affected = self.conn.execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            [format_timestamp(now)],
        )?;
        if affected > 0 {
            debug!(count = affected, "Pruned expired sessions");
        }
        Ok(affected)
    }

    /// Count sessions still valid at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_active_sessions(&self, now: DateTime<Utc>) -> Result<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sessions WHERE expires_at > ?1",
            [format_timestamp(now)],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
