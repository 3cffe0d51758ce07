//! Configured accounts.

use crate::config::{AccountConfig, AuthConfig};
use crate::error::{Error, Result};

use super::Identity;

/// Display name used when an account has none configured.
pub const UNKNOWN_USERNAME: &str = "Unknown";

/// Key-derivation context for password hashes.
const PASSWORD_CONTEXT: &str = "docuapprove 2024-01-01 account password v1";

/// Hash a password for storage in the config file.
///
/// The email is lowercased and mixed in, so the same password yields
/// different hashes for different accounts.
///
/// This is a single BLAKE3 key-derivation pass with no work factor. It keeps
/// plaintext out of the config file, but anyone holding a leaked config can
/// test guesses at hashing speed, so weak passwords fall quickly. Treat the
/// config file as a secret and use long random passwords.
#[must_use]
pub fn hash_password(email: &str, password: &str) -> String {
    derive(email, password).to_hex().to_string()
}

fn derive(email: &str, password: &str) -> blake3::Hash {
    let material = format!("{}\0{}", email.to_ascii_lowercase(), password);
    blake3::Hash::from(blake3::derive_key(PASSWORD_CONTEXT, material.as_bytes()))
}

/// User id assigned to an account that does not configure one.
///
/// The first 16 bytes of the BLAKE3 hash of the lowercased email, in hex.
#[must_use]
pub fn default_user_id(email: &str) -> String {
    let hash = blake3::hash(email.to_ascii_lowercase().as_bytes());
    hash.as_bytes()[..16]
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Known accounts and the admin address.
#[derive(Debug, Clone)]
pub struct AccountDirectory {
    accounts: Vec<AccountConfig>,
    admin_email: String,
}

impl AccountDirectory {
    /// Build a directory from the `[auth]` config section.
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            accounts: config.accounts.clone(),
            admin_email: config.admin_email.clone(),
        }
    }

    /// Configured accounts, in config order.
    #[must_use]
    pub fn accounts(&self) -> &[AccountConfig] {
        &self.accounts
    }

    /// The admin address.
    #[must_use]
    pub fn admin_email(&self) -> &str {
        &self.admin_email
    }

    /// Check if `email` is the admin address. Case-insensitive.
    #[must_use]
    pub fn is_admin(&self, email: &str) -> bool {
        email.eq_ignore_ascii_case(&self.admin_email)
    }

    fn find(&self, email: &str) -> Option<&AccountConfig> {
        self.accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
    }

    /// Display name for `email`, or [`UNKNOWN_USERNAME`].
    #[must_use]
    pub fn username_for_email(&self, email: &str) -> String {
        self.find(email)
            .and_then(|a| a.username.clone())
            .unwrap_or_else(|| UNKNOWN_USERNAME.to_string())
    }

    /// Check an email/password pair.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentials`] for an unknown email or a wrong
    /// password. The two cases are indistinguishable to the caller.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Identity> {
        let account = self.find(email.trim()).ok_or(Error::InvalidCredentials)?;
        let stored =
            blake3::Hash::from_hex(&account.password_hash).map_err(|_| Error::InvalidCredentials)?;

        // blake3::Hash equality is constant-time
        if derive(&account.email, password) != stored {
            return Err(Error::InvalidCredentials);
        }

        Ok(self.identity_of(account))
    }

    /// Identity of a configured account, without checking a password.
    ///
    /// The admin address resolves even when it has no account entry.
    #[must_use]
    pub fn identity_for_email(&self, email: &str) -> Option<Identity> {
        match self.find(email) {
            Some(account) => Some(self.identity_of(account)),
            None if self.is_admin(email) => Some(Identity {
                user_id: default_user_id(email),
                email: self.admin_email.clone(),
                username: UNKNOWN_USERNAME.to_string(),
                is_admin: true,
            }),
            None => None,
        }
    }

    /// Identity of the admin, for operator tooling.
    #[must_use]
    pub fn admin_identity(&self) -> Identity {
        let mut identity = self
            .find(&self.admin_email)
            .map(|account| self.identity_of(account))
            .unwrap_or_else(|| Identity {
                user_id: default_user_id(&self.admin_email),
                email: self.admin_email.clone(),
                username: UNKNOWN_USERNAME.to_string(),
                is_admin: true,
            });
        identity.is_admin = true;
        identity
    }

    fn identity_of(&self, account: &AccountConfig) -> Identity {
        Identity {
            user_id: account
                .user_id
                .clone()
                .unwrap_or_else(|| default_user_id(&account.email)),
            email: account.email.clone(),
            username: account
                .username
                .clone()
                .unwrap_or_else(|| UNKNOWN_USERNAME.to_string()),
            is_admin: self.is_admin(&account.email),
        }
    }
}
