//! Service configuration.
//!
//! Built-in defaults, then `config.toml`, then `DOCUAPPROVE_*` environment
//! variables, merged with figment and checked by [`Config::validate`].

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::OnceLock;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::upload::is_valid_mime;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "docuapprove";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "documents.db";

/// Default blob directory name.
const BLOB_DIR_NAME: &str = "blobs";

/// Environment variable prefix. Nested keys are separated by `__`,
/// e.g. `DOCUAPPROVE_UPLOAD__MAX_SIZE_BYTES`.
const ENV_PREFIX: &str = "DOCUAPPROVE_";

/// Everything the binary needs to run the service.
///
/// Environment variables override `~/.config/docuapprove/config.toml`, which
/// overrides the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Upload configuration.
    pub upload: UploadConfig,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// HTTP server configuration.
    pub server: ServerConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/docuapprove/documents.db`
    pub database_path: Option<PathBuf>,
    /// Directory holding uploaded files.
    /// Defaults to `~/.local/share/docuapprove/blobs`
    pub blob_dir: Option<PathBuf>,
    /// Base URL under which stored files are published.
    pub public_base_url: String,
}

/// Upload-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Accepted MIME types.
    pub allowed_types: Vec<String>,
    /// Maximum file size in bytes.
    pub max_size_bytes: u64,
}

/// Authentication configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// The email address that holds admin rights.
    pub admin_email: String,
    /// Lifetime of a login session in hours.
    pub session_ttl_hours: u32,
    /// Accounts allowed to log in.
    pub accounts: Vec<AccountConfig>,
}

/// A single login account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Login email.
    pub email: String,
    /// Hex hash produced by `docuapprove accounts hash-password`.
    pub password_hash: String,
    /// Stable user id. Derived from the email when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Display name. `"Unknown"` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub bind_address: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            blob_dir: None,
            public_base_url: "/blobs".to_string(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_types: default_allowed_types(),
            max_size_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_email: "admin@example.com".to_string(),
            session_ttl_hours: 12,
            accounts: Vec::new(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Default accepted MIME types.
fn default_allowed_types() -> Vec<String> {
    vec![
        "application/pdf".to_string(),
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/gif".to_string(),
    ]
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex is valid"))
}

fn hash_pattern() -> &'static Regex {
    static HASH: OnceLock<Regex> = OnceLock::new();
    HASH.get_or_init(|| Regex::new(r"^[0-9a-f]{64}$").expect("static regex is valid"))
}

/// Check that a string looks like an email address.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

impl Config {
    /// Load from the default config file and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load using `config_path` instead of the default file when given.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/docuapprove/config.toml`.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// `<local data dir>/docuapprove`, home of the database and blobs.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Reject settings the service cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.upload.max_size_bytes == 0 {
            return Err(Error::config("upload.max_size_bytes must be greater than 0"));
        }

        if self.upload.allowed_types.is_empty() {
            return Err(Error::config("upload.allowed_types must not be empty"));
        }

        for mime in &self.upload.allowed_types {
            if !is_valid_mime(mime) {
                return Err(Error::config(format!("invalid MIME type: {mime}")));
            }
        }

        if !is_valid_email(&self.auth.admin_email) {
            return Err(Error::config(format!(
                "invalid admin email: {}",
                self.auth.admin_email
            )));
        }

        if self.auth.session_ttl_hours == 0 {
            return Err(Error::config("auth.session_ttl_hours must be greater than 0"));
        }

        let mut seen = HashSet::new();
        for account in &self.auth.accounts {
            if !is_valid_email(&account.email) {
                return Err(Error::config(format!(
                    "invalid account email: {}",
                    account.email
                )));
            }
            if !seen.insert(account.email.to_ascii_lowercase()) {
                return Err(Error::config(format!(
                    "duplicate account email: {}",
                    account.email
                )));
            }
            if !hash_pattern().is_match(&account.password_hash) {
                return Err(Error::config(format!(
                    "password_hash for {} must be 64 lowercase hex characters",
                    account.email
                )));
            }
        }

        if self.server.bind_address.parse::<std::net::IpAddr>().is_err() {
            return Err(Error::config(format!(
                "invalid server.bind_address: {}",
                self.server.bind_address
            )));
        }

        Ok(())
    }

    /// Database file, falling back to the data directory.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Blob root, falling back to the data directory.
    #[must_use]
    pub fn blob_dir(&self) -> PathBuf {
        self.storage
            .blob_dir
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(BLOB_DIR_NAME))
    }

    /// Get the session lifetime.
    #[must_use]
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.auth.session_ttl_hours))
    }

    /// Get the socket address to serve on.
    ///
    /// # Errors
    ///
    /// Returns an error if the bind address is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip = self
            .server
            .bind_address
            .parse::<std::net::IpAddr>()
            .map_err(|e| Error::config(format!("invalid server.bind_address: {e}")))?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}
