//! `SQLite` schema definitions for docuapprove.
//!
//! Timestamps are stored as RFC 3339 UTC strings with a fixed microsecond
//! precision so that text ordering matches time ordering.

/// SQL statement to create the documents table.
pub const CREATE_DOCUMENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    user_id TEXT NOT NULL,
    user_email TEXT NOT NULL,
    upload_date TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'Pending',
    suggestion TEXT,
    reason TEXT,
    url TEXT NOT NULL,
    storage_key TEXT NOT NULL,
    file_size INTEGER NOT NULL,
    file_type TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    admin_decision_date TEXT,
    admin_decision_by TEXT
)
";

/// Index for the per-user status page.
pub const CREATE_USER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_documents_user ON documents(user_id, created_at DESC)
";

/// Index for the admin review queue.
pub const CREATE_STATUS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_documents_status ON documents(status, created_at DESC)
";

/// Index for newest-first listings.
pub const CREATE_CREATED_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_documents_created ON documents(created_at DESC)
";

/// SQL statement to create the sessions table.
///
/// Only the BLAKE3 hash of a bearer token is stored.
pub const CREATE_SESSIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    email TEXT NOT NULL,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
)
";

/// Index for expiry pruning.
pub const CREATE_SESSION_EXPIRY_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at)
";

/// Index for revoking every session of a user.
pub const CREATE_SESSION_USER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_DOCUMENTS_TABLE,
    CREATE_USER_INDEX,
    CREATE_STATUS_INDEX,
    CREATE_CREATED_INDEX,
    CREATE_SESSIONS_TABLE,
    CREATE_SESSION_EXPIRY_INDEX,
    CREATE_SESSION_USER_INDEX,
    CREATE_METADATA_TABLE,
];
