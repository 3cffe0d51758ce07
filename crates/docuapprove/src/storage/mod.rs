//! Storage layer for docuapprove.
//!
//! This module provides `SQLite`-based persistent storage for document
//! records and login sessions. Writes are single statements; there is no
//! optimistic locking, the last writer wins.

pub mod migrations;
pub mod schema;
mod sessions;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info};

use crate::document::{Decision, Document, DocumentStatus};
use crate::error::{Error, Result};

pub use sessions::SessionRecord;

/// Column list shared by every document query, in `row_to_document` order.
const DOCUMENT_COLUMNS: &str = "id, name, user_id, user_email, upload_date, status, \
     suggestion, reason, url, storage_key, file_size, file_type, content_hash, \
     created_at, updated_at, admin_decision_date, admin_decision_by";

/// Format a timestamp for storage.
pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp, reporting the column on failure.
pub(crate) fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_optional_timestamp(
    idx: usize,
    value: Option<String>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_timestamp(idx, &v)).transpose()
}

fn limit_to_i64(limit: Option<usize>) -> i64 {
    limit.map_or(i64::MAX, |l| i64::try_from(l).unwrap_or(i64::MAX))
}

/// Filters for listing documents. Empty filters list everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    /// Only documents in this status.
    pub status: Option<DocumentStatus>,
    /// Only documents owned by this user.
    pub user_id: Option<String>,
    /// Only documents whose name contains this text (case-insensitive).
    pub name_contains: Option<String>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

impl DocumentFilter {
    /// Filter by status.
    #[must_use]
    pub fn status(mut self, status: DocumentStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Filter by owner.
    #[must_use]
    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Filter by name substring.
    #[must_use]
    pub fn name_contains(mut self, text: impl Into<String>) -> Self {
        self.name_contains = Some(text.into());
        self
    }

    /// Cap the number of results.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Storage engine for document records and sessions.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw connection access for tests that need to corrupt state.
    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Insert a new document record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails, including when a
    /// record with the same id already exists.
    pub fn insert_document(&self, doc: &Document) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO documents ({DOCUMENT_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"
            ),
            params![
                doc.id,
                doc.name,
                doc.user_id,
                doc.user_email,
                format_timestamp(doc.upload_date),
                doc.status.as_str(),
                doc.suggestion,
                doc.reason,
                doc.url,
                doc.storage_key,
                i64::try_from(doc.file_size).unwrap_or(i64::MAX),
                doc.file_type,
                doc.content_hash,
                format_timestamp(doc.created_at),
                format_timestamp(doc.updated_at),
                doc.admin_decision_date.map(format_timestamp),
                doc.admin_decision_by,
            ],
        )?;

        debug!(document_id = %doc.id, "Inserted document");
        Ok(())
    }

    /// Get a document by its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_document(&self, id: &str) -> Result<Option<Document>> {
        let doc = self
            .conn
            .query_row(
                &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1"),
                [id],
                Self::row_to_document,
            )
            .optional()?;
        Ok(doc)
    }

    /// List documents matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_documents(&self, filter: &DocumentFilter) -> Result<Vec<Document>> {
        let mut clauses = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(status) = filter.status {
            values.push(Value::Text(status.as_str().to_string()));
            clauses.push(format!("status = ?{}", values.len()));
        }
        if let Some(user_id) = &filter.user_id {
            values.push(Value::Text(user_id.clone()));
            clauses.push(format!("user_id = ?{}", values.len()));
        }
        if let Some(text) = &filter.name_contains {
            // SQLite's lower() only folds ASCII
            values.push(Value::Text(text.to_ascii_lowercase()));
            clauses.push(format!("instr(lower(name), ?{}) > 0", values.len()));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        values.push(Value::Integer(limit_to_i64(filter.limit)));
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents {where_clause} \
             ORDER BY created_at DESC, id LIMIT ?{}",
            values.len()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let docs = stmt
            .query_map(params_from_iter(values), Self::row_to_document)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(docs)
    }

    /// List every document owned by `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_by_user(&self, user_id: &str) -> Result<Vec<Document>> {
        self.list_documents(&DocumentFilter::default().user(user_id))
    }

    /// List every document in `status`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_by_status(&self, status: DocumentStatus) -> Result<Vec<Document>> {
        self.list_documents(&DocumentFilter::default().status(status))
    }

    /// Search documents by name, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn search_by_name(&self, query: &str, limit: usize) -> Result<Vec<Document>> {
        self.list_documents(&DocumentFilter::default().name_contains(query).limit(limit))
    }

    /// Apply an admin decision to a document.
    ///
    /// Returns the updated record, or `None` if no document has this id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn record_decision(
        &self,
        id: &str,
        decision: &Decision,
        decided_by: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Document>> {
        let at = format_timestamp(at);
        let affected = self.conn.execute(
            r"
            UPDATE documents
            SET status = ?2, suggestion = ?3, admin_decision_date = ?4,
                admin_decision_by = ?5, updated_at = ?4
            WHERE id = ?1
            ",
            params![
                id,
                decision.status().as_str(),
                decision.suggestion(),
                at,
                decided_by,
            ],
        )?;

        if affected == 0 {
            return Ok(None);
        }

        debug!(document_id = %id, status = %decision.status(), "Recorded decision");
        self.get_document(id)
    }

    /// Delete a document record.
    ///
    /// Returns `true` if a record was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_document(&self, id: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM documents WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    /// Count documents in total.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Count documents per status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_by_status(&self) -> Result<StatusCounts> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM documents GROUP BY status")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            match status.parse::<DocumentStatus>() {
                Ok(DocumentStatus::Pending) => counts.pending += count,
                Ok(DocumentStatus::Approved) => counts.approved += count,
                Ok(DocumentStatus::Declined) => counts.declined += count,
                Err(_) => tracing::warn!(status = %status, "Ignoring unknown status in database"),
            }
        }
        Ok(counts)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let (total_documents, total_bytes, oldest, newest): (
            i64,
            i64,
            Option<String>,
            Option<String>,
        ) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(file_size), 0), MIN(upload_date), MAX(upload_date) \
             FROM documents",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;

        let oldest_upload = parse_optional_timestamp(2, oldest)?;
        let newest_upload = parse_optional_timestamp(3, newest)?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_documents,
            total_bytes: u64::try_from(total_bytes).unwrap_or(0),
            oldest_upload,
            newest_upload,
            by_status: self.count_by_status()?,
            active_sessions: self.count_active_sessions(Utc::now())?,
            db_size_bytes,
        })
    }

    /// Convert a database row to a Document.
    fn row_to_document(row: &rusqlite::Row) -> rusqlite::Result<Document> {
        let status_str: String = row.get(5)?;
        let status = status_str.parse::<DocumentStatus>().map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                Type::Text,
                format!("unknown document status: {status_str}").into(),
            )
        })?;
        let file_size: i64 = row.get(10)?;

        Ok(Document {
            id: row.get(0)?,
            name: row.get(1)?,
            user_id: row.get(2)?,
            user_email: row.get(3)?,
            upload_date: parse_timestamp(4, &row.get::<_, String>(4)?)?,
            status,
            suggestion: row.get(6)?,
            reason: row.get(7)?,
            url: row.get(8)?,
            storage_key: row.get(9)?,
            file_size: u64::try_from(file_size).unwrap_or(0),
            file_type: row.get(11)?,
            content_hash: row.get(12)?,
            created_at: parse_timestamp(13, &row.get::<_, String>(13)?)?,
            updated_at: parse_timestamp(14, &row.get::<_, String>(14)?)?,
            admin_decision_date: parse_optional_timestamp(15, row.get(15)?)?,
            admin_decision_by: row.get(16)?,
        })
    }
}

/// Number of documents in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    /// Awaiting review.
    pub pending: i64,
    /// Approved.
    pub approved: i64,
    /// Declined.
    pub declined: i64,
}

impl StatusCounts {
    /// Total across all statuses.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.pending + self.approved + self.declined
    }

    /// Count for one status.
    #[must_use]
    pub fn get(&self, status: DocumentStatus) -> i64 {
        match status {
            DocumentStatus::Pending => self.pending,
            DocumentStatus::Approved => self.approved,
            DocumentStatus::Declined => self.declined,
        }
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Total number of document records.
    pub total_documents: i64,
    /// Sum of all file sizes in bytes.
    pub total_bytes: u64,
    /// Earliest upload date.
    pub oldest_upload: Option<DateTime<Utc>>,
    /// Latest upload date.
    pub newest_upload: Option<DateTime<Utc>>,
    /// Counts per status.
    pub by_status: StatusCounts,
    /// Sessions that have not expired yet.
    pub active_sessions: i64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

/// A [`Storage`] shared between request handlers.
///
/// `rusqlite::Connection` is not `Sync`; access is serialized through a
/// mutex. Closures passed to [`SharedStorage::with`] must not block on
/// anything other than the database.
///
/// [`SharedStorage::with`] runs on the calling thread, so from async code it
/// blocks a runtime worker for the length of the query. Single-row reads and
/// short indexed listings are fine there; writes issued from async code go
/// through [`SharedStorage::with_blocking`], which moves them to tokio's
/// blocking pool. Requests still queue on the one connection.
#[derive(Debug, Clone)]
pub struct SharedStorage {
    inner: Arc<Mutex<Storage>>,
}

impl SharedStorage {
    /// Wrap a storage instance.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self {
            inner: Arc::new(Mutex::new(storage)),
        }
    }

    /// Run `f` with exclusive access to the storage.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or an internal error if a previous
    /// holder panicked.
    pub fn with<T>(&self, f: impl FnOnce(&Storage) -> Result<T>) -> Result<T> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| Error::internal("storage lock poisoned"))?;
        f(&guard)
    }

    /// Run `f` like [`SharedStorage::with`] on tokio's blocking pool.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or an internal error if the lock is
    /// poisoned or the blocking task panicked.
    pub async fn with_blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Storage) -> Result<T> + Send + 'static,
    {
        let shared = self.clone();
        tokio::task::spawn_blocking(move || shared.with(f))
            .await
            .map_err(|e| Error::internal(format!("storage task failed: {e}")))?
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::document::NewDocument;
    use chrono::Duration;

    #[tokio::test]
    async fn test_with_blocking_sees_same_database() {
        let shared = SharedStorage::new(create_test_storage());
        let doc = create_test_document("a.pdf", "u1", Utc::now());
        let id = doc.id.clone();

        shared
            .with_blocking(move |s| s.insert_document(&doc))
            .await
            .unwrap();

        assert!(shared.with(|s| s.get_document(&id)).unwrap().is_some());
        let count = shared.with_blocking(|s| s.count()).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_with_blocking_propagates_errors() {
        let shared = SharedStorage::new(create_test_storage());
        let err = shared
            .with_blocking(|_| Err::<(), _>(Error::internal("boom")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    pub(crate) fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    pub(crate) fn create_test_document(name: &str, user_id: &str, at: DateTime<Utc>) -> Document {
        let bytes = format!("%PDF-1.7 {name}");
        Document::create(
            NewDocument {
                name: name.to_string(),
                user_id: user_id.to_string(),
                user_email: format!("{user_id}@example.com"),
                reason: None,
                url: format!("/blobs/documents/{user_id}/{name}"),
                storage_key: format!("documents/{user_id}/{name}"),
                file_size: bytes.len() as u64,
                file_type: "application/pdf".to_string(),
                content_hash: Document::compute_hash(bytes.as_bytes()),
            },
            at,
        )
    }

    fn approve() -> Decision {
        Decision::new(DocumentStatus::Approved, Some("Excellent work".to_string())).unwrap()
    }

    #[test]
    fn test_open_in_memory() {
        assert!(Storage::open_in_memory().is_ok());
    }

    #[test]
    fn test_insert_and_get() {
        let storage = create_test_storage();
        let doc = create_test_document("Q1_Financial_Report.pdf", "user123", Utc::now());

        storage.insert_document(&doc).unwrap();
        let retrieved = storage.get_document(&doc.id).unwrap().unwrap();

        assert_eq!(retrieved.name, "Q1_Financial_Report.pdf");
        assert_eq!(retrieved.status, DocumentStatus::Pending);
        assert_eq!(retrieved.file_size, doc.file_size);
        assert_eq!(retrieved.content_hash, doc.content_hash);
    }

    #[test]
    fn test_round_trip_preserves_timestamps_to_microseconds() {
        let storage = create_test_storage();
        let doc = create_test_document("a.pdf", "u1", Utc::now());
        storage.insert_document(&doc).unwrap();

        let retrieved = storage.get_document(&doc.id).unwrap().unwrap();
        let diff = (retrieved.created_at - doc.created_at).num_microseconds().unwrap();
        assert_eq!(diff, 0);
    }

    #[test]
    fn test_insert_duplicate_id_fails() {
        let storage = create_test_storage();
        let doc = create_test_document("a.pdf", "u1", Utc::now());

        storage.insert_document(&doc).unwrap();
        assert!(storage.insert_document(&doc).is_err());
    }

    #[test]
    fn test_get_nonexistent() {
        let storage = create_test_storage();
        assert!(storage.get_document("missing").unwrap().is_none());
    }

    #[test]
    fn test_list_documents_newest_first() {
        let storage = create_test_storage();
        let now = Utc::now();

        for i in 0..3 {
            let doc = create_test_document(&format!("doc{i}.pdf"), "u1", now + Duration::seconds(i));
            storage.insert_document(&doc).unwrap();
        }

        let docs = storage.list_documents(&DocumentFilter::default()).unwrap();
        let names: Vec<_> = docs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["doc2.pdf", "doc1.pdf", "doc0.pdf"]);
    }

    #[test]
    fn test_list_documents_with_limit() {
        let storage = create_test_storage();
        let now = Utc::now();
        for i in 0..5 {
            storage
                .insert_document(&create_test_document(&format!("d{i}.pdf"), "u1", now))
                .unwrap();
        }

        let docs = storage
            .list_documents(&DocumentFilter::default().limit(2))
            .unwrap();
        assert_eq!(docs.len(), 2);

        let docs = storage
            .list_documents(&DocumentFilter::default().limit(0))
            .unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_list_by_user() {
        let storage = create_test_storage();
        let now = Utc::now();
        storage
            .insert_document(&create_test_document("a.pdf", "user123", now))
            .unwrap();
        storage
            .insert_document(&create_test_document("b.pdf", "user456", now))
            .unwrap();

        let docs = storage.list_by_user("user123").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].user_id, "user123");
        assert!(storage.list_by_user("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_list_by_status() {
        let storage = create_test_storage();
        let now = Utc::now();
        let a = create_test_document("a.pdf", "u1", now);
        let b = create_test_document("b.pdf", "u1", now);
        storage.insert_document(&a).unwrap();
        storage.insert_document(&b).unwrap();
        storage.record_decision(&a.id, &approve(), "admin@example.com", now).unwrap();

        let pending = storage.list_by_status(DocumentStatus::Pending).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, b.id);

        let approved = storage.list_by_status(DocumentStatus::Approved).unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, a.id);
    }

    #[test]
    fn test_combined_filters() {
        let storage = create_test_storage();
        let now = Utc::now();
        storage
            .insert_document(&create_test_document("Marketing_Brief.pdf", "u1", now))
            .unwrap();
        storage
            .insert_document(&create_test_document("Research_Paper.pdf", "u1", now))
            .unwrap();
        storage
            .insert_document(&create_test_document("Marketing_Plan.pdf", "u2", now))
            .unwrap();

        let filter = DocumentFilter::default()
            .user("u1")
            .status(DocumentStatus::Pending)
            .name_contains("marketing");
        let docs = storage.list_documents(&filter).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].name, "Marketing_Brief.pdf");
    }

    #[test]
    fn test_search_by_name_is_case_insensitive_and_literal() {
        let storage = create_test_storage();
        let now = Utc::now();
        storage
            .insert_document(&create_test_document("Annual_Compliance_Review.pdf", "u1", now))
            .unwrap();
        storage
            .insert_document(&create_test_document("Q1_Report.pdf", "u1", now))
            .unwrap();

        assert_eq!(storage.search_by_name("COMPLIANCE", 10).unwrap().len(), 1);
        // '%' and '_' are not wildcards
        assert_eq!(storage.search_by_name("%", 10).unwrap().len(), 0);
        assert_eq!(storage.search_by_name("", 10).unwrap().len(), 2);
    }

    #[test]
    fn test_search_by_name_with_non_ascii_letters() {
        let storage = create_test_storage();
        storage
            .insert_document(&create_test_document("École_Transcript.pdf", "u1", Utc::now()))
            .unwrap();

        assert_eq!(storage.search_by_name("É", 10).unwrap().len(), 1);
        assert_eq!(storage.search_by_name("ÉCOLE", 10).unwrap().len(), 1);
        assert_eq!(storage.search_by_name("école_transcript", 10).unwrap().len(), 0);
    }

    #[test]
    fn test_record_decision() {
        let storage = create_test_storage();
        let created = Utc::now() - Duration::hours(1);
        let doc = create_test_document("a.pdf", "u1", created);
        storage.insert_document(&doc).unwrap();

        let decided_at = Utc::now();
        let decision = Decision::new(
            DocumentStatus::Declined,
            Some("Please include a bibliography and resubmit.".to_string()),
        )
        .unwrap();
        let updated = storage
            .record_decision(&doc.id, &decision, "admin@example.com", decided_at)
            .unwrap()
            .unwrap();

        assert_eq!(updated.status, DocumentStatus::Declined);
        assert_eq!(
            updated.suggestion.as_deref(),
            Some("Please include a bibliography and resubmit.")
        );
        assert_eq!(updated.admin_decision_by.as_deref(), Some("admin@example.com"));
        assert!(updated.admin_decision_date.is_some());
        assert!(updated.updated_at > updated.created_at);
        assert_eq!(updated.created_at, storage.get_document(&doc.id).unwrap().unwrap().created_at);
    }

    #[test]
    fn test_record_decision_overwrites_previous() {
        let storage = create_test_storage();
        let now = Utc::now();
        let doc = create_test_document("a.pdf", "u1", now);
        storage.insert_document(&doc).unwrap();

        let decline =
            Decision::new(DocumentStatus::Declined, Some("Fix page 2".to_string())).unwrap();
        storage.record_decision(&doc.id, &decline, "admin@example.com", now).unwrap();

        let approve_plain = Decision::new(DocumentStatus::Approved, None).unwrap();
        let updated = storage
            .record_decision(&doc.id, &approve_plain, "admin@example.com", now)
            .unwrap()
            .unwrap();

        assert_eq!(updated.status, DocumentStatus::Approved);
        assert!(updated.suggestion.is_none());
    }

    #[test]
    fn test_record_decision_missing_document() {
        let storage = create_test_storage();
        let result = storage
            .record_decision("missing", &approve(), "admin@example.com", Utc::now())
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_delete() {
        let storage = create_test_storage();
        let doc = create_test_document("a.pdf", "u1", Utc::now());
        storage.insert_document(&doc).unwrap();

        assert!(storage.delete_document(&doc.id).unwrap());
        assert!(storage.get_document(&doc.id).unwrap().is_none());
        assert!(!storage.delete_document(&doc.id).unwrap());
    }

    #[test]
    fn test_count_by_status() {
        let storage = create_test_storage();
        let now = Utc::now();
        let docs: Vec<_> = (0..4)
            .map(|i| create_test_document(&format!("d{i}.pdf"), "u1", now))
            .collect();
        for doc in &docs {
            storage.insert_document(doc).unwrap();
        }
        storage.record_decision(&docs[0].id, &approve(), "a@example.com", now).unwrap();
        let decline = Decision::new(DocumentStatus::Declined, Some("no".to_string())).unwrap();
        storage.record_decision(&docs[1].id, &decline, "a@example.com", now).unwrap();

        let counts = storage.count_by_status().unwrap();
        assert_eq!(counts.pending, 2);
        assert_eq!(counts.approved, 1);
        assert_eq!(counts.declined, 1);
        assert_eq!(counts.total(), 4);
        assert_eq!(counts.get(DocumentStatus::Pending), 2);
        assert_eq!(storage.count().unwrap(), 4);
    }

    #[test]
    fn test_stats_empty() {
        let storage = create_test_storage();
        let stats = storage.stats().unwrap();

        assert_eq!(stats.total_documents, 0);
        assert_eq!(stats.total_bytes, 0);
        assert!(stats.oldest_upload.is_none());
        assert!(stats.newest_upload.is_none());
        assert_eq!(stats.by_status, StatusCounts::default());
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[test]
    fn test_stats_with_data() {
        let storage = create_test_storage();
        let now = Utc::now();
        let first = create_test_document("first.pdf", "u1", now - Duration::days(1));
        let second = create_test_document("second.pdf", "u1", now);
        storage.insert_document(&first).unwrap();
        storage.insert_document(&second).unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_documents, 2);
        assert_eq!(stats.total_bytes, first.file_size + second.file_size);
        assert!(stats.oldest_upload.unwrap() < stats.newest_upload.unwrap());
        assert_eq!(stats.by_status.pending, 2);
    }

    #[test]
    fn test_path() {
        let storage = create_test_storage();
        assert_eq!(storage.path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn test_open_file_based_creates_parent_dirs() {
        let dir = std::env::temp_dir().join(format!("docuapprove_storage_test_{}", std::process::id()));
        let db_path = dir.join("nested").join("documents.db");
        let _ = std::fs::remove_dir_all(&dir);

        let storage = Storage::open(&db_path).unwrap();
        storage
            .insert_document(&create_test_document("a.pdf", "u1", Utc::now()))
            .unwrap();
        assert!(db_path.exists());
        assert_eq!(storage.path(), db_path);
        assert!(storage.stats().unwrap().db_size_bytes > 0);

        drop(storage);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = std::env::temp_dir().join(format!("docuapprove_reopen_test_{}", std::process::id()));
        let db_path = dir.join("documents.db");
        let _ = std::fs::remove_dir_all(&dir);

        let doc = create_test_document("keep.pdf", "u1", Utc::now());
        {
            let storage = Storage::open(&db_path).unwrap();
            storage.insert_document(&doc).unwrap();
        }
        let storage = Storage::open(&db_path).unwrap();
        assert!(storage.get_document(&doc.id).unwrap().is_some());

        drop(storage);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_shared_storage_with() {
        let shared = SharedStorage::new(create_test_storage());
        let doc = create_test_document("a.pdf", "u1", Utc::now());

        shared.with(|s| s.insert_document(&doc)).unwrap();
        let clone = shared.clone();
        let count = clone.with(Storage::count).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_status_counts_serialize() {
        let counts = StatusCounts {
            pending: 1,
            approved: 2,
            declined: 3,
        };
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"pending":1,"approved":2,"declined":3}"#);
    }
}
