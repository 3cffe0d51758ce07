//! Document workflows.
//!
//! [`DocumentService`] ties the upload policy, blob store and database
//! together and applies the access rules from [`crate::auth`]. The HTTP
//! handlers and the CLI both go through it.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, instrument, warn};

use crate::auth::{ensure_can_view, require_admin, Identity};
use crate::blob::BlobStore;
use crate::document::{Decision, Document, DocumentStatus, NewDocument};
use crate::error::{Error, Result};
use crate::storage::{DocumentFilter, SharedStorage, StatusCounts};
use crate::upload::{normalize_mime, object_key, Upload, UploadPolicy};

/// Consecutive milliseconds tried when an upload's blob key is taken.
const MAX_KEY_ATTEMPTS: u32 = 1000;

/// Submission, review and retrieval of documents.
#[derive(Debug, Clone)]
pub struct DocumentService {
    storage: SharedStorage,
    blobs: Arc<dyn BlobStore>,
    policy: UploadPolicy,
}

impl DocumentService {
    /// Create a service.
    #[must_use]
    pub fn new(storage: SharedStorage, blobs: Arc<dyn BlobStore>, policy: UploadPolicy) -> Self {
        Self {
            storage,
            blobs,
            policy,
        }
    }

    /// The underlying storage.
    #[must_use]
    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    /// The blob backend.
    #[must_use]
    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    /// The upload policy in force.
    #[must_use]
    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Validate and store an upload, then record it as pending.
    ///
    /// If the record cannot be written the stored file is removed again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upload`] if validation fails, or a blob or storage
    /// error.
    #[instrument(skip(self, upload), fields(user_id = %identity.user_id, file = %upload.file_name))]
    pub async fn submit(&self, identity: &Identity, upload: Upload) -> Result<Document> {
        self.policy.validate(&upload)?;

        let now = Utc::now();
        let file_type = normalize_mime(&upload.content_type);
        let file_size = upload.size();
        let content_hash = Document::compute_hash(&upload.bytes);

        let key = self
            .store_blob(&identity.user_id, now, &upload.file_name, &upload.bytes, &file_type)
            .await?;

        let doc = Document::create(
            NewDocument {
                name: upload.file_name,
                user_id: identity.user_id.clone(),
                user_email: identity.email.clone(),
                reason: upload.reason,
                url: self.blobs.public_url(&key),
                storage_key: key.clone(),
                file_size,
                file_type,
                content_hash,
            },
            now,
        );

        let record = doc.clone();
        if let Err(e) = self
            .storage
            .with_blocking(move |s| s.insert_document(&record))
            .await
        {
            if let Err(cleanup) = self.blobs.delete(&key).await {
                warn!(key = %key, error = %cleanup, "Failed to remove orphaned blob");
            }
            return Err(e);
        }

        info!(document_id = %doc.id, size = file_size, "Document submitted");
        Ok(doc)
    }

    /// Write `bytes` under the first free key at or after `at`.
    ///
    /// Keys only carry millisecond precision, so an upload of the same name by
    /// the same user within one millisecond moves on to the next one.
    async fn store_blob(
        &self,
        user_id: &str,
        at: DateTime<Utc>,
        file_name: &str,
        bytes: &[u8],
        file_type: &str,
    ) -> Result<String> {
        let mut at = at;
        for _ in 0..MAX_KEY_ATTEMPTS {
            let key = object_key(user_id, at, file_name);
            if self.blobs.put_new(&key, bytes, file_type).await? {
                return Ok(key);
            }
            debug!(key = %key, "Blob key taken");
            at += Duration::milliseconds(1);
        }
        Err(Error::blob(
            object_key(user_id, at, file_name),
            "no free key for upload",
        ))
    }

    /// The caller's own documents, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub fn my_documents(&self, identity: &Identity) -> Result<Vec<Document>> {
        self.storage.with(|s| s.list_by_user(&identity.user_id))
    }

    /// One document, if the caller may see it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DocumentNotFound`] or [`Error::Forbidden`].
    pub fn document(&self, identity: &Identity, id: &str) -> Result<Document> {
        let doc = self.load(id)?;
        ensure_can_view(identity, &doc)?;
        Ok(doc)
    }

    /// A document together with its file contents.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`DocumentService::document`], or
    /// [`Error::BlobNotFound`] if the file is gone.
    pub async fn download(&self, identity: &Identity, id: &str) -> Result<(Document, Vec<u8>)> {
        let doc = self.document(identity, id)?;
        let bytes = self.blobs.get(&doc.storage_key).await?;
        Ok((doc, bytes))
    }

    /// Documents awaiting review, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Forbidden`] for non-admin callers.
    pub fn review_queue(&self, admin: &Identity) -> Result<Vec<Document>> {
        require_admin(admin)?;
        self.storage.with(|s| s.list_by_status(DocumentStatus::Pending))
    }

    /// Every document, optionally restricted to one status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Forbidden`] for non-admin callers.
    pub fn all_documents(
        &self,
        admin: &Identity,
        status: Option<DocumentStatus>,
    ) -> Result<Vec<Document>> {
        require_admin(admin)?;
        let filter = DocumentFilter {
            status,
            ..DocumentFilter::default()
        };
        self.storage.with(|s| s.list_documents(&filter))
    }

    /// Record an admin decision. Earlier decisions are overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Forbidden`] for non-admin callers and
    /// [`Error::DocumentNotFound`] for unknown ids.
    #[instrument(skip(self, admin, decision), fields(status = %decision.status()))]
    pub fn decide(&self, admin: &Identity, id: &str, decision: &Decision) -> Result<Document> {
        require_admin(admin)?;
        let doc = self
            .storage
            .with(|s| s.record_decision(id, decision, &admin.email, Utc::now()))?
            .ok_or_else(|| Error::document_not_found(id))?;

        info!(document_id = %doc.id, decided_by = %admin.email, "Decision recorded");
        Ok(doc)
    }

    /// Delete a document and its file.
    ///
    /// Owners may withdraw pending documents; the admin may delete any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DocumentNotFound`], [`Error::Forbidden`], or a blob
    /// or storage error.
    #[instrument(skip(self, identity), fields(user_id = %identity.user_id))]
    pub async fn delete(&self, identity: &Identity, id: &str) -> Result<()> {
        let doc = self.load(id)?;
        ensure_can_view(identity, &doc)?;
        if !identity.can_delete(&doc) {
            return Err(Error::forbidden(
                "only pending documents can be withdrawn",
            ));
        }

        if !self.blobs.delete(&doc.storage_key).await? {
            warn!(key = %doc.storage_key, "Blob already missing while deleting document");
        }
        let id = doc.id.clone();
        self.storage
            .with_blocking(move |s| s.delete_document(&id))
            .await?;

        info!(document_id = %doc.id, "Document deleted");
        Ok(())
    }

    /// Document counts per status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Forbidden`] for non-admin callers.
    pub fn summary(&self, admin: &Identity) -> Result<StatusCounts> {
        require_admin(admin)?;
        self.storage.with(|s| s.count_by_status())
    }

    fn load(&self, id: &str) -> Result<Document> {
        self.storage
            .with(|s| s.get_document(id))?
            .ok_or_else(|| Error::document_not_found(id))
    }
}
