//! Shared handler state.

use std::sync::Arc;

use crate::auth::{AccountDirectory, SessionManager};
use crate::blob::FsBlobStore;
use crate::config::Config;
use crate::error::Result;
use crate::service::DocumentService;
use crate::storage::{SharedStorage, Storage};
use crate::upload::UploadPolicy;

/// Floor for the request body limit.
const MIN_BODY_LIMIT: usize = 64 * 1024;

/// Everything a request handler needs.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Document workflows.
    pub documents: DocumentService,
    /// Login sessions.
    pub sessions: SessionManager,
}

impl AppState {
    /// Bundle a service and a session manager.
    #[must_use]
    pub fn new(documents: DocumentService, sessions: SessionManager) -> Self {
        Self {
            documents,
            sessions,
        }
    }

    /// Open the database and blob directory named by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn from_config(config: &Config) -> Result<Self> {
        let storage = SharedStorage::new(Storage::open(config.database_path())?);
        let blobs = Arc::new(FsBlobStore::new(
            config.blob_dir(),
            config.storage.public_base_url.clone(),
        ));
        let documents = DocumentService::new(
            storage.clone(),
            blobs,
            UploadPolicy::from_config(&config.upload),
        );
        let sessions = SessionManager::new(
            storage,
            Arc::new(AccountDirectory::from_config(&config.auth)),
            config.session_ttl(),
        );
        Ok(Self::new(documents, sessions))
    }

    /// Largest request body accepted, in bytes.
    ///
    /// One byte above the upload limit, so an oversized file reaches the
    /// upload policy and is refused with its message.
    #[must_use]
    pub fn body_limit(&self) -> usize {
        usize::try_from(self.documents.policy().max_size_bytes())
            .unwrap_or(usize::MAX)
            .saturating_add(1)
            .max(MIN_BODY_LIMIT)
    }
}
