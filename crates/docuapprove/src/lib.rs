//! `docuapprove` - Document submission and approval service
//!
//! Users upload documents with a reason, an admin approves or declines each
//! one with an optional suggestion, and users track the status of their
//! submissions. This library holds the domain model, persistence, blob
//! storage, access control and the HTTP API; the `docuapprove` binary wires
//! them to a CLI.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod api;
pub mod auth;
pub mod blob;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod logging;
pub mod service;
pub mod storage;
pub mod upload;

pub use auth::{AccountDirectory, Identity, SessionManager};
pub use blob::{BlobStore, FsBlobStore, MemoryBlobStore};
pub use config::Config;
pub use document::{Decision, Document, DocumentStatus};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use service::DocumentService;
pub use storage::{DocumentFilter, SharedStorage, StatusCounts, Storage, StorageStats};
pub use upload::{Upload, UploadError, UploadPolicy};
