//! DocVault - document management with versioned files and typed metadata
//!
//! Documents own a gap-free sequence of versions; each version references
//! stored file content and carries a snapshot of metadata values validated
//! against the document's type. All writes flow through the coordination
//! service: validate against the registries, persist bytes through the
//! storage abstraction, then commit the rows as one unit of work.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use docvault::{DatabaseManager, DocumentService, LocalFileStorage};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let db = DatabaseManager::with_default_config().await?;
//! db.run_migrations().await?;
//!
//! let storage = Arc::new(LocalFileStorage::from_env()?);
//! let documents = DocumentService::new(db.pool().clone(), storage);
//! let page = documents.list_documents(Default::default()).await?;
//! println!("{} document(s)", page.total);
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Entity models
pub mod models;

// Database integration
pub mod database;

// Storage abstraction
pub mod storage;

// Validation and coordination services
pub mod services;

// REST API (when the server feature is enabled)
#[cfg(feature = "server")]
pub mod api;

// Public re-exports
pub use database::{DatabaseConfig, DatabaseManager};
pub use error::{
    ConflictError, DocVaultError, DocVaultResult, FieldViolation, StorageError, ValidationError,
};
pub use models::{
    AssociatedField, AssociationInput, Document, DocumentDetail, DocumentType, DocumentTypeDetail,
    DocumentVersion, FieldPatch, FieldSpec, FieldType, MetadataField, MetadataValue,
};
pub use services::{
    CommitVersionRequest, DeleteOutcome, DocumentPage, DocumentService, FileDownload, FileUpload,
    ListDocumentsParams, MetadataInput, MetadataService, StorageFailure,
};
pub use storage::{FileStorage, LocalFileStorage};
