//! Service layer: validation and coordination over the registries, the
//! document store, and the file store

pub mod document_service;
pub mod metadata_service;
pub mod metadata_validator;

pub use document_service::{
    CommitVersionRequest, DeleteOutcome, DocumentPage, DocumentService, FileDownload, FileUpload,
    ListDocumentsParams, StorageFailure, MAX_PAGE_SIZE,
};
pub use metadata_service::MetadataService;
pub use metadata_validator::{MetadataInput, ParsedValue, MULTI_VALUE_SEPARATOR};
