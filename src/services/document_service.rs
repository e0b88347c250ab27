//! Document service - version commits and document lifecycle
//!
//! The coordination core: validates metadata against the document's type,
//! persists file content through the storage abstraction, and writes the
//! document/version/snapshot rows as one transaction. A storage write that
//! the database transaction cannot honor is compensated by deleting the
//! just-stored file before the error is surfaced.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::{DocumentRepository, DocumentTypeRepository};
use crate::error::{DocVaultError, DocVaultResult, ValidationError};
use crate::models::{Document, DocumentDetail, DocumentVersion};
use crate::services::metadata_validator::{build_snapshot, MetadataInput};
use crate::storage::FileStorage;

/// Hard ceiling on page size to keep listing scans bounded
pub const MAX_PAGE_SIZE: i64 = 100;
const DEFAULT_PAGE_SIZE: i64 = 20;

/// File content supplied with a version commit
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Input to [`DocumentService::commit_version`]
///
/// `document_id` absent means the create path. `metadata` of `None` keeps
/// the current snapshot (inherited onto a new version when a file is
/// uploaded); `Some` replaces it after validation.
#[derive(Debug, Clone, Default)]
pub struct CommitVersionRequest {
    pub document_id: Option<Uuid>,
    pub title: Option<String>,
    pub document_type_id: Option<Uuid>,
    pub metadata: Option<BTreeMap<String, MetadataInput>>,
    pub file: Option<FileUpload>,
}

/// Listing filters and pagination
#[derive(Debug, Clone)]
pub struct ListDocumentsParams {
    /// 1-indexed
    pub page: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub document_type_id: Option<Uuid>,
}

impl Default for ListDocumentsParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
            document_type_id: None,
        }
    }
}

impl ListDocumentsParams {
    /// Clamp to sane bounds and derive the scan offset
    pub fn normalized(&self) -> (i64, i64, i64) {
        let page = self.page.max(1);
        let limit = self.limit.clamp(1, MAX_PAGE_SIZE);
        (page, limit, (page - 1) * limit)
    }
}

/// One page of documents plus the total match count
#[derive(Debug, Clone, Serialize)]
pub struct DocumentPage {
    pub items: Vec<Document>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

/// A storage delete that failed during a cascading document delete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageFailure {
    pub version_id: Uuid,
    pub storage_key: String,
    pub reason: String,
}

/// Result of a cascading document delete
///
/// Database rows are always gone; `storage_failures` lists the stored
/// files that could not be removed so callers can retry just those keys.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    pub document_id: Uuid,
    pub versions_removed: usize,
    pub storage_failures: Vec<StorageFailure>,
}

/// Resolved file content for a download
#[derive(Debug, Clone)]
pub struct FileDownload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Service coordinating validation, storage, and the document store
#[derive(Clone)]
pub struct DocumentService {
    pool: PgPool,
    documents: DocumentRepository,
    types: DocumentTypeRepository,
    storage: Arc<dyn FileStorage>,
}

impl DocumentService {
    /// Create a new document service
    pub fn new(pool: PgPool, storage: Arc<dyn FileStorage>) -> Self {
        Self {
            documents: DocumentRepository::new(pool.clone()),
            types: DocumentTypeRepository::new(pool.clone()),
            pool,
            storage,
        }
    }

    /// Create a document with its first version in one transaction
    pub async fn create_document(
        &self,
        title: &str,
        document_type_id: Option<Uuid>,
        metadata: Option<BTreeMap<String, MetadataInput>>,
        file: Option<FileUpload>,
    ) -> DocVaultResult<DocumentDetail> {
        self.commit_version(CommitVersionRequest {
            document_id: None,
            title: Some(title.to_string()),
            document_type_id,
            metadata,
            file,
        })
        .await
    }

    /// Edit title/type/metadata without creating a new version
    pub async fn update_metadata_only(
        &self,
        document_id: Uuid,
        title: Option<String>,
        document_type_id: Option<Uuid>,
        metadata: BTreeMap<String, MetadataInput>,
    ) -> DocVaultResult<DocumentDetail> {
        self.commit_version(CommitVersionRequest {
            document_id: Some(document_id),
            title,
            document_type_id,
            metadata: Some(metadata),
            file: None,
        })
        .await
    }

    /// Commit a version: the create path, a new-file upload, or a
    /// metadata-only edit
    ///
    /// Validation runs before anything touches durable state. The file is
    /// stored first; if the database transaction then fails, the orphaned
    /// file is removed before the error is surfaced.
    pub async fn commit_version(
        &self,
        request: CommitVersionRequest,
    ) -> DocVaultResult<DocumentDetail> {
        let existing = match request.document_id {
            Some(id) => Some(
                self.documents
                    .get_by_id(id)
                    .await?
                    .ok_or_else(|| DocVaultError::not_found("document", id))?,
            ),
            None => None,
        };

        let title = resolve_title(request.title.as_deref(), existing.as_ref())?;
        let effective_type_id = request
            .document_type_id
            .or_else(|| existing.as_ref().and_then(|d| d.document_type_id));

        let associations = match effective_type_id {
            Some(type_id) => {
                self.types
                    .get_by_id(type_id)
                    .await?
                    .ok_or_else(|| DocVaultError::not_found("document type", type_id))?;
                Some(self.types.get_associated_fields(type_id).await?)
            }
            None => None,
        };

        // The create path validates even without supplied metadata so that
        // required fields gate the first version; the update path with no
        // metadata keeps the current snapshot untouched.
        let snapshot = match (&request.metadata, existing.is_some()) {
            (Some(inputs), _) => Some(build_snapshot(associations.as_deref(), inputs)?),
            (None, false) => Some(build_snapshot(associations.as_deref(), &BTreeMap::new())?),
            (None, true) => None,
        };

        let stored = match &request.file {
            Some(upload) => {
                let key = self.storage.put(&upload.file_name, &upload.bytes).await?;
                let hash = format!("{:x}", Sha256::digest(&upload.bytes));
                Some((key, hash))
            }
            None => None,
        };

        let committed = self
            .commit_rows(
                existing.as_ref().map(|d| d.id),
                &title,
                effective_type_id,
                snapshot,
                stored.clone(),
                request.file.as_ref(),
            )
            .await;

        match committed {
            Ok(document_id) => {
                info!(
                    "Committed document {} ('{}'){}",
                    document_id,
                    title,
                    if stored.is_some() { " with new version" } else { "" }
                );
                self.get_document(document_id).await
            }
            Err(err) => {
                if let Some((key, _)) = stored {
                    // Compensating delete so the failed commit leaves no
                    // orphaned file behind
                    if let Err(cleanup) = self.storage.delete(&key).await {
                        warn!(
                            "failed to clean up stored file '{}' after aborted commit: {}",
                            key, cleanup
                        );
                    }
                }
                Err(err)
            }
        }
    }

    /// The transactional tail of a commit: document row, version row,
    /// snapshot rows
    async fn commit_rows(
        &self,
        existing_id: Option<Uuid>,
        title: &str,
        document_type_id: Option<Uuid>,
        snapshot: Option<Vec<(Uuid, String)>>,
        stored: Option<(String, String)>,
        file: Option<&FileUpload>,
    ) -> DocVaultResult<Uuid> {
        let now = chrono::Utc::now();
        let mut tx = self.pool.begin().await?;

        let document_id = match existing_id {
            None => {
                let document = Document {
                    id: Uuid::new_v4(),
                    title: title.to_string(),
                    document_type_id,
                    created_at: now,
                    updated_at: None,
                };
                self.documents.insert_document(&mut tx, &document).await?;

                // The first version always exists, with a null storage key
                // when no file was supplied
                let version = build_version(document.id, 1, stored, file, now);
                self.documents.insert_version(&mut tx, &version).await?;

                if let Some(rows) = &snapshot {
                    self.documents
                        .replace_version_metadata(&mut tx, version.id, rows)
                        .await?;
                }
                document.id
            }
            Some(id) => {
                // Row lock serializes concurrent commits per document
                self.documents
                    .lock_document(&mut tx, id)
                    .await?
                    .ok_or_else(|| DocVaultError::not_found("document", id))?;

                self.documents
                    .update_document(&mut tx, id, title, document_type_id)
                    .await?;

                if stored.is_some() {
                    let previous = self.documents.latest_version_id(&mut tx, id).await?;
                    let next = self.documents.next_version_number(&mut tx, id).await?;
                    let version = build_version(id, next, stored, file, now);
                    self.documents.insert_version(&mut tx, &version).await?;

                    let rows = match snapshot {
                        Some(rows) => rows,
                        // No metadata supplied: the new version inherits
                        // the previous snapshot unchanged
                        None => match previous {
                            Some(prev) => self.documents.snapshot_rows(&mut tx, prev).await?,
                            None => Vec::new(),
                        },
                    };
                    self.documents
                        .replace_version_metadata(&mut tx, version.id, &rows)
                        .await?;
                } else if let Some(rows) = snapshot {
                    let version_id = self
                        .documents
                        .latest_version_id(&mut tx, id)
                        .await?
                        .ok_or_else(|| {
                            ValidationError::single(
                                "metadata",
                                "document has no version to attach metadata to",
                            )
                        })?;
                    self.documents
                        .replace_version_metadata(&mut tx, version_id, &rows)
                        .await?;
                }
                id
            }
        };

        tx.commit().await?;
        Ok(document_id)
    }

    /// Get a document with its version history and latest snapshot
    pub async fn get_document(&self, id: Uuid) -> DocVaultResult<DocumentDetail> {
        let document = self
            .documents
            .get_by_id(id)
            .await?
            .ok_or_else(|| DocVaultError::not_found("document", id))?;

        let versions = self.documents.versions_for(id).await?;
        let metadata = match versions.last() {
            Some(latest) => self.documents.metadata_for_version(latest.id).await?,
            None => Vec::new(),
        };

        Ok(DocumentDetail {
            document,
            versions,
            metadata,
        })
    }

    /// List documents, newest first
    pub async fn list_documents(&self, params: ListDocumentsParams) -> DocVaultResult<DocumentPage> {
        let (page, limit, offset) = params.normalized();
        let search = params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let items = self
            .documents
            .list(search, params.document_type_id, limit, offset)
            .await?;
        let total = self.documents.count(search, params.document_type_id).await?;

        Ok(DocumentPage {
            items,
            total,
            page,
            limit,
        })
    }

    /// Delete a document and everything it owns
    ///
    /// Stored files are removed best-effort before the rows go; failures
    /// are collected per version rather than aborting the cascade.
    pub async fn delete_document(&self, id: Uuid) -> DocVaultResult<DeleteOutcome> {
        let document = self
            .documents
            .get_by_id(id)
            .await?
            .ok_or_else(|| DocVaultError::not_found("document", id))?;

        let versions = self.documents.versions_for(id).await?;
        let mut storage_failures = Vec::new();

        for version in &versions {
            let Some(key) = &version.storage_key else {
                continue;
            };
            if let Err(err) = self.storage.delete(key).await {
                warn!(
                    "failed to delete stored file '{}' of document {}: {}",
                    key, id, err
                );
                storage_failures.push(StorageFailure {
                    version_id: version.id,
                    storage_key: key.clone(),
                    reason: err.to_string(),
                });
            }
        }

        self.documents.delete(id).await?;
        info!(
            "Deleted document {} ('{}') with {} version(s)",
            id,
            document.title,
            versions.len()
        );

        Ok(DeleteOutcome {
            document_id: id,
            versions_removed: versions.len(),
            storage_failures,
        })
    }

    /// Fetch the file content of a version, defaulting to the latest
    pub async fn download_version(
        &self,
        document_id: Uuid,
        version_id: Option<Uuid>,
    ) -> DocVaultResult<FileDownload> {
        self.documents
            .get_by_id(document_id)
            .await?
            .ok_or_else(|| DocVaultError::not_found("document", document_id))?;

        let version = match version_id {
            Some(vid) => self
                .documents
                .get_version(document_id, vid)
                .await?
                .ok_or_else(|| DocVaultError::not_found("version", vid))?,
            None => self
                .documents
                .latest_version(document_id)
                .await?
                .ok_or_else(|| DocVaultError::not_found("version", "latest"))?,
        };

        let key = version
            .storage_key
            .as_deref()
            .ok_or_else(|| DocVaultError::not_found("file", version.id))?;
        let bytes = self.storage.get(key).await?;

        Ok(FileDownload {
            file_name: version.file_name.clone().unwrap_or_else(|| key.to_string()),
            bytes,
        })
    }
}

fn resolve_title(requested: Option<&str>, existing: Option<&Document>) -> DocVaultResult<String> {
    match (requested, existing) {
        (Some(title), _) => {
            let title = title.trim();
            if title.is_empty() {
                Err(ValidationError::single("title", "must not be empty").into())
            } else {
                Ok(title.to_string())
            }
        }
        (None, Some(document)) => Ok(document.title.clone()),
        (None, None) => {
            Err(ValidationError::single("title", "required when creating a document").into())
        }
    }
}

fn build_version(
    document_id: Uuid,
    version_number: i32,
    stored: Option<(String, String)>,
    file: Option<&FileUpload>,
    now: chrono::DateTime<chrono::Utc>,
) -> DocumentVersion {
    let (storage_key, file_hash) = match stored {
        Some((key, hash)) => (Some(key), Some(hash)),
        None => (None, None),
    };

    DocumentVersion {
        id: Uuid::new_v4(),
        document_id,
        version_number,
        storage_key,
        file_name: file.map(|f| f.file_name.clone()),
        file_size: file.map(|f| f.bytes.len() as i64),
        file_hash,
        created_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_normalization() {
        let params = ListDocumentsParams {
            page: 0,
            limit: 1000,
            ..Default::default()
        };
        assert_eq!(params.normalized(), (1, MAX_PAGE_SIZE, 0));

        let params = ListDocumentsParams {
            page: 3,
            limit: 25,
            ..Default::default()
        };
        assert_eq!(params.normalized(), (3, 25, 50));

        let params = ListDocumentsParams {
            page: -4,
            limit: 0,
            ..Default::default()
        };
        assert_eq!(params.normalized(), (1, 1, 0));
    }

    #[test]
    fn test_resolve_title() {
        assert_eq!(resolve_title(Some("  Lease "), None).unwrap(), "Lease");

        let err = resolve_title(Some("  "), None).unwrap_err();
        assert!(matches!(err, DocVaultError::Validation(ref v) if v.names_field("title")));

        let err = resolve_title(None, None).unwrap_err();
        assert!(matches!(err, DocVaultError::Validation(ref v) if v.names_field("title")));

        let existing = Document {
            id: Uuid::new_v4(),
            title: "Existing".to_string(),
            document_type_id: None,
            created_at: chrono::Utc::now(),
            updated_at: None,
        };
        assert_eq!(resolve_title(None, Some(&existing)).unwrap(), "Existing");
    }

    #[test]
    fn test_build_version_without_file() {
        let version = build_version(Uuid::new_v4(), 1, None, None, chrono::Utc::now());
        assert_eq!(version.version_number, 1);
        assert!(version.storage_key.is_none());
        assert!(version.file_name.is_none());
        assert!(version.file_size.is_none());
        assert!(version.file_hash.is_none());
    }

    #[test]
    fn test_build_version_with_file() {
        let upload = FileUpload {
            file_name: "lease.pdf".to_string(),
            bytes: b"contract".to_vec(),
        };
        let version = build_version(
            Uuid::new_v4(),
            2,
            Some(("abc123.pdf".to_string(), "deadbeef".to_string())),
            Some(&upload),
            chrono::Utc::now(),
        );
        assert_eq!(version.version_number, 2);
        assert_eq!(version.storage_key.as_deref(), Some("abc123.pdf"));
        assert_eq!(version.file_name.as_deref(), Some("lease.pdf"));
        assert_eq!(version.file_size, Some(8));
        assert_eq!(version.file_hash.as_deref(), Some("deadbeef"));
    }
}
