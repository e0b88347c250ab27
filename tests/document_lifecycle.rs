//! Integration tests for the document lifecycle: version commits,
//! metadata validation, cascading deletes, and the registries.
//!
//! These tests require a running PostgreSQL database.
//! Run with: DATABASE_URL=postgresql://localhost/docvault cargo test -- --ignored

use std::collections::BTreeMap;
use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use docvault::{
    AssociationInput, CommitVersionRequest, ConflictError, DocVaultError, DocumentService,
    FieldSpec, FieldType, FileStorage, FileUpload, ListDocumentsParams, LocalFileStorage,
    MetadataInput, MetadataService, StorageError,
};

async fn test_pool() -> PgPool {
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgresql://localhost:5432/docvault".to_string());
    let pool = PgPool::connect(&database_url).await.unwrap();
    docvault::database::run_migrations(&pool).await.unwrap();
    pool
}

struct TestContext {
    // Held so the upload directory outlives the test
    _upload_dir: tempfile::TempDir,
    storage: Arc<LocalFileStorage>,
    documents: DocumentService,
    metadata: MetadataService,
}

async fn setup() -> TestContext {
    let pool = test_pool().await;
    let upload_dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(LocalFileStorage::new(upload_dir.path()).unwrap());

    TestContext {
        documents: DocumentService::new(pool.clone(), storage.clone()),
        metadata: MetadataService::new(pool),
        storage,
        _upload_dir: upload_dir,
    }
}

fn unique(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

fn upload(file_name: &str, bytes: &[u8]) -> FileUpload {
    FileUpload {
        file_name: file_name.to_string(),
        bytes: bytes.to_vec(),
    }
}

fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, MetadataInput> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), MetadataInput::One(v.to_string())))
        .collect()
}

/// Create a text field and a type requiring it, returning (field_id, type_id)
async fn contract_like_type(ctx: &TestContext) -> (Uuid, Uuid) {
    let field = ctx
        .metadata
        .create_field(FieldSpec {
            name: unique("department"),
            display_name: "Department".to_string(),
            description: None,
            field_type: FieldType::Text,
            enum_values: Vec::new(),
            is_multi_valued: false,
        })
        .await
        .unwrap();

    let doc_type = ctx
        .metadata
        .create_type(
            &unique("Contract"),
            None,
            vec![AssociationInput {
                metadata_field_id: field.id,
                is_required: true,
            }],
        )
        .await
        .unwrap();

    (field.id, doc_type.document_type.id)
}

#[tokio::test]
#[ignore]
async fn test_version_numbers_are_gap_free() {
    let ctx = setup().await;

    let detail = ctx
        .documents
        .create_document(&unique("Handbook"), None, None, Some(upload("v1.txt", b"one")))
        .await
        .unwrap();

    for body in [b"two".as_slice(), b"three", b"four"] {
        ctx.documents
            .commit_version(CommitVersionRequest {
                document_id: Some(detail.document.id),
                file: Some(upload("next.txt", body)),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let detail = ctx.documents.get_document(detail.document.id).await.unwrap();
    let numbers: Vec<i32> = detail.versions.iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4]);
}

#[tokio::test]
#[ignore]
async fn test_required_field_missing_is_rejected_without_side_effects() {
    let ctx = setup().await;
    let (_field_id, type_id) = contract_like_type(&ctx).await;

    let field_name = {
        let detail = ctx.metadata.get_type(type_id).await.unwrap();
        detail.fields[0].field.name.clone()
    };

    let title = unique("Lease");
    let err = ctx
        .documents
        .create_document(
            &title,
            Some(type_id),
            Some(BTreeMap::new()),
            Some(upload("lease.pdf", b"contract body")),
        )
        .await
        .unwrap_err();

    match err {
        DocVaultError::Validation(v) => assert!(v.names_field(&field_name)),
        other => panic!("expected validation error, got {other}"),
    }

    // No document row and no orphaned file
    let page = ctx
        .documents
        .list_documents(ListDocumentsParams {
            search: Some(title),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 0);

    let stored = std::fs::read_dir(ctx._upload_dir.path()).unwrap().count();
    assert_eq!(stored, 0);
}

#[tokio::test]
#[ignore]
async fn test_create_then_second_version_keeps_one_document() {
    let ctx = setup().await;
    let (_field_id, type_id) = contract_like_type(&ctx).await;
    let field_name = ctx.metadata.get_type(type_id).await.unwrap().fields[0]
        .field
        .name
        .clone();

    let title = unique("Lease");
    let detail = ctx
        .documents
        .create_document(
            &title,
            Some(type_id),
            Some(values(&[(&field_name, "Legal")])),
            Some(upload("lease.pdf", b"v1")),
        )
        .await
        .unwrap();
    assert_eq!(detail.versions.len(), 1);
    assert_eq!(detail.versions[0].version_number, 1);

    // Second upload with no metadata supplied: new version, inherited snapshot
    let detail = ctx
        .documents
        .commit_version(CommitVersionRequest {
            document_id: Some(detail.document.id),
            file: Some(upload("lease.pdf", b"v2")),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(detail.versions.len(), 2);
    assert_eq!(detail.latest_version().unwrap().version_number, 2);
    assert_eq!(detail.metadata.len(), 1);
    assert_eq!(detail.metadata[0].value, "Legal");

    let page = ctx
        .documents
        .list_documents(ListDocumentsParams {
            search: Some(title),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_commits_never_reuse_a_version_number() {
    let ctx = setup().await;

    let detail = ctx
        .documents
        .create_document(&unique("Roadmap"), None, None, Some(upload("roadmap.md", b"v1")))
        .await
        .unwrap();
    let document_id = detail.document.id;

    let commits = 8;
    let handles: Vec<_> = (0..commits)
        .map(|i| {
            let documents = ctx.documents.clone();
            tokio::spawn(async move {
                documents
                    .commit_version(CommitVersionRequest {
                        document_id: Some(document_id),
                        file: Some(upload("roadmap.md", format!("draft {i}").as_bytes())),
                        ..Default::default()
                    })
                    .await
            })
        })
        .collect();
    for result in futures::future::join_all(handles).await {
        result.unwrap().unwrap();
    }

    let detail = ctx.documents.get_document(document_id).await.unwrap();
    let numbers: Vec<i32> = detail.versions.iter().map(|v| v.version_number).collect();
    let expected: Vec<i32> = (1..=commits as i32 + 1).collect();
    assert_eq!(numbers, expected);
}

#[tokio::test]
#[ignore]
async fn test_delete_field_rejected_while_associated() {
    let ctx = setup().await;
    let (field_id, type_id) = contract_like_type(&ctx).await;

    let err = ctx.metadata.delete_field(field_id).await.unwrap_err();
    assert!(matches!(
        err,
        DocVaultError::Conflict(ConflictError::FieldInUse { .. })
    ));

    // Dropping the association frees the field for deletion
    ctx.metadata
        .update_field_associations(type_id, Vec::new())
        .await
        .unwrap();
    ctx.metadata.delete_field(field_id).await.unwrap();

    let err = ctx.metadata.get_field(field_id).await.unwrap_err();
    assert!(matches!(err, DocVaultError::NotFound { .. }));
}

#[tokio::test]
#[ignore]
async fn test_delete_type_rejected_while_referenced() {
    let ctx = setup().await;
    let (_field_id, type_id) = contract_like_type(&ctx).await;
    let field_name = ctx.metadata.get_type(type_id).await.unwrap().fields[0]
        .field
        .name
        .clone();

    let detail = ctx
        .documents
        .create_document(
            &unique("Lease"),
            Some(type_id),
            Some(values(&[(&field_name, "Legal")])),
            None,
        )
        .await
        .unwrap();

    let err = ctx.metadata.delete_type(type_id).await.unwrap_err();
    assert!(matches!(
        err,
        DocVaultError::Conflict(ConflictError::TypeInUse { .. })
    ));

    ctx.documents.delete_document(detail.document.id).await.unwrap();
    ctx.metadata.delete_type(type_id).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_delete_document_removes_rows_and_stored_files() {
    let ctx = setup().await;

    let detail = ctx
        .documents
        .create_document(&unique("Report"), None, None, Some(upload("r.txt", b"one")))
        .await
        .unwrap();
    let document_id = detail.document.id;

    for body in [b"two".as_slice(), b"three"] {
        ctx.documents
            .commit_version(CommitVersionRequest {
                document_id: Some(document_id),
                file: Some(upload("r.txt", body)),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let detail = ctx.documents.get_document(document_id).await.unwrap();
    let keys: Vec<String> = detail
        .versions
        .iter()
        .filter_map(|v| v.storage_key.clone())
        .collect();
    assert_eq!(keys.len(), 3);

    let outcome = ctx.documents.delete_document(document_id).await.unwrap();
    assert_eq!(outcome.versions_removed, 3);
    assert!(outcome.storage_failures.is_empty());

    let err = ctx.documents.get_document(document_id).await.unwrap_err();
    assert!(matches!(err, DocVaultError::NotFound { .. }));

    for key in keys {
        let err = ctx.storage.as_ref().get(&key).await.unwrap_err();
        assert!(matches!(err, StorageError::KeyNotFound { .. }));
    }
}

#[tokio::test]
#[ignore]
async fn test_metadata_only_edit_updates_latest_snapshot_in_place() {
    let ctx = setup().await;
    let (_field_id, type_id) = contract_like_type(&ctx).await;
    let field_name = ctx.metadata.get_type(type_id).await.unwrap().fields[0]
        .field
        .name
        .clone();

    let detail = ctx
        .documents
        .create_document(
            &unique("Lease"),
            Some(type_id),
            Some(values(&[(&field_name, "Legal")])),
            Some(upload("lease.pdf", b"v1")),
        )
        .await
        .unwrap();

    let detail = ctx
        .documents
        .update_metadata_only(
            detail.document.id,
            Some("Renewed Lease".to_string()),
            None,
            values(&[(&field_name, "Finance")]),
        )
        .await
        .unwrap();

    // No version bump; the latest snapshot carries the new value
    assert_eq!(detail.versions.len(), 1);
    assert_eq!(detail.document.title, "Renewed Lease");
    assert_eq!(detail.metadata[0].value, "Finance");
    assert!(detail.document.updated_at.is_some());
}

#[tokio::test]
#[ignore]
async fn test_untyped_document_rejects_metadata() {
    let ctx = setup().await;

    let err = ctx
        .documents
        .create_document(
            &unique("Loose note"),
            None,
            Some(values(&[("department", "Legal")])),
            None,
        )
        .await
        .unwrap_err();

    match err {
        DocVaultError::Validation(v) => assert!(v.names_field("department")),
        other => panic!("expected validation error, got {other}"),
    }
}

#[tokio::test]
#[ignore]
async fn test_create_without_file_yields_fileless_first_version() {
    let ctx = setup().await;

    let detail = ctx
        .documents
        .create_document(&unique("Placeholder"), None, None, None)
        .await
        .unwrap();

    assert_eq!(detail.versions.len(), 1);
    let version = &detail.versions[0];
    assert_eq!(version.version_number, 1);
    assert!(version.storage_key.is_none());

    let err = ctx
        .documents
        .download_version(detail.document.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DocVaultError::NotFound { .. }));
}

#[tokio::test]
#[ignore]
async fn test_download_defaults_to_latest_version() {
    let ctx = setup().await;

    let detail = ctx
        .documents
        .create_document(&unique("Slides"), None, None, Some(upload("slides.pdf", b"v1")))
        .await
        .unwrap();
    let document_id = detail.document.id;
    let first_version = detail.versions[0].id;

    ctx.documents
        .commit_version(CommitVersionRequest {
            document_id: Some(document_id),
            file: Some(upload("slides.pdf", b"v2")),
            ..Default::default()
        })
        .await
        .unwrap();

    let latest = ctx.documents.download_version(document_id, None).await.unwrap();
    assert_eq!(latest.bytes, b"v2");

    let first = ctx
        .documents
        .download_version(document_id, Some(first_version))
        .await
        .unwrap();
    assert_eq!(first.bytes, b"v1");
}

#[tokio::test]
#[ignore]
async fn test_association_replacement_is_not_a_merge() {
    let ctx = setup().await;

    let first = ctx
        .metadata
        .create_field(FieldSpec {
            name: unique("owner"),
            display_name: "Owner".to_string(),
            description: None,
            field_type: FieldType::Text,
            enum_values: Vec::new(),
            is_multi_valued: false,
        })
        .await
        .unwrap();
    let second = ctx
        .metadata
        .create_field(FieldSpec {
            name: unique("status"),
            display_name: "Status".to_string(),
            description: None,
            field_type: FieldType::Text,
            enum_values: Vec::new(),
            is_multi_valued: false,
        })
        .await
        .unwrap();

    let detail = ctx
        .metadata
        .create_type(
            &unique("Policy"),
            None,
            vec![AssociationInput {
                metadata_field_id: first.id,
                is_required: false,
            }],
        )
        .await
        .unwrap();

    let detail = ctx
        .metadata
        .update_field_associations(
            detail.document_type.id,
            vec![AssociationInput {
                metadata_field_id: second.id,
                is_required: true,
            }],
        )
        .await
        .unwrap();

    assert_eq!(detail.fields.len(), 1);
    assert_eq!(detail.fields[0].field.id, second.id);
    assert!(detail.fields[0].is_required);
}

#[tokio::test]
#[ignore]
async fn test_pagination_and_case_insensitive_search() {
    let ctx = setup().await;

    let marker = unique("paged");
    for i in 0..3 {
        ctx.documents
            .create_document(&format!("{marker} {i}"), None, None, None)
            .await
            .unwrap();
    }

    let page = ctx
        .documents
        .list_documents(ListDocumentsParams {
            page: 1,
            limit: 2,
            search: Some(marker.clone()),
            document_type_id: None,
        })
        .await
        .unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 3);

    let page = ctx
        .documents
        .list_documents(ListDocumentsParams {
            page: 2,
            limit: 2,
            search: Some(marker.to_uppercase()),
            document_type_id: None,
        })
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);

    // Newest first
    assert!(page.items[0].title.ends_with('0'));
}

#[tokio::test]
#[ignore]
async fn test_enum_field_lifecycle_through_registry() {
    let ctx = setup().await;

    // Enum fields require members
    let err = ctx
        .metadata
        .create_field(FieldSpec {
            name: unique("severity"),
            display_name: "Severity".to_string(),
            description: None,
            field_type: FieldType::Enum,
            enum_values: Vec::new(),
            is_multi_valued: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DocVaultError::Validation(ref v) if v.names_field("enum_values")));

    let field = ctx
        .metadata
        .create_field(FieldSpec {
            name: unique("severity"),
            display_name: "Severity".to_string(),
            description: None,
            field_type: FieldType::Enum,
            enum_values: vec!["low".to_string(), "high".to_string()],
            is_multi_valued: false,
        })
        .await
        .unwrap();

    let doc_type = ctx
        .metadata
        .create_type(
            &unique("Incident"),
            None,
            vec![AssociationInput {
                metadata_field_id: field.id,
                is_required: true,
            }],
        )
        .await
        .unwrap();

    let err = ctx
        .documents
        .create_document(
            &unique("Outage"),
            Some(doc_type.document_type.id),
            Some(values(&[(&field.name, "medium")])),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DocVaultError::Validation(ref v) if v.names_field(&field.name)));

    let detail = ctx
        .documents
        .create_document(
            &unique("Outage"),
            Some(doc_type.document_type.id),
            Some(values(&[(&field.name, "high")])),
            None,
        )
        .await
        .unwrap();
    assert_eq!(detail.metadata[0].value, "high");
}
