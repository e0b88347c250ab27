//! REST API routes for document operations
//!
//! All database and storage access goes through DocumentService.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use base64::Engine;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::AppState;
use crate::error::{DocVaultError, ValidationError};
use crate::models::DocumentDetail;
use crate::services::{
    CommitVersionRequest, DeleteOutcome, DocumentPage, FileUpload, ListDocumentsParams,
    MetadataInput,
};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UploadPayload {
    pub file_name: String,
    pub content_base64: String,
}

impl UploadPayload {
    fn decode(self) -> Result<FileUpload, DocVaultError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&self.content_base64)
            .map_err(|_| ValidationError::single("file", "content_base64 is not valid base64"))?;

        Ok(FileUpload {
            file_name: self.file_name,
            bytes,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub title: String,
    #[serde(default)]
    pub document_type_id: Option<Uuid>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, MetadataInput>>,
    #[serde(default)]
    pub file: Option<UploadPayload>,
}

#[derive(Debug, Deserialize)]
pub struct NewVersionRequest {
    pub file_name: String,
    pub content_base64: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub document_type_id: Option<Uuid>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, MetadataInput>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDocumentRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub document_type_id: Option<Uuid>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, MetadataInput>>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub document_type_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    #[serde(default)]
    pub version_id: Option<Uuid>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST /api/documents
/// Create a document (optionally with an initial file and metadata)
async fn create_document(
    State(state): State<AppState>,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<DocumentDetail>), DocVaultError> {
    let file = req.file.map(UploadPayload::decode).transpose()?;

    let detail = state
        .documents
        .commit_version(CommitVersionRequest {
            document_id: None,
            title: Some(req.title),
            document_type_id: req.document_type_id,
            metadata: req.metadata,
            file,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(detail)))
}

/// POST /api/documents/:id/versions
/// Upload a new file, creating the next version of the document
async fn upload_version(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
    Json(req): Json<NewVersionRequest>,
) -> Result<(StatusCode, Json<DocumentDetail>), DocVaultError> {
    let file = UploadPayload {
        file_name: req.file_name,
        content_base64: req.content_base64,
    }
    .decode()?;

    let detail = state
        .documents
        .commit_version(CommitVersionRequest {
            document_id: Some(document_id),
            title: req.title,
            document_type_id: req.document_type_id,
            metadata: req.metadata,
            file: Some(file),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(detail)))
}

/// PUT /api/documents/:id
/// Edit title/type/metadata without creating a new version
async fn update_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
    Json(req): Json<UpdateDocumentRequest>,
) -> Result<Json<DocumentDetail>, DocVaultError> {
    let detail = state
        .documents
        .commit_version(CommitVersionRequest {
            document_id: Some(document_id),
            title: req.title,
            document_type_id: req.document_type_id,
            metadata: req.metadata,
            file: None,
        })
        .await?;

    Ok(Json(detail))
}

/// GET /api/documents
/// List documents with pagination, title search, and type filter
async fn list_documents(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<DocumentPage>, DocVaultError> {
    let defaults = ListDocumentsParams::default();
    let page = state
        .documents
        .list_documents(ListDocumentsParams {
            page: query.page.unwrap_or(defaults.page),
            limit: query.limit.unwrap_or(defaults.limit),
            search: query.search,
            document_type_id: query.document_type_id,
        })
        .await?;

    Ok(Json(page))
}

/// GET /api/documents/:id
/// Get a document with its version history and latest metadata snapshot
async fn get_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<DocumentDetail>, DocVaultError> {
    let detail = state.documents.get_document(document_id).await?;
    Ok(Json(detail))
}

/// GET /api/documents/:id/download?version_id=...
/// Download a version's file, defaulting to the latest version
async fn download_version(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, DocVaultError> {
    let download = state
        .documents
        .download_version(document_id, query.version_id)
        .await?;

    let headers = [
        (
            header::CONTENT_TYPE,
            "application/octet-stream".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", download.file_name),
        ),
    ];

    Ok((headers, download.bytes).into_response())
}

/// DELETE /api/documents/:id
/// Delete a document, its versions, and their stored files
async fn delete_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<DeleteOutcome>, DocVaultError> {
    let outcome = state.documents.delete_document(document_id).await?;
    Ok(Json(outcome))
}

// ============================================================================
// Router Factory
// ============================================================================

/// Create the document router with all endpoints
pub fn create_document_router(state: AppState) -> Router {
    Router::new()
        .route("/api/documents", post(create_document).get(list_documents))
        .route(
            "/api/documents/:id",
            get(get_document)
                .put(update_document)
                .delete(delete_document),
        )
        .route("/api/documents/:id/versions", post(upload_version))
        .route("/api/documents/:id/download", get(download_version))
        .with_state(state)
}
