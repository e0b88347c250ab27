//! REST API routes for the metadata field and document type registries
//!
//! All database access goes through MetadataService.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post, put};
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::AppState;
use crate::error::DocVaultError;
use crate::models::{
    AssociationInput, DocumentType, DocumentTypeDetail, FieldPatch, FieldSpec, MetadataField,
};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateTypeRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub field_associations: Vec<AssociationInput>,
}

#[derive(Debug, Deserialize)]
pub struct AssociationUpdateRequest {
    pub field_associations: Vec<AssociationInput>,
}

// ============================================================================
// Metadata field handlers
// ============================================================================

/// POST /api/metadata-fields
async fn create_field(
    State(state): State<AppState>,
    Json(spec): Json<FieldSpec>,
) -> Result<(StatusCode, Json<MetadataField>), DocVaultError> {
    let field = state.metadata.create_field(spec).await?;
    Ok((StatusCode::CREATED, Json(field)))
}

/// GET /api/metadata-fields
async fn list_fields(
    State(state): State<AppState>,
) -> Result<Json<Vec<MetadataField>>, DocVaultError> {
    Ok(Json(state.metadata.list_fields().await?))
}

/// GET /api/metadata-fields/:id
async fn get_field(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MetadataField>, DocVaultError> {
    Ok(Json(state.metadata.get_field(id).await?))
}

/// PUT /api/metadata-fields/:id
async fn update_field(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<FieldPatch>,
) -> Result<Json<MetadataField>, DocVaultError> {
    Ok(Json(state.metadata.update_field(id, patch).await?))
}

/// DELETE /api/metadata-fields/:id
async fn delete_field(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, DocVaultError> {
    state.metadata.delete_field(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Document type handlers
// ============================================================================

/// POST /api/document-types
async fn create_type(
    State(state): State<AppState>,
    Json(req): Json<CreateTypeRequest>,
) -> Result<(StatusCode, Json<DocumentTypeDetail>), DocVaultError> {
    let detail = state
        .metadata
        .create_type(&req.name, req.description, req.field_associations)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /api/document-types
async fn list_types(
    State(state): State<AppState>,
) -> Result<Json<Vec<DocumentType>>, DocVaultError> {
    Ok(Json(state.metadata.list_types().await?))
}

/// GET /api/document-types/:id
async fn get_type(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentTypeDetail>, DocVaultError> {
    Ok(Json(state.metadata.get_type(id).await?))
}

/// PUT /api/document-types/:id/fields
/// Replace the type's full field association set
async fn update_type_fields(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssociationUpdateRequest>,
) -> Result<Json<DocumentTypeDetail>, DocVaultError> {
    Ok(Json(
        state
            .metadata
            .update_field_associations(id, req.field_associations)
            .await?,
    ))
}

/// DELETE /api/document-types/:id
async fn delete_type(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, DocVaultError> {
    state.metadata.delete_type(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Router Factory
// ============================================================================

/// Create the registry router with all endpoints
pub fn create_metadata_router(state: AppState) -> Router {
    Router::new()
        .route("/api/metadata-fields", post(create_field).get(list_fields))
        .route(
            "/api/metadata-fields/:id",
            get(get_field).put(update_field).delete(delete_field),
        )
        .route("/api/document-types", post(create_type).get(list_types))
        .route(
            "/api/document-types/:id",
            get(get_type).delete(delete_type),
        )
        .route("/api/document-types/:id/fields", put(update_type_fields))
        .with_state(state)
}
