//! REST API module
//!
//! Thin HTTP layer over the service layer: routers, request/response DTOs,
//! and the mapping from [`DocVaultError`] to status codes. No business
//! rules live here.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use sqlx::PgPool;

use crate::error::{DocVaultError, FieldViolation, StorageError};
use crate::services::{DocumentService, MetadataService};
use crate::storage::FileStorage;

pub mod document_routes;
pub mod metadata_routes;

pub use document_routes::create_document_router;
pub use metadata_routes::create_metadata_router;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub documents: DocumentService,
    pub metadata: MetadataService,
}

impl AppState {
    pub fn new(pool: PgPool, storage: Arc<dyn FileStorage>) -> Self {
        Self {
            documents: DocumentService::new(pool.clone(), storage),
            metadata: MetadataService::new(pool),
        }
    }
}

/// Standard JSON error response body
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    /// Stable machine-readable error code
    pub code: &'static str,
    /// Human-readable message (safe for clients)
    pub message: String,
    /// Per-field details for validation failures
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<FieldViolation>,
}

impl IntoResponse for DocVaultError {
    fn into_response(self) -> Response {
        let (status, code, message, violations) = match &self {
            DocVaultError::NotFound { .. } => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string(), Vec::new())
            }
            DocVaultError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED",
                self.to_string(),
                err.violations.clone(),
            ),
            DocVaultError::Conflict(_) => {
                (StatusCode::CONFLICT, "CONFLICT", self.to_string(), Vec::new())
            }
            DocVaultError::Storage(StorageError::KeyNotFound { .. }) => (
                StatusCode::NOT_FOUND,
                "FILE_NOT_FOUND",
                self.to_string(),
                Vec::new(),
            ),
            DocVaultError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE",
                "file storage is unavailable".to_string(),
                Vec::new(),
            ),
            DocVaultError::Database(err) => {
                tracing::error!("database error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE",
                    "internal database error".to_string(),
                    Vec::new(),
                )
            }
        };

        (
            status,
            Json(ApiErrorBody {
                code,
                message,
                violations,
            }),
        )
            .into_response()
    }
}

/// GET /api/health
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "docvault",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Create the full API router with all endpoints
pub fn create_api_router(pool: PgPool, storage: Arc<dyn FileStorage>) -> Router {
    let state = AppState::new(pool, storage);

    Router::new()
        .merge(create_document_router(state.clone()))
        .merge(create_metadata_router(state))
        .route("/api/health", get(health_check))
}
