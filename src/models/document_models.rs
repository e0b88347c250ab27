//! Document and version models
//!
//! A document owns an ordered sequence of versions; each version owns a
//! stored file reference and a snapshot of metadata values.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A document row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub document_type_id: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// An immutable version of a document's file at a point in time
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocumentVersion {
    pub id: Uuid,
    pub document_id: Uuid,
    /// 1-based, gap-free, strictly increasing per document
    pub version_number: i32,
    /// Opaque handle into the file store; null when no file is attached
    pub storage_key: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    /// SHA-256 hex digest of the stored content
    pub file_hash: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A metadata value from a version's snapshot, joined with its field name
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MetadataValue {
    pub version_id: Uuid,
    pub field_id: Uuid,
    pub field_name: String,
    pub value: String,
}

/// A document with its full version history and the latest snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentDetail {
    #[serde(flatten)]
    pub document: Document,
    pub versions: Vec<DocumentVersion>,
    /// Snapshot of the latest version, empty when no metadata is set
    pub metadata: Vec<MetadataValue>,
}

impl DocumentDetail {
    /// The highest-numbered version, if any exist
    pub fn latest_version(&self) -> Option<&DocumentVersion> {
        self.versions.iter().max_by_key(|v| v.version_number)
    }
}
