//! Document and version repository
//!
//! Database access layer for documents, their version history, and the
//! per-version metadata snapshots. The write path runs inside a caller-owned
//! transaction so a version row, its snapshot, and the document update
//! commit or roll back together.

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::{Document, DocumentVersion, MetadataValue};

/// Repository for document, version, and snapshot rows
#[derive(Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    /// Create a new document repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a document by ID
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Document>, sqlx::Error> {
        sqlx::query_as::<_, Document>(
            r#"
            SELECT id, title, document_type_id, created_at, updated_at
            FROM documents
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// List documents, newest first, with optional title search and type
    /// filter
    pub async fn list(
        &self,
        search: Option<&str>,
        document_type_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Document>, sqlx::Error> {
        sqlx::query_as::<_, Document>(
            r#"
            SELECT id, title, document_type_id, created_at, updated_at
            FROM documents
            WHERE ($1::text IS NULL OR title ILIKE '%' || $1 || '%')
              AND ($2::uuid IS NULL OR document_type_id = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(search)
        .bind(document_type_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    /// Count documents matching the same filters as [`list`](Self::list)
    pub async fn count(
        &self,
        search: Option<&str>,
        document_type_id: Option<Uuid>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM documents
            WHERE ($1::text IS NULL OR title ILIKE '%' || $1 || '%')
              AND ($2::uuid IS NULL OR document_type_id = $2)
            "#,
        )
        .bind(search)
        .bind(document_type_id)
        .fetch_one(&self.pool)
        .await
    }

    /// All versions of a document in version order
    pub async fn versions_for(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<DocumentVersion>, sqlx::Error> {
        sqlx::query_as::<_, DocumentVersion>(
            r#"
            SELECT id, document_id, version_number, storage_key, file_name,
                   file_size, file_hash, created_at
            FROM document_versions
            WHERE document_id = $1
            ORDER BY version_number
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
    }

    /// The highest-numbered version of a document
    pub async fn latest_version(
        &self,
        document_id: Uuid,
    ) -> Result<Option<DocumentVersion>, sqlx::Error> {
        sqlx::query_as::<_, DocumentVersion>(
            r#"
            SELECT id, document_id, version_number, storage_key, file_name,
                   file_size, file_hash, created_at
            FROM document_versions
            WHERE document_id = $1
            ORDER BY version_number DESC
            LIMIT 1
            "#,
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// A specific version of a document
    pub async fn get_version(
        &self,
        document_id: Uuid,
        version_id: Uuid,
    ) -> Result<Option<DocumentVersion>, sqlx::Error> {
        sqlx::query_as::<_, DocumentVersion>(
            r#"
            SELECT id, document_id, version_number, storage_key, file_name,
                   file_size, file_hash, created_at
            FROM document_versions
            WHERE document_id = $1 AND id = $2
            "#,
        )
        .bind(document_id)
        .bind(version_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// The metadata snapshot of a version, joined with field names
    pub async fn metadata_for_version(
        &self,
        version_id: Uuid,
    ) -> Result<Vec<MetadataValue>, sqlx::Error> {
        sqlx::query_as::<_, MetadataValue>(
            r#"
            SELECT m.version_id, m.field_id, f.name AS field_name, m.value
            FROM document_metadata m
            JOIN metadata_fields f ON f.id = m.field_id
            WHERE m.version_id = $1
            ORDER BY f.name
            "#,
        )
        .bind(version_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Delete a document; versions and snapshots cascade in the same
    /// statement
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ------------------------------------------------------------------
    // Transactional write path
    // ------------------------------------------------------------------

    /// Insert a new document row
    pub async fn insert_document(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        document: &Document,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, title, document_type_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(document.id)
        .bind(&document.title)
        .bind(document.document_type_id)
        .bind(document.created_at)
        .bind(document.updated_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Load and row-lock a document, serializing concurrent version commits
    pub async fn lock_document(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Document>, sqlx::Error> {
        sqlx::query_as::<_, Document>(
            r#"
            SELECT id, title, document_type_id, created_at, updated_at
            FROM documents
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
    }

    /// Update a document's title and type, stamping `updated_at`
    pub async fn update_document(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        title: &str,
        document_type_id: Option<Uuid>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE documents
            SET title = $1, document_type_id = $2, updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(title)
        .bind(document_type_id)
        .bind(id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Next version number for a document
    ///
    /// Callers must hold the document row lock; the unique constraint on
    /// `(document_id, version_number)` is the database-level backstop.
    pub async fn next_version_number(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        document_id: Uuid,
    ) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT COALESCE(MAX(version_number), 0) + 1
            FROM document_versions
            WHERE document_id = $1
            "#,
        )
        .bind(document_id)
        .fetch_one(&mut **tx)
        .await
    }

    /// Insert a version row
    pub async fn insert_version(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        version: &DocumentVersion,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO document_versions
                (id, document_id, version_number, storage_key, file_name, file_size, file_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(version.id)
        .bind(version.document_id)
        .bind(version.version_number)
        .bind(&version.storage_key)
        .bind(&version.file_name)
        .bind(version.file_size)
        .bind(&version.file_hash)
        .bind(version.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// The latest version id of a document, inside the transaction
    pub async fn latest_version_id(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        document_id: Uuid,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT id
            FROM document_versions
            WHERE document_id = $1
            ORDER BY version_number DESC
            LIMIT 1
            "#,
        )
        .bind(document_id)
        .fetch_optional(&mut **tx)
        .await
    }

    /// A version's raw snapshot rows `(field_id, value)`, inside the
    /// transaction
    pub async fn snapshot_rows(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        version_id: Uuid,
    ) -> Result<Vec<(Uuid, String)>, sqlx::Error> {
        sqlx::query_as::<_, (Uuid, String)>(
            r#"
            SELECT field_id, value
            FROM document_metadata
            WHERE version_id = $1
            "#,
        )
        .bind(version_id)
        .fetch_all(&mut **tx)
        .await
    }

    /// Replace a version's metadata snapshot with the given rows
    pub async fn replace_version_metadata(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        version_id: Uuid,
        rows: &[(Uuid, String)],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM document_metadata WHERE version_id = $1")
            .bind(version_id)
            .execute(&mut **tx)
            .await?;

        for (field_id, value) in rows {
            sqlx::query(
                r#"
                INSERT INTO document_metadata (version_id, field_id, value)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(version_id)
            .bind(field_id)
            .bind(value)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}
