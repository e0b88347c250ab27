//! Document type repository
//!
//! Database access layer for document types and their field associations.

use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{AssociatedField, AssociationInput, DocumentType, MetadataField};

/// Repository for document type operations
#[derive(Clone)]
pub struct DocumentTypeRepository {
    pool: PgPool,
}

impl DocumentTypeRepository {
    /// Create a new document type repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new document type
    pub async fn insert(&self, doc_type: &DocumentType) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO document_types (id, name, description, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(doc_type.id)
        .bind(&doc_type.name)
        .bind(&doc_type.description)
        .bind(doc_type.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a document type by ID
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<DocumentType>, sqlx::Error> {
        sqlx::query_as::<_, DocumentType>(
            r#"
            SELECT id, name, description, created_at
            FROM document_types
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Get a document type by its unique name
    pub async fn get_by_name(&self, name: &str) -> Result<Option<DocumentType>, sqlx::Error> {
        sqlx::query_as::<_, DocumentType>(
            r#"
            SELECT id, name, description, created_at
            FROM document_types
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
    }

    /// Get all document types
    pub async fn get_all(&self) -> Result<Vec<DocumentType>, sqlx::Error> {
        sqlx::query_as::<_, DocumentType>(
            r#"
            SELECT id, name, description, created_at
            FROM document_types
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Delete a document type; its association rows cascade
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM document_types WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get the ordered field associations for a type, with field definitions
    pub async fn get_associated_fields(
        &self,
        type_id: Uuid,
    ) -> Result<Vec<AssociatedField>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT
                f.id, f.name, f.display_name, f.description, f.field_type,
                f.enum_values, f.is_multi_valued, f.created_at,
                a.is_required, a.position
            FROM document_type_fields a
            JOIN metadata_fields f ON f.id = a.metadata_field_id
            WHERE a.document_type_id = $1
            ORDER BY a.position, f.name
            "#,
        )
        .bind(type_id)
        .fetch_all(&self.pool)
        .await?;

        let mut fields = Vec::new();
        for row in rows {
            let field_type_str: String = row.get("field_type");
            let field_type = field_type_str.parse().map_err(|e: String| {
                sqlx::Error::Decode(Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    e,
                )))
            })?;

            fields.push(AssociatedField {
                field: MetadataField {
                    id: row.get("id"),
                    name: row.get("name"),
                    display_name: row.get("display_name"),
                    description: row.get("description"),
                    field_type,
                    enum_values: row.get("enum_values"),
                    is_multi_valued: row.get("is_multi_valued"),
                    created_at: row.get("created_at"),
                },
                is_required: row.get("is_required"),
                position: row.get("position"),
            });
        }

        Ok(fields)
    }

    /// Replace the full association set for a type atomically
    pub async fn replace_associations(
        &self,
        type_id: Uuid,
        associations: &[AssociationInput],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM document_type_fields WHERE document_type_id = $1")
            .bind(type_id)
            .execute(&mut *tx)
            .await?;

        for (position, assoc) in associations.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO document_type_fields
                    (document_type_id, metadata_field_id, is_required, position)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(type_id)
            .bind(assoc.metadata_field_id)
            .bind(assoc.is_required)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Count documents currently referencing this type
    pub async fn document_count(&self, type_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM documents
            WHERE document_type_id = $1
            "#,
        )
        .bind(type_id)
        .fetch_one(&self.pool)
        .await
    }
}
