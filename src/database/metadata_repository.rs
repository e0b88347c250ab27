//! Metadata field repository
//!
//! Database access layer for the metadata field registry.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::MetadataField;

/// Repository for metadata field definitions
#[derive(Clone)]
pub struct MetadataFieldRepository {
    pool: PgPool,
}

/// Parse the `field_type` tag column while mapping a row
fn map_field_row(row: &PgRow) -> Result<MetadataField, sqlx::Error> {
    let field_type_str: String = row.get("field_type");
    let field_type = field_type_str.parse().map_err(|e: String| {
        sqlx::Error::Decode(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e,
        )))
    })?;

    Ok(MetadataField {
        id: row.get("id"),
        name: row.get("name"),
        display_name: row.get("display_name"),
        description: row.get("description"),
        field_type,
        enum_values: row.get("enum_values"),
        is_multi_valued: row.get("is_multi_valued"),
        created_at: row.get("created_at"),
    })
}

impl MetadataFieldRepository {
    /// Create a new metadata field repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new field definition
    pub async fn insert(&self, field: &MetadataField) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO metadata_fields
                (id, name, display_name, description, field_type, enum_values, is_multi_valued, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(field.id)
        .bind(&field.name)
        .bind(&field.display_name)
        .bind(&field.description)
        .bind(field.field_type.as_str())
        .bind(&field.enum_values)
        .bind(field.is_multi_valued)
        .bind(field.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a field by ID
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<MetadataField>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, name, display_name, description, field_type, enum_values, is_multi_valued, created_at
            FROM metadata_fields
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_field_row).transpose()
    }

    /// Get a field by its unique name
    pub async fn get_by_name(&self, name: &str) -> Result<Option<MetadataField>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, name, display_name, description, field_type, enum_values, is_multi_valued, created_at
            FROM metadata_fields
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_field_row).transpose()
    }

    /// Get all field definitions
    pub async fn get_all(&self) -> Result<Vec<MetadataField>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, display_name, description, field_type, enum_values, is_multi_valued, created_at
            FROM metadata_fields
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_field_row).collect()
    }

    /// Write back the editable columns of a field definition
    pub async fn update(&self, field: &MetadataField) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE metadata_fields
            SET display_name = $1, description = $2, enum_values = $3, is_multi_valued = $4
            WHERE id = $5
            "#,
        )
        .bind(&field.display_name)
        .bind(&field.description)
        .bind(&field.enum_values)
        .bind(field.is_multi_valued)
        .bind(field.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a field definition
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM metadata_fields WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count document-type associations referencing this field
    pub async fn association_count(&self, field_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM document_type_fields
            WHERE metadata_field_id = $1
            "#,
        )
        .bind(field_id)
        .fetch_one(&self.pool)
        .await
    }

    /// Of the given ids, return those that exist in the registry
    pub async fn existing_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT id
            FROM metadata_fields
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
    }
}
