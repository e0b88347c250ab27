//! Metadata field and document type registries
//!
//! Service layer over the registry repositories: uniqueness and enum-shape
//! checks on the way in, referential-integrity rejection on the way out.
//! Definitions are read through the pool on every call; the database stays
//! the single source of truth.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::database::{DocumentTypeRepository, MetadataFieldRepository};
use crate::error::{ConflictError, DocVaultError, DocVaultResult, ValidationError, ViolationCollector};
use crate::models::{
    AssociationInput, DocumentType, DocumentTypeDetail, FieldPatch, FieldSpec, FieldType,
    MetadataField,
};

/// Service for metadata field and document type operations
#[derive(Clone)]
pub struct MetadataService {
    fields: MetadataFieldRepository,
    types: DocumentTypeRepository,
}

impl MetadataService {
    /// Create a new metadata service
    pub fn new(pool: PgPool) -> Self {
        Self {
            fields: MetadataFieldRepository::new(pool.clone()),
            types: DocumentTypeRepository::new(pool),
        }
    }

    // ------------------------------------------------------------------
    // Metadata field registry
    // ------------------------------------------------------------------

    /// Create a metadata field definition
    pub async fn create_field(&self, spec: FieldSpec) -> DocVaultResult<MetadataField> {
        let mut collector = ViolationCollector::new();

        if spec.name.trim().is_empty() {
            collector.add("name", "must not be empty");
        }
        match spec.field_type {
            FieldType::Enum if spec.enum_values.is_empty() => {
                collector.add("enum_values", "enum fields require at least one value");
            }
            FieldType::Enum => {}
            _ if !spec.enum_values.is_empty() => {
                collector.add("enum_values", "only enum fields may carry enum values");
            }
            _ => {}
        }

        if !spec.name.trim().is_empty() && self.fields.get_by_name(spec.name.trim()).await?.is_some()
        {
            collector.add(
                "name",
                format!("a metadata field named '{}' already exists", spec.name.trim()),
            );
        }

        collector.into_result(())?;

        let field = MetadataField {
            id: Uuid::new_v4(),
            name: spec.name.trim().to_string(),
            display_name: spec.display_name,
            description: spec.description,
            field_type: spec.field_type,
            enum_values: join_enum_values(&spec.enum_values),
            is_multi_valued: spec.is_multi_valued,
            created_at: chrono::Utc::now(),
        };
        self.fields.insert(&field).await?;

        info!("Created metadata field '{}' ({})", field.name, field.id);
        Ok(field)
    }

    /// Get a metadata field by ID
    pub async fn get_field(&self, id: Uuid) -> DocVaultResult<MetadataField> {
        self.fields
            .get_by_id(id)
            .await?
            .ok_or_else(|| DocVaultError::not_found("metadata field", id))
    }

    /// All metadata fields, ordered by name
    pub async fn list_fields(&self) -> DocVaultResult<Vec<MetadataField>> {
        Ok(self.fields.get_all().await?)
    }

    /// Apply a partial update to a field definition
    ///
    /// Identity and type tag are immutable; edits are never applied
    /// retroactively to stored metadata values.
    pub async fn update_field(&self, id: Uuid, patch: FieldPatch) -> DocVaultResult<MetadataField> {
        let mut field = self.get_field(id).await?;

        if let Some(display_name) = patch.display_name {
            field.display_name = display_name;
        }
        if let Some(description) = patch.description {
            field.description = Some(description);
        }
        if let Some(is_multi_valued) = patch.is_multi_valued {
            field.is_multi_valued = is_multi_valued;
        }
        if let Some(enum_values) = patch.enum_values {
            match field.field_type {
                FieldType::Enum if enum_values.is_empty() => {
                    return Err(ValidationError::single(
                        "enum_values",
                        "enum fields require at least one value",
                    )
                    .into());
                }
                FieldType::Enum => field.enum_values = join_enum_values(&enum_values),
                _ => {
                    return Err(ValidationError::single(
                        "enum_values",
                        "only enum fields may carry enum values",
                    )
                    .into());
                }
            }
        }

        self.fields.update(&field).await?;
        info!("Updated metadata field '{}' ({})", field.name, field.id);
        Ok(field)
    }

    /// Delete a field definition
    ///
    /// Rejected while any document type still references the field.
    pub async fn delete_field(&self, id: Uuid) -> DocVaultResult<()> {
        let field = self.get_field(id).await?;

        let count = self.fields.association_count(id).await?;
        if count > 0 {
            return Err(ConflictError::FieldInUse {
                name: field.name,
                count,
            }
            .into());
        }

        self.fields.delete(id).await?;
        info!("Deleted metadata field '{}' ({})", field.name, id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Document type registry
    // ------------------------------------------------------------------

    /// Create a document type with its field associations
    pub async fn create_type(
        &self,
        name: &str,
        description: Option<String>,
        associations: Vec<AssociationInput>,
    ) -> DocVaultResult<DocumentTypeDetail> {
        let name = name.trim();
        let mut collector = ViolationCollector::new();

        if name.is_empty() {
            collector.add("name", "must not be empty");
        } else if self.types.get_by_name(name).await?.is_some() {
            collector.add("name", format!("a document type named '{name}' already exists"));
        }
        self.check_associations(&associations, &mut collector).await?;
        collector.into_result(())?;

        let doc_type = DocumentType {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description,
            created_at: chrono::Utc::now(),
        };
        self.types.insert(&doc_type).await?;
        self.types
            .replace_associations(doc_type.id, &associations)
            .await?;

        info!(
            "Created document type '{}' ({}) with {} field association(s)",
            doc_type.name,
            doc_type.id,
            associations.len()
        );
        self.get_type(doc_type.id).await
    }

    /// Get a document type with its ordered field associations
    pub async fn get_type(&self, id: Uuid) -> DocVaultResult<DocumentTypeDetail> {
        let document_type = self
            .types
            .get_by_id(id)
            .await?
            .ok_or_else(|| DocVaultError::not_found("document type", id))?;
        let fields = self.types.get_associated_fields(id).await?;

        Ok(DocumentTypeDetail {
            document_type,
            fields,
        })
    }

    /// All document types, ordered by name
    pub async fn list_types(&self) -> DocVaultResult<Vec<DocumentType>> {
        Ok(self.types.get_all().await?)
    }

    /// Replace the full association set for a type
    ///
    /// A replacement, not a merge; existing documents of the type are not
    /// revalidated.
    pub async fn update_field_associations(
        &self,
        type_id: Uuid,
        associations: Vec<AssociationInput>,
    ) -> DocVaultResult<DocumentTypeDetail> {
        let detail = self.get_type(type_id).await?;

        let mut collector = ViolationCollector::new();
        self.check_associations(&associations, &mut collector).await?;
        collector.into_result(())?;

        self.types
            .replace_associations(type_id, &associations)
            .await?;

        info!(
            "Replaced field associations of document type '{}' ({}): {} association(s)",
            detail.document_type.name,
            type_id,
            associations.len()
        );
        self.get_type(type_id).await
    }

    /// Delete a document type
    ///
    /// Rejected while any document still references the type; callers must
    /// reassign or delete those documents first.
    pub async fn delete_type(&self, id: Uuid) -> DocVaultResult<()> {
        let detail = self.get_type(id).await?;

        let count = self.types.document_count(id).await?;
        if count > 0 {
            return Err(ConflictError::TypeInUse {
                name: detail.document_type.name,
                count,
            }
            .into());
        }

        self.types.delete(id).await?;
        info!("Deleted document type '{}' ({})", detail.document_type.name, id);
        Ok(())
    }

    async fn check_associations(
        &self,
        associations: &[AssociationInput],
        collector: &mut ViolationCollector,
    ) -> DocVaultResult<()> {
        let ids: Vec<Uuid> = associations.iter().map(|a| a.metadata_field_id).collect();

        let mut seen = std::collections::HashSet::new();
        for id in &ids {
            if !seen.insert(*id) {
                collector.add("field_associations", format!("duplicate field association {id}"));
            }
        }

        if !ids.is_empty() {
            let existing = self.fields.existing_ids(&ids).await?;
            for id in &ids {
                if !existing.contains(id) {
                    collector.add("field_associations", format!("unknown metadata field {id}"));
                }
            }
        }

        Ok(())
    }
}

fn join_enum_values(values: &[String]) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        Some(
            values
                .iter()
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_enum_values() {
        assert_eq!(join_enum_values(&[]), None);
        assert_eq!(
            join_enum_values(&[" HR ".to_string(), "Legal".to_string()]),
            Some("HR,Legal".to_string())
        );
    }
}
