//! Database seeder for populating a fresh instance with realistic data
//!
//! Everything goes through the service layer so seeded rows satisfy the
//! same validation as API traffic. Safe to run repeatedly: existing
//! fields/types are reused and documents are only created into an empty
//! store.

use std::collections::BTreeMap;
use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::database::MetadataFieldRepository;
use crate::error::DocVaultResult;
use crate::models::{AssociationInput, FieldSpec, FieldType};
use crate::services::{DocumentService, FileUpload, MetadataInput, MetadataService};
use crate::storage::FileStorage;

/// What the seeder created (or found already present)
#[derive(Debug, Clone)]
pub struct SeedSummary {
    pub fields: usize,
    pub types: usize,
    pub documents: usize,
}

/// Populate the standard field set, a few document types, and sample
/// documents
pub async fn seed(pool: &PgPool, storage: Arc<dyn FileStorage>) -> DocVaultResult<SeedSummary> {
    let fields = MetadataFieldRepository::new(pool.clone());
    let metadata = MetadataService::new(pool.clone());
    let documents = DocumentService::new(pool.clone(), storage);

    let field_specs = [
        FieldSpec {
            name: "department".to_string(),
            display_name: "Department".to_string(),
            description: Some("Department that owns the document".to_string()),
            field_type: FieldType::Enum,
            enum_values: ["HR", "Finance", "Legal", "Engineering", "Marketing"]
                .map(String::from)
                .to_vec(),
            is_multi_valued: false,
        },
        FieldSpec {
            name: "document_date".to_string(),
            display_name: "Document Date".to_string(),
            description: Some("Date of document creation".to_string()),
            field_type: FieldType::Date,
            enum_values: Vec::new(),
            is_multi_valued: false,
        },
        FieldSpec {
            name: "confidential".to_string(),
            display_name: "Confidential".to_string(),
            description: Some("Whether the document is confidential".to_string()),
            field_type: FieldType::Boolean,
            enum_values: Vec::new(),
            is_multi_valued: false,
        },
        FieldSpec {
            name: "tags".to_string(),
            display_name: "Tags".to_string(),
            description: Some("Document tags".to_string()),
            field_type: FieldType::Text,
            enum_values: Vec::new(),
            is_multi_valued: true,
        },
        FieldSpec {
            name: "revision_number".to_string(),
            display_name: "Revision Number".to_string(),
            description: Some("Document revision number".to_string()),
            field_type: FieldType::Integer,
            enum_values: Vec::new(),
            is_multi_valued: false,
        },
    ];

    let mut field_ids: BTreeMap<String, Uuid> = BTreeMap::new();
    let mut created_fields = 0;
    for spec in field_specs {
        let name = spec.name.clone();
        let id = match fields.get_by_name(&name).await? {
            Some(existing) => existing.id,
            None => {
                created_fields += 1;
                metadata.create_field(spec).await?.id
            }
        };
        field_ids.insert(name, id);
    }

    let type_specs: [(&str, &str, &[(&str, bool)]); 3] = [
        (
            "Contract",
            "Legal agreements and contracts",
            &[("department", true), ("document_date", true), ("confidential", false)],
        ),
        (
            "Report",
            "Internal and external reports",
            &[("department", true), ("tags", false)],
        ),
        (
            "Invoice",
            "Billing documents",
            &[("document_date", true), ("revision_number", false)],
        ),
    ];

    let mut type_ids: BTreeMap<&str, Uuid> = BTreeMap::new();
    let mut created_types = 0;
    for (name, description, associations) in type_specs {
        let existing = metadata
            .list_types()
            .await?
            .into_iter()
            .find(|t| t.name == name);
        let id = match existing {
            Some(doc_type) => doc_type.id,
            None => {
                created_types += 1;
                let associations: Vec<AssociationInput> = associations
                    .iter()
                    .map(|(field_name, is_required)| AssociationInput {
                        metadata_field_id: field_ids[*field_name],
                        is_required: *is_required,
                    })
                    .collect();
                metadata
                    .create_type(name, Some(description.to_string()), associations)
                    .await?
                    .document_type
                    .id
            }
        };
        type_ids.insert(name, id);
    }

    let mut created_documents = 0;
    let existing_documents = documents.list_documents(Default::default()).await?;
    if existing_documents.total == 0 {
        let samples: [(&str, &str, &[(&str, &str)], &str); 3] = [
            (
                "Office Lease Agreement",
                "Contract",
                &[
                    ("department", "Legal"),
                    ("document_date", "2026-01-15"),
                    ("confidential", "true"),
                ],
                "Lease agreement for the downtown office, term of 36 months.\n",
            ),
            (
                "Q2 Engineering Report",
                "Report",
                &[("department", "Engineering")],
                "# Q2 Engineering Report\n\nShipping velocity held steady through the quarter.\n",
            ),
            (
                "Invoice 2026-0042",
                "Invoice",
                &[("document_date", "2026-06-30"), ("revision_number", "1")],
                "Invoice 2026-0042\nAmount due: 1,250.00\n",
            ),
        ];

        for (title, type_name, values, body) in samples {
            let metadata_values: BTreeMap<String, MetadataInput> = values
                .iter()
                .map(|(k, v)| (k.to_string(), MetadataInput::One(v.to_string())))
                .collect();
            let file_name = format!(
                "{}.md",
                title.to_lowercase().replace(' ', "_").replace('/', "-")
            );

            documents
                .create_document(
                    title,
                    Some(type_ids[type_name]),
                    Some(metadata_values),
                    Some(FileUpload {
                        file_name,
                        bytes: body.as_bytes().to_vec(),
                    }),
                )
                .await?;
            created_documents += 1;
        }
    }

    info!(
        "Seed complete: {} field(s), {} type(s), {} document(s) created",
        created_fields, created_types, created_documents
    );

    Ok(SeedSummary {
        fields: created_fields,
        types: created_types,
        documents: created_documents,
    })
}
