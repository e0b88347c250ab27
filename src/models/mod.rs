//! Data models for documents, versions, and the metadata registries

pub mod document_models;
pub mod metadata_models;

pub use document_models::{Document, DocumentDetail, DocumentVersion, MetadataValue};
pub use metadata_models::{
    AssociatedField, AssociationInput, DocumentType, DocumentTypeDetail, FieldPatch, FieldSpec,
    FieldType, MetadataField,
};
