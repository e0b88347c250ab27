//! Metadata field and document type models
//!
//! Field definitions are typed by a text tag column; the tag is parsed into
//! [`FieldType`] at the repository boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Value type tag for a metadata field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Integer,
    Date,
    Boolean,
    Enum,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
            FieldType::Enum => "enum",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(FieldType::Text),
            "integer" => Ok(FieldType::Integer),
            "date" => Ok(FieldType::Date),
            "boolean" => Ok(FieldType::Boolean),
            "enum" => Ok(FieldType::Enum),
            other => Err(format!("unknown field type '{other}'")),
        }
    }
}

/// A metadata field definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataField {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub field_type: FieldType,
    /// Comma-separated member list; present iff `field_type` is `enum`
    pub enum_values: Option<String>,
    pub is_multi_valued: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl MetadataField {
    /// The enum member list, empty for non-enum fields
    pub fn allowed_values(&self) -> Vec<String> {
        self.enum_values
            .as_deref()
            .map(|csv| {
                csv.split(',')
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Input for creating a metadata field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub field_type: FieldType,
    #[serde(default)]
    pub enum_values: Vec<String>,
    #[serde(default)]
    pub is_multi_valued: bool,
}

/// Partial update for a metadata field; identity and type tag are immutable
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldPatch {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub enum_values: Option<Vec<String>>,
    #[serde(default)]
    pub is_multi_valued: Option<bool>,
}

/// A document type (named category)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocumentType {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A field associated with a document type, carrying the per-pair flag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociatedField {
    #[serde(flatten)]
    pub field: MetadataField,
    pub is_required: bool,
    pub position: i32,
}

/// Association input used when creating a type or replacing its field set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociationInput {
    pub metadata_field_id: Uuid,
    #[serde(default)]
    pub is_required: bool,
}

/// A document type together with its ordered field associations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentTypeDetail {
    #[serde(flatten)]
    pub document_type: DocumentType,
    pub fields: Vec<AssociatedField>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_round_trip() {
        for tag in ["text", "integer", "date", "boolean", "enum"] {
            let parsed: FieldType = tag.parse().unwrap();
            assert_eq!(parsed.to_string(), tag);
        }
        assert!("float".parse::<FieldType>().is_err());
    }

    #[test]
    fn test_allowed_values_splits_and_trims() {
        let field = MetadataField {
            id: Uuid::new_v4(),
            name: "department".to_string(),
            display_name: "Department".to_string(),
            description: None,
            field_type: FieldType::Enum,
            enum_values: Some("HR, Finance ,Legal".to_string()),
            is_multi_valued: false,
            created_at: chrono::Utc::now(),
        };
        assert_eq!(field.allowed_values(), vec!["HR", "Finance", "Legal"]);
    }

    #[test]
    fn test_allowed_values_empty_for_non_enum() {
        let field = MetadataField {
            id: Uuid::new_v4(),
            name: "tags".to_string(),
            display_name: "Tags".to_string(),
            description: None,
            field_type: FieldType::Text,
            enum_values: None,
            is_multi_valued: true,
            created_at: chrono::Utc::now(),
        };
        assert!(field.allowed_values().is_empty());
    }
}
