//! Typed metadata validation
//!
//! Pure validation of supplied metadata values against a document type's
//! field associations. One parse function per field type, selected by the
//! field's type tag; every violation is collected before failing so the
//! caller reports them all at once.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ValidationError, ViolationCollector};
use crate::models::{AssociatedField, FieldType, MetadataField};

/// Separator used when a multi-valued input is flattened into its stored
/// snapshot column; the same convention as the `enum_values` column.
pub const MULTI_VALUE_SEPARATOR: &str = ",";

/// A supplied metadata value: a scalar for single-valued fields, a list
/// for multi-valued fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataInput {
    One(String),
    Many(Vec<String>),
}

impl MetadataInput {
    /// Empty inputs count as not provided
    pub fn is_empty(&self) -> bool {
        match self {
            MetadataInput::One(v) => v.trim().is_empty(),
            MetadataInput::Many(vs) => vs.iter().all(|v| v.trim().is_empty()),
        }
    }
}

/// A metadata value parsed according to its field's declared type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedValue {
    Text(String),
    Integer(i64),
    Date(NaiveDate),
    Boolean(bool),
    Enum(String),
}

impl ParsedValue {
    /// The textual form stored in the snapshot column
    pub fn into_stored(self) -> String {
        match self {
            ParsedValue::Text(v) | ParsedValue::Enum(v) => v,
            ParsedValue::Integer(v) => v.to_string(),
            ParsedValue::Date(v) => v.to_string(),
            ParsedValue::Boolean(v) => v.to_string(),
        }
    }
}

/// Parse a single raw value per the field's declared type
pub fn parse_value(field: &MetadataField, raw: &str) -> Result<ParsedValue, String> {
    let raw = raw.trim();

    match field.field_type {
        FieldType::Text => Ok(ParsedValue::Text(raw.to_string())),
        FieldType::Integer => raw
            .parse::<i64>()
            .map(ParsedValue::Integer)
            .map_err(|_| format!("expected an integer, got '{raw}'")),
        FieldType::Date => parse_date(raw)
            .map(ParsedValue::Date)
            .ok_or_else(|| format!("expected an ISO date, got '{raw}'")),
        FieldType::Boolean => match raw.to_ascii_lowercase().as_str() {
            "true" => Ok(ParsedValue::Boolean(true)),
            "false" => Ok(ParsedValue::Boolean(false)),
            _ => Err(format!("expected 'true' or 'false', got '{raw}'")),
        },
        FieldType::Enum => {
            let allowed = field.allowed_values();
            if allowed.is_empty() {
                return Err("no enum values defined for this field".to_string());
            }
            if allowed.iter().any(|v| v == raw) {
                Ok(ParsedValue::Enum(raw.to_string()))
            } else {
                Err(format!("must be one of: {}", allowed.join(", ")))
            }
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Validate supplied metadata against a type's associations and assemble
/// the snapshot rows `(field_id, stored value)`.
///
/// `associations` is `None` when the document carries no type, in which
/// case any supplied metadata is rejected. All violations are collected;
/// the error names every offending field.
pub fn build_snapshot(
    associations: Option<&[AssociatedField]>,
    inputs: &BTreeMap<String, MetadataInput>,
) -> Result<Vec<(Uuid, String)>, ValidationError> {
    let mut collector = ViolationCollector::new();

    let Some(associations) = associations else {
        for name in inputs.keys() {
            collector.add(name.clone(), "document has no type; metadata is not accepted");
        }
        return collector.into_result(Vec::new());
    };

    // Required fields must be present and non-empty
    for assoc in associations {
        if !assoc.is_required {
            continue;
        }
        let missing = inputs
            .get(&assoc.field.name)
            .map(MetadataInput::is_empty)
            .unwrap_or(true);
        if missing {
            collector.add(assoc.field.name.clone(), "required field missing");
        }
    }

    // Supplied values must belong to the type and parse per declared type
    let mut rows = Vec::new();
    for (name, input) in inputs {
        let Some(assoc) = associations.iter().find(|a| &a.field.name == name) else {
            collector.add(name.clone(), "field is not associated with this document type");
            continue;
        };

        if input.is_empty() {
            // Already reported above when required; optional empties are
            // simply dropped from the snapshot
            continue;
        }

        match (assoc.field.is_multi_valued, input) {
            (true, MetadataInput::Many(values)) => {
                let mut stored = Vec::new();
                for raw in values {
                    if raw.trim().is_empty() {
                        continue;
                    }
                    if raw.contains(MULTI_VALUE_SEPARATOR) {
                        collector.add(
                            name.clone(),
                            format!("values may not contain '{MULTI_VALUE_SEPARATOR}'"),
                        );
                        continue;
                    }
                    match parse_value(&assoc.field, raw) {
                        Ok(parsed) => stored.push(parsed.into_stored()),
                        Err(reason) => collector.add(name.clone(), reason),
                    }
                }
                rows.push((assoc.field.id, stored.join(MULTI_VALUE_SEPARATOR)));
            }
            (true, MetadataInput::One(_)) => {
                collector.add(name.clone(), "field is multi-valued and expects a list");
            }
            (false, MetadataInput::Many(_)) => {
                collector.add(name.clone(), "field is single-valued and expects a scalar");
            }
            (false, MetadataInput::One(raw)) => match parse_value(&assoc.field, raw) {
                Ok(parsed) => rows.push((assoc.field.id, parsed.into_stored())),
                Err(reason) => collector.add(name.clone(), reason),
            },
        }
    }

    collector.into_result(rows)
}
