//! Error handling for the document management system
//!
//! This module provides idiomatic Rust error types using thiserror for
//! better error messages and proper error chain handling.

use std::fmt;

use thiserror::Error;

/// Main error type for the document management system
#[derive(Error, Debug)]
pub enum DocVaultError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Conflict error: {0}")]
    Conflict(#[from] ConflictError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl DocVaultError {
    /// Build a not-found error for the given entity kind and identifier
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        DocVaultError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// A single rejected metadata value or input field
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub reason: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Input validation failure carrying every violation found, each naming
/// the offending field
#[derive(Debug)]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn new(violations: Vec<FieldViolation>) -> Self {
        Self { violations }
    }

    /// Single-violation shorthand
    pub fn single(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation::new(field, reason)],
        }
    }

    /// Does any violation name this field?
    pub fn names_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.violations.iter().map(|v| v.to_string()).collect();
        write!(f, "{}", rendered.join("; "))
    }
}

/// Collector for batch validation: gather every violation, then fail once
#[derive(Debug, Default)]
pub struct ViolationCollector {
    violations: Vec<FieldViolation>,
}

impl ViolationCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.violations.push(FieldViolation::new(field, reason));
    }

    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    pub fn into_result<T>(self, value: T) -> Result<T, ValidationError> {
        if self.violations.is_empty() {
            Ok(value)
        } else {
            Err(ValidationError::new(self.violations))
        }
    }
}

/// Referential-integrity violations: the registry refuses the operation
/// rather than cascading
#[derive(Error, Debug)]
pub enum ConflictError {
    #[error("metadata field '{name}' is associated with {count} document type(s)")]
    FieldInUse { name: String, count: i64 },

    #[error("document type '{name}' is referenced by {count} document(s)")]
    TypeInUse { name: String, count: i64 },
}

/// Failures of the underlying byte store
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage key '{key}' not found")]
    KeyNotFound { key: String },

    #[error("storage key '{key}' already exists")]
    KeyCollision { key: String },

    #[error("invalid storage key '{key}'")]
    InvalidKey { key: String },

    #[error("storage I/O failure for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type aliases for convenience
pub type DocVaultResult<T> = Result<T, DocVaultError>;
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = DocVaultError::not_found("document", "42");
        assert_eq!(err.to_string(), "document '42' not found");
    }

    #[test]
    fn test_validation_error_names_all_fields() {
        let err = ValidationError::new(vec![
            FieldViolation::new("department", "required field missing"),
            FieldViolation::new("revision_number", "expected an integer, got 'abc'"),
        ]);

        assert!(err.names_field("department"));
        assert!(err.names_field("revision_number"));
        assert!(!err.names_field("tags"));

        let rendered = err.to_string();
        assert!(rendered.contains("department: required field missing"));
        assert!(rendered.contains("revision_number"));
    }

    #[test]
    fn test_violation_collector() {
        let mut collector = ViolationCollector::new();
        assert!(!collector.has_violations());
        assert!(collector.into_result(7u32).is_ok());

        let mut collector = ViolationCollector::new();
        collector.add("title", "must not be empty");
        collector.add("department", "must be one of: HR, Legal");
        assert!(collector.has_violations());

        let err = collector.into_result(()).unwrap_err();
        assert_eq!(err.violations.len(), 2);
        assert!(err.names_field("title"));
    }

    #[test]
    fn test_conflict_display() {
        let err = ConflictError::FieldInUse {
            name: "department".to_string(),
            count: 3,
        };
        assert_eq!(
            err.to_string(),
            "metadata field 'department' is associated with 3 document type(s)"
        );
    }
}
