//! Validation result models.

use serde::{Deserialize, Serialize};

use super::invoice::InvoiceRecord;

/// Overall outcome of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Fail,
}

/// One segment of a JSON path into the validated document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// A structural violation found by the schema check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaViolation {
    /// Human readable description.
    pub message: String,

    /// Path of the offending value (empty for the root).
    pub path: Vec<PathSegment>,

    /// Name of the violated rule (`required`, `type`).
    pub validator: String,
}

/// Result of a single validation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub status: Status,
    pub valid: bool,
    #[serde(default)]
    pub schema_errors: Vec<SchemaViolation>,
    #[serde(default)]
    pub date_errors: Vec<String>,
    #[serde(default)]
    pub business_errors: Vec<String>,
    #[serde(default)]
    pub custom_errors: Vec<String>,
    /// The record after normalization, carried even on failure.
    pub normalized_data: Option<serde_json::Value>,
}

impl ValidationResult {
    /// A passing result with no normalized data yet.
    pub fn pass() -> Self {
        Self {
            status: Status::Pass,
            valid: true,
            schema_errors: Vec::new(),
            date_errors: Vec::new(),
            business_errors: Vec::new(),
            custom_errors: Vec::new(),
            normalized_data: None,
        }
    }

    /// Mark the result as failed.
    pub fn fail(&mut self) {
        self.status = Status::Fail;
        self.valid = false;
    }

    pub fn is_pass(&self) -> bool {
        self.status == Status::Pass && self.valid
    }

    /// Total number of errors across all categories.
    pub fn error_count(&self) -> usize {
        self.schema_errors.len()
            + self.date_errors.len()
            + self.business_errors.len()
            + self.custom_errors.len()
    }

    /// All error messages, flattened in category order.
    pub fn messages(&self) -> Vec<String> {
        self.schema_errors
            .iter()
            .map(|e| e.message.clone())
            .chain(self.date_errors.iter().cloned())
            .chain(self.business_errors.iter().cloned())
            .chain(self.custom_errors.iter().cloned())
            .collect()
    }

    /// The normalized data as a typed record, if it has the record shape.
    pub fn record(&self) -> Option<InvoiceRecord> {
        self.normalized_data
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}
