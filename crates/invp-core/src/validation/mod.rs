//! Invoice validation and normalization.
//!
//! A record goes through four checks in order:
//! 1. schema (structure and types), failing stops here
//! 2. date (present, parsable, not in the future), failing stops here
//! 3. business rules (line item, subtotal and total arithmetic)
//! 4. custom rules (vendor, tax rate ceiling, invoice number prefix)
//!
//! Checks 3 and 4 both run and accumulate their errors. The normalized record
//! is attached to every result.

pub mod business;
pub mod custom;
pub mod dates;
pub mod normalize;
pub mod schema;

use chrono::{Local, NaiveDate};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::config::ValidationConfig;
use crate::models::ValidationResult;

pub use business::{amounts_match, check_business_rules, BusinessRuleError};
pub use custom::{check_custom_rules, CustomRuleError};
pub use dates::{check_date, DateError};
pub use normalize::{normalize, Normalized};
pub use schema::check_schema;

/// A value normalization could not coerce.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot coerce {path} value {value} to a number")]
pub struct NormalizationError {
    pub path: String,
    pub value: String,
}

/// Trait for record validators.
pub trait Validator: Send + Sync {
    /// Validate a candidate record. Never fails; problems are reported in
    /// the result.
    fn validate(&self, data: &Value) -> ValidationResult;
}

/// The default validator.
#[derive(Debug, Clone, Default)]
pub struct InvoiceValidator {
    config: ValidationConfig,
    reference_date: Option<NaiveDate>,
}

impl InvoiceValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            config,
            reference_date: None,
        }
    }

    /// Fix the date used as "today" by the future date check.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }
}

impl Validator for InvoiceValidator {
    fn validate(&self, data: &Value) -> ValidationResult {
        let mut result = ValidationResult::pass();

        let normalized = normalize(data);
        for err in &normalized.errors {
            warn!("Normalization: {}", err);
        }
        let data = normalized.data;

        let schema_errors = check_schema(&data);
        if !schema_errors.is_empty() {
            info!("Schema validation failed with {} violation(s)", schema_errors.len());
            result.fail();
            result.schema_errors = schema_errors;
            result.normalized_data = Some(data);
            return result;
        }

        if let Some(err) = check_date(&data, self.today()) {
            info!("Date validation failed: {}", err);
            result.fail();
            result.date_errors.push(err.to_string());
            result.normalized_data = Some(data);
            return result;
        }

        result.business_errors = check_business_rules(&data, self.config.amount_tolerance)
            .iter()
            .map(ToString::to_string)
            .collect();
        result.custom_errors = check_custom_rules(&data, &self.config)
            .iter()
            .map(ToString::to_string)
            .collect();

        if !result.business_errors.is_empty() || !result.custom_errors.is_empty() {
            result.fail();
        }

        debug!(
            "Validation finished: {} business, {} custom error(s)",
            result.business_errors.len(),
            result.custom_errors.len()
        );

        result.normalized_data = Some(data);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn validator() -> InvoiceValidator {
        InvoiceValidator::new(ValidationConfig::default())
            .with_reference_date(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap())
    }

    fn record() -> Value {
        json!({
            "invoice_number": "INV-1001",
            "date": "2025-09-18",
            "vendor": "ACME Corp",
            "line_items": [{"description": "Widget", "quantity": 1, "unit_price": 50, "total": 50}],
            "subtotal": 50,
            "tax": 5,
            "total": 55
        })
    }

    #[test]
    fn test_valid_record_passes() {
        let result = validator().validate(&record());

        assert_eq!(result.status, Status::Pass);
        assert!(result.valid);
        assert_eq!(result.error_count(), 0);
        assert_eq!(result.normalized_data.unwrap()["subtotal"], json!(50.0));
    }

    #[test]
    fn test_missing_field_reports_only_schema() {
        let mut data = record();
        data.as_object_mut().unwrap().remove("vendor");
        data["total"] = json!(999);

        let result = validator().validate(&data);

        assert_eq!(result.status, Status::Fail);
        assert_eq!(result.schema_errors.len(), 1);
        assert_eq!(result.schema_errors[0].message, "'vendor' is a required property");
        assert!(result.date_errors.is_empty());
        assert!(result.business_errors.is_empty());
        assert!(result.custom_errors.is_empty());
        assert!(result.normalized_data.is_some());
    }

    #[test]
    fn test_future_date_stops_before_business_rules() {
        let mut data = record();
        data["date"] = json!("2025/12/01");
        data["total"] = json!(1);

        let result = validator().validate(&data);

        assert_eq!(result.date_errors, vec!["Invoice date 2025-12-01 is in the future"]);
        assert!(result.business_errors.is_empty());
        assert!(result.custom_errors.is_empty());
    }

    #[test]
    fn test_business_and_custom_both_run() {
        let mut data = record();
        data["invoice_number"] = json!("ABC-1");
        data["line_items"][0]["total"] = json!(49);
        data["subtotal"] = json!(49);
        data["total"] = json!(54);

        let result = validator().validate(&data);

        assert!(!result.valid);
        assert_eq!(result.business_errors, vec!["Line item 0: total mismatch (expected 50.0, got 49.0)"]);
        assert_eq!(result.custom_errors, vec!["Invalid invoice number format: ABC-1"]);
    }

    #[test]
    fn test_default_config_compares_amounts_exactly() {
        let mut data = record();
        data["line_items"][0]["total"] = json!(50.0000000001);
        data["subtotal"] = json!(50.0000000001);
        data["total"] = json!(55.0000000001);

        let result = validator().validate(&data);
        assert_eq!(result.status, Status::Fail);
        assert_eq!(result.business_errors.len(), 1);

        let lenient = InvoiceValidator::new(ValidationConfig {
            amount_tolerance: 1e-6,
            ..ValidationConfig::default()
        })
        .with_reference_date(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
        assert!(lenient.validate(&data).is_pass());
    }

    #[test]
    fn test_string_amounts_are_coerced() {
        let mut data = record();
        data["line_items"][0]["quantity"] = json!("1");
        data["subtotal"] = json!(" 50.00 ");
        data["vendor"] = json!("  ACME Corp  ");

        let result = validator().validate(&data);

        assert!(result.is_pass());
        let record = result.record().unwrap();
        assert_eq!(record.vendor, "ACME Corp");
        assert_eq!(record.subtotal, 50.0);
    }

    #[test]
    fn test_uncoercible_amount_fails_business_rules() {
        let mut data = record();
        data["subtotal"] = json!("fifty");

        let result = validator().validate(&data);

        assert!(result.schema_errors.is_empty());
        assert_eq!(result.business_errors.len(), 1);
        assert!(result.business_errors[0].starts_with("Business rule validation error"));
        assert_eq!(result.custom_errors, vec!["Error calculating tax rate"]);
    }

    #[test]
    fn test_validation_is_deterministic() {
        let mut data = record();
        data["tax"] = json!(20);
        data["total"] = json!(70);

        let v = validator();
        assert_eq!(v.validate(&data), v.validate(&data));
    }

    #[test]
    fn test_normalized_data_revalidates_identically() {
        let mut data = record();
        data["date"] = json!("2025/09/18");
        data["quantity"] = json!("3");

        let v = validator();
        let first = v.validate(&data);
        let second = v.validate(first.normalized_data.as_ref().unwrap());

        assert_eq!(first.normalized_data, second.normalized_data);
        assert_eq!(first.status, second.status);
    }
}
