//! Organization specific rules: vendor presence, tax rate ceiling and
//! invoice number format.

use serde_json::Value;
use thiserror::Error;

use crate::models::invoice::round2;
use crate::models::config::ValidationConfig;

use super::normalize::to_number;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CustomRuleError {
    #[error("Vendor is missing or empty")]
    MissingVendor,

    #[error("Tax rate too high: {:.2}% (max {}%)", .rate * 100.0, round2(.max * 100.0))]
    TaxRateTooHigh { rate: f64, max: f64 },

    #[error("Error calculating tax rate")]
    TaxRateUnavailable,

    #[error("Invalid invoice number format: {0}")]
    InvoiceNumberFormat(String),
}

/// Run all custom rules; each contributes at most one error.
pub fn check_custom_rules(data: &Value, config: &ValidationConfig) -> Vec<CustomRuleError> {
    let mut errors = Vec::new();

    let vendor_present = data
        .get("vendor")
        .and_then(Value::as_str)
        .is_some_and(|v| !v.is_empty());
    if !vendor_present {
        errors.push(CustomRuleError::MissingVendor);
    }

    if let Err(err) = check_tax_rate(data, config.max_tax_rate) {
        errors.push(err);
    }

    let number = match data.get("invoice_number") {
        None => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    if !number.starts_with(&config.invoice_prefix) {
        errors.push(CustomRuleError::InvoiceNumberFormat(number));
    }

    errors
}

fn check_tax_rate(data: &Value, max: f64) -> Result<(), CustomRuleError> {
    let amount = |field: &str| match data.get(field) {
        None => Some(0.0),
        Some(value) => to_number(value),
    };

    let (Some(subtotal), Some(tax)) = (amount("subtotal"), amount("tax")) else {
        return Err(CustomRuleError::TaxRateUnavailable);
    };

    if subtotal > 0.0 {
        let rate = tax / subtotal;
        if rate > max {
            return Err(CustomRuleError::TaxRateTooHigh { rate, max });
        }
    }

    Ok(())
}
