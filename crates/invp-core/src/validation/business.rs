//! Arithmetic consistency between line items, subtotal, tax and total.

use serde_json::Value;
use thiserror::Error;

use super::normalize::to_number;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BusinessRuleError {
    #[error("Line item {index}: total mismatch (expected {expected:?}, got {actual:?})")]
    LineItemTotal { index: usize, expected: f64, actual: f64 },

    #[error("Subtotal mismatch (expected {expected:?}, got {actual:?})")]
    Subtotal { expected: f64, actual: f64 },

    #[error("Total mismatch (expected {expected:?}, got {actual:?})")]
    Total { expected: f64, actual: f64 },

    #[error("Business rule validation error: {0}")]
    Unprocessable(String),
}

/// Run every arithmetic rule and collect all mismatches.
///
/// A value that is not numeric stops the check with a single
/// [`BusinessRuleError::Unprocessable`].
pub fn check_business_rules(data: &Value, tolerance: f64) -> Vec<BusinessRuleError> {
    match collect(data, tolerance) {
        Ok(errors) => errors,
        Err(reason) => vec![BusinessRuleError::Unprocessable(reason)],
    }
}

fn collect(data: &Value, tolerance: f64) -> Result<Vec<BusinessRuleError>, String> {
    let mut errors = Vec::new();
    let mut line_sum = 0.0;

    let items = data.get("line_items").and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();
    for (index, item) in items.iter().enumerate() {
        let quantity = number(item, "quantity", 0.0)?;
        let unit_price = number(item, "unit_price", 0.0)?;
        let actual = number(item, "total", 0.0)?;

        let expected = quantity * unit_price;
        if !amounts_match(expected, actual, tolerance) {
            errors.push(BusinessRuleError::LineItemTotal { index, expected, actual });
        }
        line_sum += actual;
    }

    let subtotal = number(data, "subtotal", 0.0)?;
    if !amounts_match(line_sum, subtotal, tolerance) {
        errors.push(BusinessRuleError::Subtotal {
            expected: line_sum,
            actual: subtotal,
        });
    }

    let tax = number(data, "tax", 0.0)?;
    let total = number(data, "total", 0.0)?;
    let expected_total = subtotal + tax;
    if !amounts_match(expected_total, total, tolerance) {
        errors.push(BusinessRuleError::Total {
            expected: expected_total,
            actual: total,
        });
    }

    Ok(errors)
}

fn number(data: &Value, field: &str, default: f64) -> Result<f64, String> {
    match data.get(field) {
        None => Ok(default),
        Some(value) => to_number(value).ok_or_else(|| format!("could not convert {} to a number", value)),
    }
}

/// Monetary equality within an absolute tolerance.
pub fn amounts_match(expected: f64, actual: f64, tolerance: f64) -> bool {
    (expected - actual).abs() <= tolerance
}
