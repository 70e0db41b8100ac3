//! Invoice date checks.

use chrono::NaiveDate;
use serde_json::Value;
use thiserror::Error;

use crate::invoice::rules::parse_invoice_date;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("Missing invoice date")]
    Missing,

    #[error("Invalid date format: {0}")]
    InvalidFormat(String),

    #[error("Invoice date {0} is in the future")]
    InFuture(String),
}

/// Check that the record has a parsable date no later than `today`.
pub fn check_date(data: &Value, today: NaiveDate) -> Option<DateError> {
    let raw = match data.get("date") {
        None | Some(Value::Null) => return Some(DateError::Missing),
        Some(Value::String(s)) if s.is_empty() => return Some(DateError::Missing),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    match parse_invoice_date(&raw) {
        None => Some(DateError::InvalidFormat(raw)),
        Some(date) if date > today => Some(DateError::InFuture(raw)),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 20).unwrap()
    }

    #[test]
    fn test_valid_dates() {
        assert_eq!(check_date(&json!({"date": "2025-09-18"}), today()), None);
        assert_eq!(check_date(&json!({"date": "2025-09-20"}), today()), None);
    }

    #[test]
    fn test_missing_date() {
        assert_eq!(check_date(&json!({}), today()), Some(DateError::Missing));
        assert_eq!(check_date(&json!({"date": ""}), today()), Some(DateError::Missing));
    }

    #[test]
    fn test_invalid_format() {
        let err = check_date(&json!({"date": "18.09.2025"}), today()).unwrap();
        assert_eq!(err.to_string(), "Invalid date format: 18.09.2025");
    }

    #[test]
    fn test_future_date() {
        let err = check_date(&json!({"date": "2025-09-21"}), today()).unwrap();
        assert_eq!(err.to_string(), "Invoice date 2025-09-21 is in the future");
    }
}
