//! Invoice date extraction and parsing.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::patterns::INVOICE_DATE;
use super::{ExtractionMatch, FieldExtractor};

/// Reads the date after a `Date:` label.
///
/// The value is kept verbatim (`2025/09/18` stays as written); the
/// validator normalizes it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        INVOICE_DATE
            .captures_iter(text)
            .filter_map(|caps| {
                let full = caps.get(0)?;
                Some(ExtractionMatch::new(caps[1].to_string(), full.as_str()).with_position(full.start(), full.end()))
            })
            .collect()
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO style date, accepting `/` as a separator and an optional
/// time part. Returns `None` for anything else.
pub fn parse_invoice_date(value: &str) -> Option<NaiveDate> {
    let value = value.replace('/', "-");

    if let Ok(date) = NaiveDate::parse_from_str(&value, "%Y-%m-%d") {
        return Some(date);
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&value, format) {
            return Some(dt.date());
        }
    }

    DateTime::parse_from_rfc3339(&value)
        .ok()
        .map(|dt| dt.naive_local().date())
}
