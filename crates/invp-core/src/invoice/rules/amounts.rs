//! Labeled amount extraction (subtotal, tax, total).

use regex::Regex;

use super::patterns::{SUBTOTAL, TAX, TOTAL};
use super::ExtractionMatch;

/// Labeled amounts found in an invoice. `None` means the label was absent
/// or its number did not parse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceAmounts {
    pub subtotal: Option<ExtractionMatch<f64>>,
    pub tax: Option<ExtractionMatch<f64>>,
    pub total: Option<ExtractionMatch<f64>>,
}

/// Extract labeled amounts from invoice text.
pub fn extract_amounts(text: &str) -> InvoiceAmounts {
    InvoiceAmounts {
        subtotal: labeled_amount(&SUBTOTAL, text),
        tax: labeled_amount(&TAX, text),
        total: labeled_amount(&TOTAL, text),
    }
}

fn labeled_amount(pattern: &Regex, text: &str) -> Option<ExtractionMatch<f64>> {
    let caps = pattern.captures(text)?;
    let full = caps.get(0)?;
    let amount = parse_amount(&caps[1])?;
    Some(ExtractionMatch::new(amount, full.as_str()).with_position(full.start(), full.end()))
}

/// Parse an amount written with `,` thousands separators (`1,234.50`).
pub fn parse_amount(s: &str) -> Option<f64> {
    let cleaned = s.trim().replace(',', "");
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
