//! Rule-based invoice parser with documented fallbacks.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::invoice::{
    round2, InvoiceRecord, LineItem, FALLBACK_DATE, UNKNOWN_INVOICE_NUMBER, UNKNOWN_VENDOR,
};

use super::rules::{
    extract_amounts, DateExtractor, FieldExtractor, InvoiceNumberExtractor, LineItemExtractor,
    VendorExtractor,
};

/// Tax rate assumed when the text carries no `Tax:` amount.
pub const DEFAULT_TAX_RATE: f64 = 0.10;

/// Result of invoice extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Extracted invoice record.
    pub invoice: InvoiceRecord,
    /// Fallbacks that were applied.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Trait for invoice parsing.
///
/// Parsing never fails: every field has a fallback and each fallback taken
/// is reported as a warning.
pub trait InvoiceParser: Send + Sync {
    /// Parse an invoice from text.
    fn parse(&self, text: &str) -> ExtractionResult;
}

/// Parser built from one [`FieldExtractor`] per field.
#[derive(Debug, Clone)]
pub struct RuleBasedParser {
    invoice_number: InvoiceNumberExtractor,
    date: DateExtractor,
    vendor: VendorExtractor,
    line_items: LineItemExtractor,
    default_tax_rate: f64,
}

impl RuleBasedParser {
    /// Create a parser with the default rules.
    pub fn new() -> Self {
        Self {
            invoice_number: InvoiceNumberExtractor::new(),
            date: DateExtractor::new(),
            vendor: VendorExtractor::new(),
            line_items: LineItemExtractor::new(),
            default_tax_rate: DEFAULT_TAX_RATE,
        }
    }

    /// Set the tax rate used to derive a missing tax amount.
    pub fn with_default_tax_rate(mut self, rate: f64) -> Self {
        self.default_tax_rate = rate;
        self
    }
}

impl Default for RuleBasedParser {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceParser for RuleBasedParser {
    fn parse(&self, text: &str) -> ExtractionResult {
        let start = Instant::now();
        let mut warnings = Vec::new();

        info!("Parsing invoice from {} characters of text", text.len());

        let invoice_number = match self.invoice_number.extract(text) {
            Some(m) => m.value,
            None => {
                warnings.push("Could not extract invoice number".to_string());
                UNKNOWN_INVOICE_NUMBER.to_string()
            }
        };

        let date = match self.date.extract(text) {
            Some(m) => m.value,
            None => {
                warnings.push("Could not extract invoice date".to_string());
                FALLBACK_DATE.to_string()
            }
        };

        let vendor = match self.vendor.extract(text) {
            Some(m) => m.value,
            None => {
                warnings.push("Could not extract vendor".to_string());
                UNKNOWN_VENDOR.to_string()
            }
        };

        let mut line_items: Vec<LineItem> = self
            .line_items
            .extract_all(text)
            .into_iter()
            .map(|m| m.value)
            .collect();
        if line_items.is_empty() {
            warnings.push("Could not extract line items, using fallback item".to_string());
            line_items.push(LineItem::fallback());
        }

        let amounts = extract_amounts(text);
        let subtotal = match amounts.subtotal {
            Some(m) => m.value,
            None => {
                warnings.push("Subtotal derived from line items".to_string());
                line_items.iter().map(|i| i.total).sum()
            }
        };
        let tax = match amounts.tax {
            Some(m) => m.value,
            None => {
                warnings.push("Tax derived from subtotal".to_string());
                round2(subtotal * self.default_tax_rate)
            }
        };
        let total = match amounts.total {
            Some(m) => m.value,
            None => {
                warnings.push("Total derived from subtotal and tax".to_string());
                subtotal + tax
            }
        };

        let invoice = InvoiceRecord {
            invoice_number,
            date,
            vendor,
            line_items,
            subtotal,
            tax,
            total,
        };

        debug!(
            "Extracted invoice {} with {} line items ({} fallbacks)",
            invoice.invoice_number,
            invoice.line_items.len(),
            warnings.len()
        );

        ExtractionResult {
            invoice,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::SIMULATED_TEXT;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_simulated_text() {
        let result = RuleBasedParser::new().parse(SIMULATED_TEXT);

        assert_eq!(
            result.invoice,
            InvoiceRecord {
                invoice_number: "INV-1001".to_string(),
                date: "2025-09-18".to_string(),
                vendor: "ACME Corp".to_string(),
                line_items: vec![LineItem::new("Widget", 1.0, 50.0, 50.0)],
                subtotal: 50.0,
                tax: 5.0,
                total: 55.0,
            }
        );
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_parse_empty_text_uses_fallbacks() {
        let result = RuleBasedParser::new().parse("");
        let invoice = result.invoice;

        assert_eq!(invoice.invoice_number, "INV-UNKNOWN");
        assert_eq!(invoice.date, "1970-01-01");
        assert_eq!(invoice.vendor, "Unknown Vendor");
        assert_eq!(invoice.line_items, vec![LineItem::new("Service", 1.0, 50.0, 50.0)]);
        assert_eq!(invoice.subtotal, 50.0);
        assert_eq!(invoice.tax, 5.0);
        assert_eq!(invoice.total, 55.0);
        assert_eq!(result.warnings.len(), 7);
    }

    #[test]
    fn test_no_line_items_but_labeled_amounts() {
        let text = "inv-77\nVendor: Globex\nSubtotal: 200.00\nTax: 20.00\nTotal: 220.00";
        let invoice = RuleBasedParser::new().parse(text).invoice;

        assert_eq!(invoice.invoice_number, "INV-77");
        assert_eq!(invoice.line_items, vec![LineItem::fallback()]);
        assert_eq!(invoice.subtotal, 200.0);
        assert_eq!(invoice.total, 220.0);
    }

    #[test]
    fn test_derived_totals() {
        let text = "INV-5\nDate: 2024/01/31\n3 x Bolt @ 0.33 = 0.99\n2 x Nut @ 1,000.00 = 2,000.00";
        let invoice = RuleBasedParser::new().parse(text).invoice;

        assert_eq!(invoice.date, "2024/01/31");
        assert_eq!(invoice.subtotal, 0.99 + 2000.0);
        assert_eq!(invoice.tax, 200.1);
        assert_eq!(invoice.total, invoice.subtotal + invoice.tax);
    }

    #[test]
    fn test_custom_default_tax_rate() {
        let invoice = RuleBasedParser::new().with_default_tax_rate(0.2).parse("").invoice;
        assert_eq!(invoice.tax, 10.0);
        assert_eq!(invoice.total, 60.0);
    }
}
