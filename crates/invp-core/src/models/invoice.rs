//! Invoice data models.

use serde::{Deserialize, Serialize};

/// Invoice number used when none can be extracted.
pub const UNKNOWN_INVOICE_NUMBER: &str = "INV-UNKNOWN";

/// Date used when none can be extracted.
pub const FALLBACK_DATE: &str = "1970-01-01";

/// Vendor used when none can be extracted.
pub const UNKNOWN_VENDOR: &str = "Unknown Vendor";

/// A structured invoice record.
///
/// Produced by the parser, normalized by the validator and consumed by the
/// exporters and the store. Arithmetic consistency between the monetary
/// fields is checked by the business rules, not enforced by the type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Invoice number (e.g. `INV-1001`).
    pub invoice_number: String,

    /// Invoice date, `YYYY-MM-DD` after normalization.
    pub date: String,

    /// Vendor name.
    pub vendor: String,

    /// Line items in document order.
    pub line_items: Vec<LineItem>,

    /// Sum of line item totals.
    pub subtotal: f64,

    /// Tax amount.
    pub tax: f64,

    /// Subtotal plus tax.
    pub total: f64,
}

/// A single line item on the invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product/service description.
    pub description: String,

    /// Quantity.
    pub quantity: f64,

    /// Price per unit.
    pub unit_price: f64,

    /// Line total (quantity * unit price).
    pub total: f64,
}

impl LineItem {
    pub fn new(description: impl Into<String>, quantity: f64, unit_price: f64, total: f64) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
            total,
        }
    }

    /// Synthetic item used when no line items could be extracted.
    pub fn fallback() -> Self {
        Self::new("Service", 1.0, 50.0, 50.0)
    }
}

impl InvoiceRecord {
    /// Convert to a JSON mapping, the shape the validator consumes.
    pub fn to_value(&self) -> serde_json::Value {
        // A record with only strings, floats and vectors always serializes.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// File stem used by exporters: the invoice number, or
    /// `invoice_<id>` when the number is empty.
    pub fn file_stem(&self, id: Option<i64>) -> String {
        let base = if self.invoice_number.trim().is_empty() {
            match id {
                Some(id) => format!("invoice_{}", id),
                None => "invoice_unknown".to_string(),
            }
        } else {
            self.invoice_number.clone()
        };

        base.chars()
            .map(|c| match c {
                ' ' | '/' | '\\' => '_',
                c => c,
            })
            .collect()
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(number: &str) -> InvoiceRecord {
        InvoiceRecord {
            invoice_number: number.to_string(),
            date: "2025-09-18".to_string(),
            vendor: "ACME Corp".to_string(),
            line_items: vec![LineItem::new("Widget", 2.0, 25.0, 50.0), LineItem::fallback()],
            subtotal: 100.0,
            tax: 10.0,
            total: 110.0,
        }
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(record("INV-1001").file_stem(None), "INV-1001");
        assert_eq!(record("INV 7/a").file_stem(None), "INV_7_a");
        assert_eq!(record("").file_stem(Some(4)), "invoice_4");
        assert_eq!(record("  ").file_stem(None), "invoice_unknown");
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(12.345_6), 12.35);
        assert_eq!(round2(5.0), 5.0);
        assert_eq!(round2(0.1 * 3.0), 0.3);
    }

    #[test]
    fn test_to_value_shape() {
        let value = record("INV-1").to_value();
        assert_eq!(value["invoice_number"], "INV-1");
        assert_eq!(value["line_items"][1]["description"], "Service");
        assert_eq!(value["total"], 110.0);
    }
}
