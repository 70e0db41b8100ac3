//! Record normalization: canonical date, trimmed vendor, numeric amounts.

use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::invoice::rules::parse_invoice_date;

use super::NormalizationError;

/// Line item fields coerced to numbers.
pub const LINE_ITEM_AMOUNTS: [&str; 3] = ["quantity", "unit_price", "total"];

/// Top-level fields coerced to numbers.
pub const INVOICE_AMOUNTS: [&str; 3] = ["subtotal", "tax", "total"];

/// A normalized copy of a record plus the coercions that failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub data: Value,
    pub errors: Vec<NormalizationError>,
}

/// Normalize a copy of `data`.
///
/// Values that cannot be normalized are left untouched and reported; the
/// schema and rule checks decide what they mean. Running this on its own
/// output changes nothing.
pub fn normalize(data: &Value) -> Normalized {
    let mut normalized = data.clone();
    let mut errors = Vec::new();

    if let Value::Object(map) = &mut normalized {
        normalize_date(map);
        normalize_vendor(map);

        if let Some(Value::Array(items)) = map.get_mut("line_items") {
            for (i, item) in items.iter_mut().enumerate() {
                if let Value::Object(item) = item {
                    for field in LINE_ITEM_AMOUNTS {
                        coerce_field(item, field, &format!("line_items[{}].{}", i, field), &mut errors);
                    }
                }
            }
        }

        for field in INVOICE_AMOUNTS {
            coerce_field(map, field, field, &mut errors);
        }
    }

    if !errors.is_empty() {
        debug!("Normalization left {} value(s) uncoerced", errors.len());
    }

    Normalized {
        data: normalized,
        errors,
    }
}

fn normalize_date(map: &mut Map<String, Value>) {
    if let Some(Value::String(date)) = map.get_mut("date") {
        if let Some(parsed) = parse_invoice_date(date) {
            *date = parsed.format("%Y-%m-%d").to_string();
        }
    }
}

fn normalize_vendor(map: &mut Map<String, Value>) {
    if let Some(Value::String(vendor)) = map.get_mut("vendor") {
        let trimmed = vendor.trim();
        if trimmed.len() != vendor.len() {
            *vendor = trimmed.to_string();
        }
    }
}

fn coerce_field(map: &mut Map<String, Value>, field: &str, path: &str, errors: &mut Vec<NormalizationError>) {
    let Some(value) = map.get_mut(field) else {
        return;
    };

    match to_number(value).and_then(Number::from_f64) {
        Some(number) => *value = Value::Number(number),
        None => errors.push(NormalizationError {
            path: path.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Numeric view of a JSON value: numbers as-is, numeric strings parsed.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_normalize_coerces_and_reformats() {
        let input = json!({
            "invoice_number": "INV-1",
            "date": "2025/09/18",
            "vendor": "  ACME Corp ",
            "line_items": [{"description": "Widget", "quantity": "2", "unit_price": 25, "total": "50.00"}],
            "subtotal": "50",
            "tax": 5,
            "total": 55.0
        });

        let out = normalize(&input);

        assert!(out.errors.is_empty());
        assert_eq!(
            out.data,
            json!({
                "invoice_number": "INV-1",
                "date": "2025-09-18",
                "vendor": "ACME Corp",
                "line_items": [{"description": "Widget", "quantity": 2.0, "unit_price": 25.0, "total": 50.0}],
                "subtotal": 50.0,
                "tax": 5.0,
                "total": 55.0
            })
        );
    }

    #[test]
    fn test_normalize_does_not_touch_input() {
        let input = json!({"vendor": " x ", "line_items": [{"quantity": "1"}]});
        let _ = normalize(&input);
        assert_eq!(input["vendor"], " x ");
        assert_eq!(input["line_items"][0]["quantity"], "1");
    }

    #[test]
    fn test_unparsable_date_left_unchanged() {
        let out = normalize(&json!({"date": "18.09.2025"}));
        assert_eq!(out.data["date"], "18.09.2025");
        assert!(out.errors.is_empty());
    }

    #[test]
    fn test_uncoercible_values_reported() {
        let input = json!({
            "line_items": [{"quantity": "two", "unit_price": 1, "total": null}],
            "subtotal": "abc"
        });

        let out = normalize(&input);

        assert_eq!(out.data["line_items"][0]["quantity"], "two");
        assert_eq!(out.data["line_items"][0]["unit_price"], 1.0);
        assert_eq!(out.data["subtotal"], "abc");
        let paths: Vec<&str> = out.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["line_items[0].quantity", "line_items[0].total", "subtotal"]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let input = json!({
            "invoice_number": "INV-9",
            "date": "2024/02/29T08:00:00",
            "vendor": "\tGlobex\n",
            "line_items": [{"description": "A", "quantity": "3", "unit_price": "0.1", "total": 0.3}],
            "subtotal": "x",
            "tax": "1e1",
            "total": 10
        });

        let once = normalize(&input).data;
        let twice = normalize(&once).data;

        assert_eq!(once["date"], "2024-02-29");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_non_object_passes_through() {
        assert_eq!(normalize(&json!([1, 2])).data, json!([1, 2]));
    }
}
