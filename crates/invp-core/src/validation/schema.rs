//! Structural check of an invoice record.
//!
//! Mirrors a small JSON schema: required string fields, an array of line
//! item objects and amounts that may be numbers or (not yet coerced) strings.

use serde_json::Value;

use crate::models::{PathSegment, SchemaViolation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Text,
    Amount,
    LineItems,
}

struct FieldRule {
    name: &'static str,
    kind: FieldKind,
}

const fn rule(name: &'static str, kind: FieldKind) -> FieldRule {
    FieldRule { name, kind }
}

const INVOICE_FIELDS: &[FieldRule] = &[
    rule("invoice_number", FieldKind::Text),
    rule("date", FieldKind::Text),
    rule("vendor", FieldKind::Text),
    rule("line_items", FieldKind::LineItems),
    rule("subtotal", FieldKind::Amount),
    rule("tax", FieldKind::Amount),
    rule("total", FieldKind::Amount),
];

const LINE_ITEM_FIELDS: &[FieldRule] = &[
    rule("description", FieldKind::Text),
    rule("quantity", FieldKind::Amount),
    rule("unit_price", FieldKind::Amount),
    rule("total", FieldKind::Amount),
];

/// Check the record's structure. An empty result means it conforms.
pub fn check_schema(data: &Value) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();
    check_object(data, INVOICE_FIELDS, &[], &mut violations);
    violations
}

fn check_object(value: &Value, fields: &[FieldRule], path: &[PathSegment], out: &mut Vec<SchemaViolation>) {
    let Value::Object(map) = value else {
        out.push(type_violation(value, &["object"], path.to_vec()));
        return;
    };

    for field in fields.iter().filter(|f| !map.contains_key(f.name)) {
        out.push(SchemaViolation {
            message: format!("'{}' is a required property", field.name),
            path: path.to_vec(),
            validator: "required".to_string(),
        });
    }

    for field in fields {
        if let Some(value) = map.get(field.name) {
            let mut field_path = path.to_vec();
            field_path.push(PathSegment::from(field.name));
            check_field(value, field.kind, field_path, out);
        }
    }
}

fn check_field(value: &Value, kind: FieldKind, path: Vec<PathSegment>, out: &mut Vec<SchemaViolation>) {
    match kind {
        FieldKind::Text => {
            if !value.is_string() {
                out.push(type_violation(value, &["string"], path));
            }
        }
        FieldKind::Amount => {
            if !(value.is_number() || value.is_string()) {
                out.push(type_violation(value, &["number", "string"], path));
            }
        }
        FieldKind::LineItems => match value {
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    let mut item_path = path.clone();
                    item_path.push(PathSegment::from(i));
                    check_object(item, LINE_ITEM_FIELDS, &item_path, out);
                }
            }
            other => out.push(type_violation(other, &["array"], path)),
        },
    }
}

fn type_violation(value: &Value, expected: &[&str], path: Vec<PathSegment>) -> SchemaViolation {
    let expected = expected
        .iter()
        .map(|t| format!("'{}'", t))
        .collect::<Vec<_>>()
        .join(", ");

    SchemaViolation {
        message: format!("{} is not of type {}", render(value), expected),
        path,
        validator: "type".to_string(),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn valid() -> Value {
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
    fn test_valid_record() {
        assert!(check_schema(&valid()).is_empty());
    }

    #[test]
    fn test_amount_strings_accepted() {
        let mut data = valid();
        data["subtotal"] = json!("fifty");
        assert!(check_schema(&data).is_empty());
    }

    #[test]
    fn test_missing_vendor() {
        let mut data = valid();
        data.as_object_mut().unwrap().remove("vendor");

        assert_eq!(
            check_schema(&data),
            vec![SchemaViolation {
                message: "'vendor' is a required property".to_string(),
                path: vec![],
                validator: "required".to_string(),
            }]
        );
    }

    #[test]
    fn test_nested_type_error_has_path() {
        let mut data = valid();
        data["line_items"][0]["quantity"] = json!(null);
        data["line_items"][0].as_object_mut().unwrap().remove("description");

        let violations = check_schema(&data);

        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].message, "'description' is a required property");
        assert_eq!(violations[0].path, vec![PathSegment::from("line_items"), PathSegment::from(0)]);
        assert_eq!(violations[1].message, "null is not of type 'number', 'string'");
        assert_eq!(
            violations[1].path,
            vec![PathSegment::from("line_items"), PathSegment::from(0), PathSegment::from("quantity")]
        );
        assert_eq!(violations[1].validator, "type");
    }

    #[test]
    fn test_wrong_container_types() {
        let mut data = valid();
        data["line_items"] = json!("none");
        data["vendor"] = json!(42);

        let messages: Vec<String> = check_schema(&data).into_iter().map(|v| v.message).collect();
        assert_eq!(
            messages,
            vec!["42 is not of type 'string'".to_string(), "'none' is not of type 'array'".to_string()]
        );
    }

    #[test]
    fn test_root_must_be_object() {
        let violations = check_schema(&json!([1]));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].message, "[1] is not of type 'object'");
        assert!(violations[0].path.is_empty());
    }
}
