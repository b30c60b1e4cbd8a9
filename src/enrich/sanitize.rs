//! Store-safe conversion of merged documents.

use serde_json::{Map, Number, Value};

use crate::store::{DocValue, Document, SanitizedRecord};

/// Converts a document into a record the store accepts.
///
/// At every depth: keys starting with `reserved_prefix` are removed,
/// `Undefined` fields and list elements are dropped, and non-finite floats
/// become `null`. An empty prefix reserves nothing.
#[must_use]
pub fn sanitize_document(doc: Document, reserved_prefix: &str) -> SanitizedRecord {
    SanitizedRecord::from_sanitized_map(sanitize_map(doc, reserved_prefix))
}

fn sanitize_map(doc: Document, reserved_prefix: &str) -> Map<String, Value> {
    doc.into_iter()
        .filter(|(key, _)| reserved_prefix.is_empty() || !key.starts_with(reserved_prefix))
        .filter_map(|(key, value)| sanitize_value(value, reserved_prefix).map(|v| (key, v)))
        .collect()
}

fn sanitize_value(value: DocValue, reserved_prefix: &str) -> Option<Value> {
    match value {
        DocValue::Undefined => None,
        DocValue::Null => Some(Value::Null),
        DocValue::Bool(b) => Some(Value::Bool(b)),
        DocValue::Int(i) => Some(Value::from(i)),
        DocValue::Float(f) => Some(Number::from_f64(f).map_or(Value::Null, Value::Number)),
        DocValue::Text(s) => Some(Value::String(s)),
        DocValue::List(items) => Some(Value::Array(
            items
                .into_iter()
                .filter_map(|item| sanitize_value(item, reserved_prefix))
                .collect(),
        )),
        DocValue::Map(map) => Some(Value::Object(sanitize_map(map, reserved_prefix))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::RESERVED_KEY_PREFIX;
    use serde_json::json;

    fn doc(entries: Vec<(&str, DocValue)>) -> Document {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_sanitize_drops_undefined_and_nulls_non_finite() {
        let record = sanitize_document(
            doc(vec![
                ("a", DocValue::Int(1)),
                ("b", DocValue::Undefined),
                ("c", DocValue::Float(f64::NAN)),
                ("d", DocValue::Float(f64::INFINITY)),
                ("e", DocValue::Null),
            ]),
            RESERVED_KEY_PREFIX,
        );
        assert_eq!(
            record.into_value(),
            json!({"a": 1, "c": null, "d": null, "e": null})
        );
    }

    #[test]
    fn test_sanitize_strips_reserved_keys_at_every_depth() {
        let nested = doc(vec![
            ("__internal", DocValue::Bool(true)),
            ("name", DocValue::from("Frank Herbert")),
            ("ratio", DocValue::Float(f64::NEG_INFINITY)),
        ]);
        let record = sanitize_document(
            doc(vec![
                ("__score", DocValue::Int(7)),
                ("title", DocValue::from("Dune")),
                (
                    "authors",
                    DocValue::List(vec![
                        DocValue::Map(nested),
                        DocValue::Undefined,
                        DocValue::Float(f64::NAN),
                    ]),
                ),
            ]),
            RESERVED_KEY_PREFIX,
        );
        assert_eq!(
            record.into_value(),
            json!({
                "title": "Dune",
                "authors": [{"name": "Frank Herbert", "ratio": null}, null]
            })
        );
    }

    #[test]
    fn test_sanitize_keeps_finite_floats_and_single_underscore_keys() {
        let record = sanitize_document(
            doc(vec![
                ("_year", DocValue::Int(1965)),
                ("rating", DocValue::Float(4.5)),
            ]),
            RESERVED_KEY_PREFIX,
        );
        assert_eq!(*record.get("_year").unwrap(), 1965);
        assert_eq!(*record.get("rating").unwrap(), 4.5);
    }

    #[test]
    fn test_empty_prefix_reserves_nothing() {
        let record = sanitize_document(doc(vec![("__kept", DocValue::Int(1))]), "");
        assert!(record.contains_key("__kept"));
    }
}
