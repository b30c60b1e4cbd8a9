//! Loosely-typed document values exchanged with the store.
//!
//! Merged queue records are assembled as [`Document`]s before they reach the
//! store. A document can still hold values the store refuses to persist
//! (`Undefined`, non-finite floats, reserved keys); only a
//! [`SanitizedRecord`] is accepted for writing.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Key prefix the document store reserves for its own bookkeeping.
pub const RESERVED_KEY_PREFIX: &str = "__";

/// Field map of a document.
pub type Document = BTreeMap<String, DocValue>;

/// A single document field value.
#[derive(Debug, Clone, PartialEq)]
pub enum DocValue {
    /// Field was never assigned.
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<DocValue>),
    Map(Document),
}

impl From<Value> for DocValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&str> for DocValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DocValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for DocValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for DocValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for DocValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for DocValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for DocValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<String>> for DocValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values.into_iter().map(Self::Text).collect())
    }
}

impl From<Document> for DocValue {
    fn from(value: Document) -> Self {
        Self::Map(value)
    }
}

/// `None` maps to [`DocValue::Undefined`], mirroring an unset optional field.
impl<T: Into<DocValue>> From<Option<T>> for DocValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Undefined, Into::into)
    }
}

/// A document that passed sanitization and may be persisted.
///
/// Constructed by [`crate::enrich::sanitize_document`]; the store only accepts
/// this type for queue writes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SanitizedRecord(Map<String, Value>);

impl SanitizedRecord {
    pub(crate) fn from_sanitized_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Returns a field value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns true when the field exists (including explicit `null`).
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Stamps the queue position assigned during allocation.
    pub(crate) fn stamp_index(&mut self, index: i64) {
        self.0.insert("index".to_string(), Value::from(index));
    }

    /// Stamps the persistence timestamp.
    pub(crate) fn stamp_created_at(&mut self, created_at: &str) {
        self.0
            .insert("createdAt".to_string(), Value::from(created_at.to_string()));
    }

    /// Borrows the underlying JSON object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Converts into a JSON object value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}
