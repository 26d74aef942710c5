//! Typed resource values.

use serde::{Deserialize, Serialize};

/// A typed resource value as stored in a table or pack and returned by
/// accessor operations.
///
/// The serde representation uses externally tagged snake_case variants
/// (`{"text": "Hello"}`, `{"int": 42}`), which is the form pack manifests
/// store values in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    IntList(Vec<i64>),
    TextList(Vec<String>),
    /// Opaque binary payload (layouts, animations, image data).
    Blob(Vec<u8>),
}

impl Value {
    /// `true` for [`Value::Text`].
    pub fn is_text(&self) -> bool {
        matches!(self, Value::Text(_))
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Variant name for log lines.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Text(_) => "text",
            Value::IntList(_) => "int_list",
            Value::TextList(_) => "text_list",
            Value::Blob(_) => "blob",
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}
