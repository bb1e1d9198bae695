use serde::Serialize;
use std::fmt;

/// One field as the query service returns it: a tagged union with exactly one
/// member set. Tags this crate does not model land in `Unsupported` together
/// with a textual rendering of the raw field.
#[derive(Debug, Clone, PartialEq)]
pub enum WireField {
    String(String),
    Long(i64),
    Double(f64),
    Boolean(bool),
    IsNull,
    Unsupported { tag: String, text: String },
}

/// A decoded scalar, uniform across every column type the warehouse can return.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Textual form used when a value is normalized to a string, `None` for null.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => f.write_str("NULL"),
        }
    }
}

/// Decode one wire field. Never fails: unknown tags fall back to their text.
pub fn decode_field(field: WireField) -> Value {
    match field {
        WireField::String(s) => Value::Text(s),
        WireField::Long(i) => Value::Int(i),
        WireField::Double(x) => Value::Float(x),
        WireField::Boolean(b) => Value::Bool(b),
        WireField::IsNull => Value::Null,
        WireField::Unsupported { tag, text } => {
            tracing::warn!(tag = %tag, "unsupported field type, keeping textual form");
            Value::Text(text)
        }
    }
}
