//! The raw value received from the webhook, as a tagged union.
//!
//! The backend has no fixed schema: depending on how its workflow ends it
//! answers with an object, an array wrapping an object, a bare string, or a
//! string that itself contains JSON.  [`RemotePayload`] names those shapes so
//! the interpreter can match on them instead of probing a loose value.

use serde_json::{Map, Value};

/// A webhook reply before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RemotePayload {
    /// A JSON object.
    Object(Map<String, Value>),
    /// A JSON array; only the first element is ever interpreted.
    Array(Vec<Value>),
    /// A string, possibly holding embedded JSON.
    Text(String),
    /// A number, boolean or null.  Always handled by the fallback rule.
    Scalar(Value),
}

impl RemotePayload {
    /// Short name of the shape, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Object(_) => "object",
            Self::Array(_) => "array",
            Self::Text(_) => "text",
            Self::Scalar(_) => "scalar",
        }
    }

    /// Convert back into a plain JSON value.
    pub fn into_value(self) -> Value {
        match self {
            Self::Object(map) => Value::Object(map),
            Self::Array(items) => Value::Array(items),
            Self::Text(text) => Value::String(text),
            Self::Scalar(value) => value,
        }
    }
}

impl From<Value> for RemotePayload {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Object(map),
            Value::Array(items) => Self::Array(items),
            Value::String(text) => Self::Text(text),
            other => Self::Scalar(other),
        }
    }
}

impl From<&str> for RemotePayload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for RemotePayload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Map<String, Value>> for RemotePayload {
    fn from(map: Map<String, Value>) -> Self {
        Self::Object(map)
    }
}
