//! Feed and document types
//!
//! Both wrap `serde_json` values. `Value` is already a closed enum over
//! null, bool, number, string, array and object, so every walk over feed
//! content is an exhaustive `match`.

use serde::Serialize;
use serde_json::{Map, Value};

/// Field holding the feed identifier a record was listed under
pub const THREATFOX_ID_FIELD: &str = "threatfox_id";

/// Field holding the UTC time of the transform pass
pub const INGESTED_AT_FIELD: &str = "ingested_at";

/// Parsed feed body, exactly as returned by the endpoint
///
/// Expected shape is `{ "<id>": [ { ...record... }, ... ], ... }`; the shape
/// is only checked when the feed is transformed.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeed(Value);

impl RawFeed {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for RawFeed {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// A sanitized, stamped record ready for the document store
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub(crate) fn from_fields(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn threatfox_id(&self) -> Option<&str> {
        self.0.get(THREATFOX_ID_FIELD).and_then(Value::as_str)
    }

    pub fn ingested_at(&self) -> Option<&str> {
        self.0.get(INGESTED_AT_FIELD).and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Short name of a JSON value's variant, for error messages
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
