use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Reserved document key holding the source identifier.
pub const ID_FIELD: &str = "_id";

/// A source document: top-level field names mapped to values.
///
/// Uses `BTreeMap` so iteration and serialization order are deterministic.
pub type Document = BTreeMap<String, DocValue>;

/// Database-native 12-byte object identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Wraps raw identifier bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Raw identifier bytes.
    #[must_use]
    pub const fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Canonical lowercase 24-character hex form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Error returned when parsing an [`ObjectId`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid object id {input:?}: expected 24 hex characters")]
pub struct ParseObjectIdError {
    input: String,
}

impl FromStr for ObjectId {
    type Err = ParseObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| ParseObjectIdError {
            input: s.to_string(),
        })?;
        Ok(Self(bytes))
    }
}

/// Driver-independent value of a document field.
///
/// Covers the JSON-compatible types plus the document database's own
/// identifier type, binary data, and its "undefined" sentinel. Concrete
/// sources convert their native values into this model before the
/// pipeline sees them.
#[derive(Debug, Clone, PartialEq)]
pub enum DocValue {
    /// Explicit null.
    Null,
    /// The driver's deprecated "undefined" sentinel. Treated like null.
    Undefined,
    /// Boolean.
    Bool(bool),
    /// Signed 64-bit integer (32-bit source integers widen into this).
    Int(i64),
    /// 64-bit IEEE 754 float.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Native object identifier.
    ObjectId(ObjectId),
    /// Binary data.
    Bytes(Vec<u8>),
    /// Ordered sequence of values.
    Array(Vec<DocValue>),
    /// Embedded document.
    Map(BTreeMap<String, DocValue>),
}

impl DocValue {
    /// Short type name used in log lines and error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Undefined => "undefined",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::ObjectId(_) => "objectId",
            Self::Bytes(_) => "binary",
            Self::Array(_) => "array",
            Self::Map(_) => "document",
        }
    }

    /// Returns the embedded document if this value is one.
    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, DocValue>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// True for `Null` and `Undefined`.
    #[must_use]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Null | Self::Undefined)
    }
}

impl From<serde_json::Value> for DocValue {
    /// Lossless except for integers beyond `i64`, which become floats.
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(fields) => {
                Self::Map(fields.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&str> for DocValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for DocValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for DocValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for DocValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<ObjectId> for DocValue {
    fn from(value: ObjectId) -> Self {
        Self::ObjectId(value)
    }
}

/// Converts a JSON object into a [`Document`]. Non-object JSON yields an
/// empty document.
#[must_use]
pub fn document_from_json(value: serde_json::Value) -> Document {
    match DocValue::from(value) {
        DocValue::Map(map) => map,
        _ => Document::new(),
    }
}

// Object ids serialize as their hex form.
impl Serialize for ObjectId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
