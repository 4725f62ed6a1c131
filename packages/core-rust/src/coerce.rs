//! Conversion of resolved field values into sink-safe property values.
//!
//! The sink rejects array-typed properties and treats nulls as validation
//! errors, so both are handled here before a record leaves the pipeline:
//!
//! 1. Arrays become their JSON text encoding (a string).
//! 2. Absent, null and undefined values are omitted.
//! 3. Everything else passes through as a JSON scalar. Object ids become
//!    hex strings, binary data becomes base64, embedded documents become
//!    JSON objects.

use base64::prelude::{Engine as _, BASE64_STANDARD};
use serde_json::{Map, Number, Value};

use crate::error::CoercionError;
use crate::types::DocValue;

/// Coerces a resolved value for inclusion in a record.
///
/// `Ok(None)` means the field is left out of the record.
///
/// # Errors
///
/// Returns [`CoercionError::ValueEncoding`] when the value cannot be encoded
/// as JSON (for example a non-finite float). Callers drop the field and keep
/// the rest of the record.
pub fn coerce(value: Option<&DocValue>) -> Result<Option<Value>, CoercionError> {
    match value {
        Some(array @ DocValue::Array(_)) => {
            let encoded = to_json(array)?;
            let text = serde_json::to_string(&encoded).map_err(|e| CoercionError::ValueEncoding {
                reason: e.to_string(),
            })?;
            Ok(Some(Value::String(text)))
        }
        None | Some(DocValue::Null | DocValue::Undefined) => Ok(None),
        Some(other) => to_json(other).map(Some),
    }
}

/// Converts a value into its JSON form without the top-level array rule.
///
/// Nulls and undefined nested inside arrays or documents become JSON `null`.
///
/// # Errors
///
/// Returns [`CoercionError::ValueEncoding`] if any float in the tree is NaN
/// or infinite.
pub fn to_json(value: &DocValue) -> Result<Value, CoercionError> {
    Ok(match value {
        DocValue::Null | DocValue::Undefined => Value::Null,
        DocValue::Bool(b) => Value::Bool(*b),
        DocValue::Int(i) => Value::Number(Number::from(*i)),
        DocValue::Float(f) => {
            Value::Number(
                Number::from_f64(*f).ok_or_else(|| CoercionError::ValueEncoding {
                    reason: format!("non-finite float {f}"),
                })?,
            )
        }
        DocValue::String(s) => Value::String(s.clone()),
        DocValue::ObjectId(oid) => Value::String(oid.to_hex()),
        DocValue::Bytes(bytes) => Value::String(BASE64_STANDARD.encode(bytes)),
        DocValue::Array(items) => {
            Value::Array(items.iter().map(to_json).collect::<Result<Vec<_>, _>>()?)
        }
        DocValue::Map(fields) => {
            let mut object = Map::with_capacity(fields.len());
            for (key, inner) in fields {
                object.insert(key.clone(), to_json(inner)?);
            }
            Value::Object(object)
        }
    })
}
