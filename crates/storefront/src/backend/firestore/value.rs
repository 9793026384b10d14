//! Firestore typed-value codec.
//!
//! The REST API wraps every field in a single-key object naming its type:
//!
//! ```text
//! {"nome": {"stringValue": "Vestido"}, "preco": {"doubleValue": 89.9},
//!  "cores": {"arrayValue": {"values": [{"stringValue": "Azul"}]}}}
//! ```
//!
//! These helpers convert between that shape and plain `serde_json` values.
//! Integers travel as decimal strings; timestamps and references decode to
//! strings.

use serde_json::{Map, Number, Value, json};

use crate::backend::BackendError;

/// Wrap a plain JSON value in Firestore's typed representation.
#[must_use]
pub fn encode(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else {
                json!({ "doubleValue": n })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Encode every field of a document.
#[must_use]
pub fn encode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), encode(v)))
        .collect()
}

/// Unwrap a Firestore typed value.
///
/// # Errors
///
/// Returns `BackendError::Malformed` for unknown value types or integers that
/// do not parse.
pub fn decode(value: &Value) -> Result<Value, BackendError> {
    let malformed = |reason: String| BackendError::Malformed {
        document: "<value>".to_string(),
        reason,
    };

    let Some((kind, inner)) = value.as_object().and_then(|m| m.iter().next()) else {
        return Err(malformed(format!("expected typed value, got {value}")));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "integerValue" => {
            let text = inner.as_str().map_or_else(|| inner.to_string(), str::to_owned);
            text.parse::<i64>()
                .map(|i| Value::Number(Number::from(i)))
                .map_err(|e| malformed(format!("integerValue {text}: {e}")))
        }
        "booleanValue" | "doubleValue" | "stringValue" | "timestampValue" | "referenceValue"
        | "bytesValue" | "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => {
            let items = inner
                .get("values")
                .and_then(Value::as_array)
                .map_or_else(|| Ok(Vec::new()), |vs| vs.iter().map(decode).collect())?;
            Ok(Value::Array(items))
        }
        "mapValue" => {
            let fields = inner
                .get("fields")
                .and_then(Value::as_object)
                .map_or_else(|| Ok(Map::new()), decode_fields)?;
            Ok(Value::Object(fields))
        }
        other => Err(malformed(format!("unknown value type {other}"))),
    }
}

/// Decode every field of a document.
///
/// # Errors
///
/// Returns the first decoding error.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>, BackendError> {
    fields
        .iter()
        .map(|(k, v)| decode(v).map(|d| (k.clone(), d)))
        .collect()
}
