//! Opaque cursor strings for [`IndexKey`]s.
//!
//! A cursor is a compact JSON array with one element per key value. Values
//! that plain JSON cannot express unambiguously are wrapped:
//!
//! - `Unset` becomes `{"$unset": true}`
//! - objects become `{"$object": {...}}`
//!
//! Every other value is written as itself, so cursors stay readable in logs.

use serde_json::{Map, Value, json};

use crate::error::{CursorError, Error};

use super::{IndexKey, IndexValue};

const UNSET_TAG: &str = "$unset";
const OBJECT_TAG: &str = "$object";

impl IndexKey {
    /// Encode this key as a cursor string.
    pub fn to_cursor(&self) -> String {
        Value::Array(self.values().iter().map(encode_value).collect()).to_string()
    }

    /// Decode a cursor produced by [`IndexKey::to_cursor`].
    pub fn from_cursor(cursor: &str) -> Result<Self, Error> {
        let parsed: Value = serde_json::from_str(cursor).map_err(CursorError::from)?;
        let items = match parsed {
            Value::Array(items) => items,
            other => {
                return Err(
                    CursorError::Malformed(format!("expected an array, got {other}")).into(),
                );
            }
        };
        let values = items
            .iter()
            .map(decode_value)
            .collect::<Result<Vec<_>, CursorError>>()?;
        Ok(IndexKey::new(values))
    }
}

fn encode_value(val: &IndexValue) -> Value {
    match val {
        IndexValue::Unset => json!({ UNSET_TAG: true }),
        IndexValue::Array(items) => Value::Array(items.iter().map(encode_value).collect()),
        IndexValue::Object(entries) => {
            let inner: Map<String, Value> = entries
                .iter()
                .map(|(k, v)| (k.clone(), encode_value(v)))
                .collect();
            json!({ OBJECT_TAG: inner })
        }
        scalar => scalar.to_json().unwrap_or(Value::Null),
    }
}

fn decode_value(val: &Value) -> Result<IndexValue, CursorError> {
    match val {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            Ok(IndexValue::from_json(val))
        }
        Value::Array(items) => Ok(IndexValue::Array(
            items.iter().map(decode_value).collect::<Result<_, _>>()?,
        )),
        Value::Object(obj) => {
            if obj.len() != 1 {
                return Err(CursorError::Malformed(format!(
                    "tagged value must have exactly one entry, got {}",
                    obj.len()
                )));
            }
            match (obj.get(UNSET_TAG), obj.get(OBJECT_TAG)) {
                (Some(Value::Bool(true)), _) => Ok(IndexValue::Unset),
                (_, Some(Value::Object(inner))) => {
                    let mut entries = inner
                        .iter()
                        .map(|(k, v)| Ok((k.clone(), decode_value(v)?)))
                        .collect::<Result<Vec<_>, CursorError>>()?;
                    entries.sort_by(|a, b| a.0.cmp(&b.0));
                    Ok(IndexValue::Object(entries))
                }
                _ => Err(CursorError::Malformed(format!("unknown tagged value {val}"))),
            }
        }
    }
}
