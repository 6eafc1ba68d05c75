//! Canonical JSON encoding.
//!
//! Everything goes through a [`serde_json::Value`] whose objects are rebuilt
//! with sorted keys, so encoding unchanged data always yields the same bytes.

use crate::Error;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Style {
    Compact,
    Pretty,
}

impl Default for Style {
    fn default() -> Self {
        Style::Compact
    }
}

pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, Error> {
    Ok(sorted(serde_json::to_value(value)?))
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, Error> {
    to_json_with(value, Style::default())
}

pub fn to_json_with<T: Serialize + ?Sized>(value: &T, style: Style) -> Result<String, Error> {
    let value = to_value(value)?;
    let text = match style {
        Style::Compact => serde_json::to_string(&value)?,
        Style::Pretty => serde_json::to_string_pretty(&value)?,
    };
    Ok(text)
}

/// Decodes any JSON text and encodes it again in canonical compact form.
pub fn canonicalize(text: &str) -> Result<String, Error> {
    let value: Value = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(err) => {
            return Err(Error::SerializationError(format!(
                "Could not decode \"{}\" ({}).",
                text, err
            )))
        }
    };
    to_json(&value)
}

fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));

            let mut out = Map::new();
            for (key, value) in entries {
                out.insert(key, sorted(value));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}
