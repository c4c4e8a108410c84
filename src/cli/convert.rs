//! JSON -> Value conversion

use crate::Value;

/// Converts a parsed JSON document into a [`Value`].
///
/// Arrays become collections and `null` becomes the empty collection;
/// nulls inside arrays are dropped.
pub fn json_to_value(v: serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::empty(),
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => Value::Collection(
            arr.into_iter()
                .filter(|item| !item.is_null())
                .map(json_to_value)
                .collect(),
        ),
        serde_json::Value::Object(obj) => Value::Object(
            obj.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, json_to_value(v)))
                .collect(),
        ),
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        json_to_value(v)
    }
}
