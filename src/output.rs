//! Rendering of values as JSON and as expression literals.
//!
//! # Features
//!
//! - **Compact output** via [`to_json()`]
//! - **Pretty output** via [`to_json_pretty()`] - 2-space indentation
//! - **Literal output** via [`to_literal()`] - source text that evaluates back
//!   to the same value
//! - **Document order** - object keys keep the order they were read in
//!
//! # Examples
//!
//! ```
//! use fhirpath_lang::Value;
//! use fhirpath_lang::output::{to_json, to_literal};
//!
//! assert_eq!(to_json(&Value::Number(42.0)), "42");
//! assert_eq!(to_literal(&Value::String("it's".into())).as_deref(), Some("'it\\'s'"));
//! ```

use crate::{
    lexer::CALENDAR_UNITS,
    value::{Value, format_number},
};

/// Converts values to `serde_json` trees and prints them.
pub struct JsonPrinter {
    pretty: bool,
}

impl JsonPrinter {
    pub fn new(pretty: bool) -> Self {
        JsonPrinter { pretty }
    }

    pub fn print(&self, value: &Value) -> String {
        let json = to_json_value(value);
        let printed = if self.pretty {
            serde_json::to_string_pretty(&json)
        } else {
            serde_json::to_string(&json)
        };
        // Serializing a `serde_json::Value` cannot fail.
        printed.unwrap_or_default()
    }
}

fn json_number(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

/// Converts a value into a JSON tree. Quantities become
/// `{"value": .., "unit": ..}` objects.
pub fn to_json_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => json_number(*n),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Quantity(q) => {
            let mut map = serde_json::Map::new();
            map.insert("value".to_string(), json_number(q.value));
            map.insert("unit".to_string(), serde_json::Value::String(q.unit.clone()));
            serde_json::Value::Object(map)
        }
        Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), to_json_value(v)))
                .collect(),
        ),
        Value::Collection(items) => {
            serde_json::Value::Array(items.iter().map(to_json_value).collect())
        }
    }
}

/// Converts a Value to compact JSON.
pub fn to_json(value: &Value) -> String {
    JsonPrinter::new(false).print(value)
}

/// Converts a Value to pretty-printed JSON.
pub fn to_json_pretty(value: &Value) -> String {
    JsonPrinter::new(true).print(value)
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Renders a scalar as literal source text.
///
/// Objects and collections have no literal form and return `None`.
pub fn to_literal(value: &Value) -> Option<String> {
    match value {
        Value::Boolean(b) => Some(b.to_string()),
        Value::Number(n) if n.is_finite() => Some(format_number(*n)),
        Value::Number(_) => None,
        Value::String(s) => Some(quote(s)),
        Value::Quantity(q) => {
            let number = format_number(q.value);
            let calendar = q
                .unit
                .strip_prefix('{')
                .and_then(|u| u.strip_suffix('}'))
                .filter(|u| CALENDAR_UNITS.contains(u));
            Some(match calendar {
                Some(word) => format!("{} {}", number, word),
                None => format!("{} {}", number, quote(&q.unit)),
            })
        }
        Value::Object(_) | Value::Collection(_) => None,
    }
}
