use std::{cmp::Ordering, fmt, sync::LazyLock};

use indexmap::IndexMap;
use regex::Regex;

/// Absolute tolerance used by `=` on plain numbers.
pub const NUMBER_EPSILON: f64 = 1e-8;

/// Absolute tolerance used by `~` on numbers and by both `=` and `~` on quantities.
pub const LOOSE_EPSILON: f64 = 0.01;

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}(-\d{2}(-\d{2})?)?").expect("valid date pattern"));
static DATE_TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}(-\d{2}(-\d{2})?)?T").expect("valid date-time pattern"));
static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^T\d{2}").expect("valid time pattern"));

/// A number paired with a unit.
///
/// UCUM units are stored as written (`mg`, `kg/m2`). Calendar durations use
/// the placeholder form `{day}`, `{years}` and so on.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: String,
}

impl Quantity {
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Quantity {
            value,
            unit: unit.into(),
        }
    }
}

/// The runtime value of a FHIRPath expression.
///
/// Documents are loosely typed: resources and their sub-structures are
/// plain [`Value::Object`]s, and every evaluation result is (or is
/// normalized into) a [`Value::Collection`]. There is no null variant;
/// absence is an empty collection.
///
/// # Examples
///
/// ```
/// use fhirpath_lang::Value;
///
/// let name = Value::String("Alice".to_string());
/// let nothing = Value::empty();
///
/// assert!(name.is_truthy());
/// assert!(!nothing.is_truthy());
/// assert_eq!(Value::Collection(vec![name.clone()]).singleton(), Some(&name));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `true` / `false`
    Boolean(bool),

    /// Integers and decimals share one representation
    Number(f64),

    /// Strings, including date, date-time and time values
    String(String),

    /// Quantity literal or the result of a quantity conversion
    Quantity(Quantity),

    /// Resource or complex element, keys in document order
    Object(IndexMap<String, Value>),

    /// Ordered sequence of values
    Collection(Vec<Value>),
}

impl Value {
    /// The empty collection.
    pub fn empty() -> Value {
        Value::Collection(Vec::new())
    }

    pub fn is_empty_collection(&self) -> bool {
        matches!(self, Value::Collection(items) if items.is_empty())
    }

    /// Flattens one level: a collection yields its elements, anything else
    /// yields itself.
    pub fn into_collection(self) -> Vec<Value> {
        match self {
            Value::Collection(items) => items,
            other => vec![other],
        }
    }

    /// Borrowing counterpart of [`Value::into_collection`].
    pub fn to_collection(&self) -> Vec<Value> {
        self.clone().into_collection()
    }

    /// Returns the only element of a one-element collection, or the value
    /// itself when it is not a collection.
    pub fn singleton(&self) -> Option<&Value> {
        match self {
            Value::Collection(items) if items.len() == 1 => items.first(),
            Value::Collection(_) => None,
            other => Some(other),
        }
    }

    /// Truthiness used by `where`, `exists`, `iif` and the logical operators.
    ///
    /// A collection is true when it is non-empty and its first element is
    /// truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Quantity(_) | Value::Object(_) => true,
            Value::Collection(items) => match items.first() {
                None => false,
                Some(Value::Collection(_)) => true,
                Some(first) => first.is_truthy(),
            },
        }
    }

    /// A literal boolean, either bare or as a one-element collection.
    pub fn as_bool(&self) -> Option<bool> {
        match self.singleton() {
            Some(Value::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Reads a key of an object value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// The declared type tag of a resource (`resourceType`).
    pub fn resource_type(&self) -> Option<&str> {
        self.get("resourceType").and_then(Value::as_str)
    }

    /// The numeric part of a quantity-shaped value.
    ///
    /// Quantity literals qualify, and so does any object carrying a numeric
    /// `value` key (a FHIR `Quantity`, `Age`, `Duration`, ...).
    pub fn quantity_value(&self) -> Option<f64> {
        match self {
            Value::Quantity(q) => Some(q.value),
            Value::Object(map) => map.get("value").and_then(Value::as_number),
            _ => None,
        }
    }

    pub fn is_quantity(&self) -> bool {
        self.quantity_value().is_some()
    }

    /// Rebuilds a quantity-shaped value around a new number, keeping every
    /// other field. Non-quantities become a plain number.
    pub fn with_quantity_value(&self, value: f64) -> Value {
        match self {
            Value::Quantity(q) => Value::Quantity(Quantity::new(value, q.unit.clone())),
            Value::Object(map) if map.contains_key("value") => {
                let mut map = map.clone();
                map.insert("value".to_string(), Value::Number(value));
                Value::Object(map)
            }
            _ => Value::Number(value),
        }
    }

    fn quantity_units(&self) -> [Option<&str>; 2] {
        match self {
            Value::Quantity(q) => [Some(q.unit.as_str()), None],
            Value::Object(map) => [
                map.get("unit").and_then(Value::as_str),
                map.get("code").and_then(Value::as_str),
            ],
            _ => [None, None],
        }
    }

    /// Human-readable kind, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Quantity(_) => "quantity",
            Value::Object(_) => "object",
            Value::Collection(_) => "collection",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Quantity> for Value {
    fn from(q: Quantity) -> Self {
        Value::Quantity(q)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Collection(items)
    }
}

/// Formats a number the way results print: whole numbers without a
/// fraction, everything else in shortest round-trip form.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::Quantity(q) => write!(f, "{} '{}'", format_number(q.value), q.unit),
            Value::Object(_) => f.write_str(&crate::output::to_json(self)),
            Value::Collection(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                f.write_str(&parts.join(", "))
            }
        }
    }
}

/// Any `unit`/`code` on one side matching any on the other. Two unitless
/// quantities match.
fn units_match(a: &Value, b: &Value) -> bool {
    let left = a.quantity_units();
    let right = b.quantity_units();
    if left.iter().chain(&right).all(Option::is_none) {
        return true;
    }
    left.iter()
        .flatten()
        .any(|l| right.iter().flatten().any(|r| l == r))
}

/// Value equality as used by `=`, `distinct`, `union`, `in` and friends.
///
/// Numbers compare within [`NUMBER_EPSILON`]; quantities compare within
/// [`LOOSE_EPSILON`] and need a matching `unit` or `code`. Collections and
/// objects compare structurally.
pub fn equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => (x - y).abs() < NUMBER_EPSILON,
        (Value::Collection(xs), Value::Collection(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| equals(x, y))
        }
        _ if a.is_quantity() && b.is_quantity() => match (a.quantity_value(), b.quantity_value()) {
            (Some(x), Some(y)) => (x - y).abs() < LOOSE_EPSILON && units_match(a, b),
            _ => false,
        },
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| equals(v, other)))
        }
        _ => a == b,
    }
}

/// Looser equality used by `~`.
///
/// Numbers within [`LOOSE_EPSILON`], strings case-insensitively, and
/// collections regardless of order.
pub fn equivalent(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => (x - y).abs() < LOOSE_EPSILON,
        (Value::String(x), Value::String(y)) => x.to_lowercase() == y.to_lowercase(),
        (Value::Collection(xs), Value::Collection(ys)) => {
            if xs.len() != ys.len() {
                return false;
            }
            let mut xs = xs.clone();
            let mut ys = ys.clone();
            xs.sort_by(compare);
            ys.sort_by(compare);
            xs.iter().zip(&ys).all(|(x, y)| equivalent(x, y))
        }
        (Value::Object(x), Value::Object(y)) if !a.is_quantity() || !b.is_quantity() => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| equivalent(v, other)))
        }
        _ => equals(a, b),
    }
}

fn kind_rank(v: &Value) -> u8 {
    match v {
        Value::Boolean(_) => 0,
        Value::Number(_) => 1,
        Value::Quantity(_) => 2,
        Value::String(_) => 3,
        Value::Object(_) => 4,
        Value::Collection(_) => 5,
    }
}

/// Total order used to sort collections before an order-independent
/// comparison. Values of different kinds order by kind.
pub fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x.total_cmp(y),
        (Value::Quantity(x), Value::Quantity(y)) => {
            x.value.total_cmp(&y.value).then_with(|| x.unit.cmp(&y.unit))
        }
        (Value::String(x), Value::String(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        (Value::Collection(xs), Value::Collection(ys)) => xs.len().cmp(&ys.len()),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

/// Drops later elements that are [`equals`] to an earlier one.
pub fn remove_duplicates(items: Vec<Value>) -> Vec<Value> {
    let mut result: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        if !result.iter().any(|seen| equals(seen, &item)) {
            result.push(item);
        }
    }
    result
}

/// Runtime type test behind `is`, `as`, `ofType` and `is()`.
///
/// System types are recognised from the value's shape; anything else is
/// matched against the object's `resourceType`.
pub fn is_type(value: &Value, type_name: &str) -> bool {
    match type_name {
        "Boolean" => matches!(value, Value::Boolean(_)),
        "Integer" => matches!(value, Value::Number(n) if n.fract() == 0.0),
        "Decimal" => matches!(value, Value::Number(_)),
        "String" => matches!(value, Value::String(_)),
        "Date" => value.as_str().is_some_and(|s| DATE_PATTERN.is_match(s)),
        "DateTime" => value.as_str().is_some_and(|s| DATE_TIME_PATTERN.is_match(s)),
        "Time" => value.as_str().is_some_and(|s| TIME_PATTERN.is_match(s)),
        "Period" => matches!(value, Value::Object(map) if map.contains_key("start") || map.contains_key("end")),
        "Quantity" => value.is_quantity(),
        _ => value.resource_type() == Some(type_name),
    }
}

#[test]
fn quantity_units_match_across_unit_and_code() {
    let mut obj = IndexMap::new();
    obj.insert("value".to_string(), Value::Number(5.0));
    obj.insert("code".to_string(), Value::String("mg".to_string()));
    let object = Value::Object(obj);

    assert!(equals(&object, &Value::Quantity(Quantity::new(5.001, "mg"))));
    assert!(!equals(&object, &Value::Quantity(Quantity::new(5.0, "kg"))));
}

#[test]
fn unitless_quantities_match_each_other() {
    let mut obj = IndexMap::new();
    obj.insert("value".to_string(), Value::Number(5.0));
    let object = Value::Object(obj);

    assert!(equals(&object, &object.clone()));
    assert!(!equals(&object, &Value::Quantity(Quantity::new(5.0, "mg"))));
}
