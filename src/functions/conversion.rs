use std::sync::LazyLock;

use regex::Regex;

use super::validate_singleton;
use crate::{
    ast::Atom,
    date::parse_date_string,
    evaluator::{EvalContext, EvalError},
    lexer::CALENDAR_UNITS,
    value::{Quantity, Value, format_number},
};

static INTEGER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+$").expect("valid integer pattern"));
static DECIMAL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d{1,9}(\.\d{1,9})?$").expect("valid decimal pattern"));
static QUANTITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?\d{1,9}(?:\.\d{1,9})?)(?:\s*'([^']*)'|\s+([a-z]+))?$")
        .expect("valid quantity pattern")
});
static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}(-\d{2}(-\d{2})?)?").expect("valid date pattern"));
static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}(:\d{2}(:\d{2})?)?").expect("valid time pattern"));

/// iif(criterion, true-result, otherwise-result?) - conditional; only the
/// chosen branch is evaluated
pub fn iif(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    let (Some(criterion), Some(true_result)) = (args.first(), args.get(1)) else {
        return Err(EvalError::Argument(
            "iif() requires a criterion and a true-result".to_string(),
        ));
    };
    let focus = Value::Collection(input.to_vec());
    let ctx = ctx.with_this(&focus);

    let condition = criterion.eval(&ctx, &focus)?;
    if !condition.is_empty_collection() && condition.as_bool().is_none() {
        return Err(EvalError::Type(
            "Expected criterion to evaluate to a Boolean".to_string(),
        ));
    }

    if condition.is_truthy() {
        true_result.eval(&ctx, &focus)
    } else if let Some(otherwise) = args.get(2) {
        otherwise.eval(&ctx, &focus)
    } else {
        Ok(Value::empty())
    }
}

/// Runs a singleton conversion: empty in, empty out; more than one element
/// is an arity error.
fn convert(
    name: &str,
    input: &[Value],
    f: fn(&Value) -> Option<Value>,
) -> Result<Value, EvalError> {
    Ok(validate_singleton(name, input)?
        .and_then(f)
        .unwrap_or_else(Value::empty))
}

/// Reports whether the matching conversion would succeed.
fn converts(
    name: &str,
    input: &[Value],
    f: fn(&Value) -> Option<Value>,
) -> Result<Value, EvalError> {
    Ok(match validate_singleton(name, input)? {
        None => Value::empty(),
        Some(value) => Value::Boolean(f(value).is_some()),
    })
}

fn boolean_of(value: &Value) -> Option<Value> {
    let b = match value {
        Value::Boolean(b) => *b,
        Value::Number(n) if *n == 0.0 || *n == 1.0 => *n == 1.0,
        Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" | "1.0" => true,
            "false" | "f" | "no" | "n" | "0" | "0.0" => false,
            _ => return None,
        },
        _ => return None,
    };
    Some(Value::Boolean(b))
}

fn integer_of(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) if n.fract() == 0.0 => Some(Value::Number(*n)),
        Value::String(s) if INTEGER_PATTERN.is_match(s) => {
            s.parse::<i64>().ok().map(|n| Value::Number(n as f64))
        }
        Value::Boolean(b) => Some(Value::Number(if *b { 1.0 } else { 0.0 })),
        _ => None,
    }
}

fn decimal_of(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) => Some(Value::Number(*n)),
        Value::String(s) if DECIMAL_PATTERN.is_match(s) => s.parse::<f64>().ok().map(Value::Number),
        Value::Boolean(b) => Some(Value::Number(if *b { 1.0 } else { 0.0 })),
        _ => None,
    }
}

fn quantity_of(value: &Value) -> Option<Value> {
    match value {
        _ if value.is_quantity() => Some(value.clone()),
        Value::Number(n) => Some(Value::Quantity(Quantity::new(*n, "1"))),
        Value::Boolean(b) => Some(Value::Quantity(Quantity::new(if *b { 1.0 } else { 0.0 }, "1"))),
        Value::String(s) => {
            let captures = QUANTITY_PATTERN.captures(s.trim())?;
            let number = captures.get(1)?.as_str().parse::<f64>().ok()?;
            let unit = match (captures.get(2), captures.get(3)) {
                (Some(ucum), _) => ucum.as_str().to_string(),
                (None, Some(word)) if CALENDAR_UNITS.contains(&word.as_str()) => {
                    format!("{{{}}}", word.as_str())
                }
                (None, Some(_)) => return None,
                (None, None) => "1".to_string(),
            };
            Some(Value::Quantity(Quantity::new(number, unit)))
        }
        _ => None,
    }
}

fn string_of(value: &Value) -> Option<Value> {
    let text = match value {
        Value::Object(map) => {
            let number = value.quantity_value()?;
            let unit = map
                .get("unit")
                .or_else(|| map.get("code"))
                .and_then(Value::as_str)
                .unwrap_or("1");
            format!("{} '{}'", format_number(number), unit)
        }
        Value::Collection(_) => return None,
        other => other.to_string(),
    };
    Some(Value::String(text))
}

fn date_of(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) if DATE_PATTERN.is_match(s) => Some(Value::String(parse_date_string(s))),
        _ => None,
    }
}

fn time_of(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) if TIME_PATTERN.is_match(s) => {
            Some(Value::String(parse_date_string(&format!("T{}", s))))
        }
        _ => None,
    }
}

/// toBoolean() - `true/t/yes/y/1/1.0` and `false/f/no/n/0/0.0`, any case
pub fn to_boolean(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    convert("toBoolean", input, boolean_of)
}

pub fn converts_to_boolean(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    converts("convertsToBoolean", input, boolean_of)
}

/// toInteger() - whole numbers, integer strings, booleans as 1/0
pub fn to_integer(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    convert("toInteger", input, integer_of)
}

pub fn converts_to_integer(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    converts("convertsToInteger", input, integer_of)
}

/// toDecimal() - numbers, decimal strings, booleans as 1/0
pub fn to_decimal(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    convert("toDecimal", input, decimal_of)
}

pub fn converts_to_decimal(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    converts("convertsToDecimal", input, decimal_of)
}

/// toQuantity() - quantities as-is; numbers, booleans and strings get unit `1`
/// unless the string names one
pub fn to_quantity(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    convert("toQuantity", input, quantity_of)
}

pub fn converts_to_quantity(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    converts("convertsToQuantity", input, quantity_of)
}

/// toString() - quantities render as `value 'unit'`
pub fn to_string(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    convert("toString", input, string_of)
}

pub fn converts_to_string(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    converts("convertsToString", input, string_of)
}

pub fn to_date(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    convert("toDate", input, date_of)
}

pub fn converts_to_date(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    converts("convertsToDate", input, date_of)
}

pub fn to_date_time(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    convert("toDateTime", input, date_of)
}

pub fn converts_to_date_time(
    _: &EvalContext,
    input: &[Value],
    _: &[Atom],
) -> Result<Value, EvalError> {
    converts("convertsToDateTime", input, date_of)
}

/// toTime() - `hh`, `hh:mm` or `hh:mm:ss` padded to a full time
pub fn to_time(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    convert("toTime", input, time_of)
}

pub fn converts_to_time(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    converts("convertsToTime", input, time_of)
}

/// not() - boolean negation of the converted input
pub fn not(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    Ok(match validate_singleton("not", input)?.and_then(boolean_of) {
        Some(Value::Boolean(b)) => Value::Boolean(!b),
        _ => Value::empty(),
    })
}
