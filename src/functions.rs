//! The standard function library.
//!
//! Every function receives the evaluation context, its input collection and
//! its arguments as unevaluated atoms. Functions decide themselves when, how
//! often and against what focus each argument is evaluated.
//!
//! Names are resolved once, at parse time, through [`lookup`].

use std::{collections::HashMap, sync::LazyLock};

use crate::{
    ast::Atom,
    evaluator::{EvalContext, EvalError},
    value::Value,
};

mod combining;
mod conversion;
mod existence;
mod filtering;
mod math;
mod navigation;
mod string;
mod subsetting;
mod types;
mod utility;

/// Signature shared by every library function.
pub type FunctionImpl = fn(&EvalContext<'_>, &[Value], &[Atom]) -> Result<Value, EvalError>;

static FUNCTIONS: LazyLock<HashMap<&'static str, FunctionImpl>> = LazyLock::new(|| {
    let mut table: HashMap<&'static str, FunctionImpl> = HashMap::new();

    // Existence
    table.insert("empty", existence::empty);
    table.insert("exists", existence::exists);
    table.insert("all", existence::all);
    table.insert("allTrue", existence::all_true);
    table.insert("anyTrue", existence::any_true);
    table.insert("allFalse", existence::all_false);
    table.insert("anyFalse", existence::any_false);
    table.insert("subsetOf", existence::subset_of);
    table.insert("supersetOf", existence::superset_of);
    table.insert("count", existence::count);
    table.insert("distinct", existence::distinct);
    table.insert("isDistinct", existence::is_distinct);

    // Filtering and projection
    table.insert("where", filtering::where_);
    table.insert("select", filtering::select);
    table.insert("repeat", filtering::repeat);
    table.insert("ofType", filtering::of_type);

    // Subsetting
    table.insert("single", subsetting::single);
    table.insert("first", subsetting::first);
    table.insert("last", subsetting::last);
    table.insert("tail", subsetting::tail);
    table.insert("skip", subsetting::skip);
    table.insert("take", subsetting::take);
    table.insert("intersect", subsetting::intersect);
    table.insert("exclude", subsetting::exclude);

    // Combining
    table.insert("union", combining::union);
    table.insert("combine", combining::combine);

    // Conversion
    table.insert("iif", conversion::iif);
    table.insert("toBoolean", conversion::to_boolean);
    table.insert("convertsToBoolean", conversion::converts_to_boolean);
    table.insert("toInteger", conversion::to_integer);
    table.insert("convertsToInteger", conversion::converts_to_integer);
    table.insert("toDecimal", conversion::to_decimal);
    table.insert("convertsToDecimal", conversion::converts_to_decimal);
    table.insert("toQuantity", conversion::to_quantity);
    table.insert("convertsToQuantity", conversion::converts_to_quantity);
    table.insert("toString", conversion::to_string);
    table.insert("convertsToString", conversion::converts_to_string);
    table.insert("toDate", conversion::to_date);
    table.insert("convertsToDate", conversion::converts_to_date);
    table.insert("toDateTime", conversion::to_date_time);
    table.insert("convertsToDateTime", conversion::converts_to_date_time);
    table.insert("toTime", conversion::to_time);
    table.insert("convertsToTime", conversion::converts_to_time);
    table.insert("not", conversion::not);

    // String manipulation
    table.insert("indexOf", string::index_of);
    table.insert("substring", string::substring);
    table.insert("startsWith", string::starts_with);
    table.insert("endsWith", string::ends_with);
    table.insert("contains", string::contains);
    table.insert("upper", string::upper);
    table.insert("lower", string::lower);
    table.insert("replace", string::replace);
    table.insert("matches", string::matches);
    table.insert("replaceMatches", string::replace_matches);
    table.insert("length", string::length);
    table.insert("toChars", string::to_chars);

    // Math
    table.insert("abs", math::abs);
    table.insert("ceiling", math::ceiling);
    table.insert("exp", math::exp);
    table.insert("floor", math::floor);
    table.insert("ln", math::ln);
    table.insert("log", math::log);
    table.insert("power", math::power);
    table.insert("round", math::round);
    table.insert("sqrt", math::sqrt);
    table.insert("truncate", math::truncate);

    // Tree navigation
    table.insert("children", navigation::children);
    table.insert("descendants", navigation::descendants);
    table.insert("resolve", navigation::resolve);

    // Utility
    table.insert("trace", utility::trace);
    table.insert("now", utility::now);
    table.insert("today", utility::today);
    table.insert("timeOfDay", utility::time_of_day);

    // Types
    table.insert("is", types::is);
    table.insert("as", types::as_);
    table.insert("type", types::type_);
    table.insert("conformsTo", types::conforms_to);

    table
});

/// Finds a library function by name.
pub fn lookup(name: &str) -> Option<FunctionImpl> {
    FUNCTIONS.get(name).copied()
}

/// Every registered function name, sorted.
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = FUNCTIONS.keys().copied().collect();
    names.sort_unstable();
    names
}

// ========================================
// Shared helpers
// ========================================

/// Checks that `input` holds at most one element.
pub(crate) fn validate_singleton<'v>(
    name: &str,
    input: &'v [Value],
) -> Result<Option<&'v Value>, EvalError> {
    match input {
        [] => Ok(None),
        [value] => Ok(Some(value)),
        _ => Err(EvalError::Arity(format!(
            "Expected input length one for {}()",
            name
        ))),
    }
}

/// Evaluates an argument against `focus` and unwraps a single element.
pub(crate) fn eval_single_arg(
    ctx: &EvalContext,
    arg: Option<&Atom>,
    focus: &Value,
) -> Result<Option<Value>, EvalError> {
    let Some(arg) = arg else {
        return Ok(None);
    };
    let value = arg.eval(ctx, focus)?;
    Ok(value.singleton().cloned())
}

pub(crate) fn string_arg(
    ctx: &EvalContext,
    arg: Option<&Atom>,
    focus: &Value,
    name: &str,
) -> Result<Option<String>, EvalError> {
    match eval_single_arg(ctx, arg, focus)? {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(EvalError::Argument(format!(
            "Expected a string argument for {}(), got {}",
            name,
            other.type_name()
        ))),
    }
}

pub(crate) fn number_arg(
    ctx: &EvalContext,
    arg: Option<&Atom>,
    focus: &Value,
    name: &str,
) -> Result<Option<f64>, EvalError> {
    match eval_single_arg(ctx, arg, focus)? {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n)),
        Some(other) => Err(EvalError::Argument(format!(
            "Expected a number argument for {}(), got {}",
            name,
            other.type_name()
        ))),
    }
}

/// Evaluates a collection argument (`union`, `intersect`, ...) against the
/// current `$this`.
pub(crate) fn collection_arg(ctx: &EvalContext, arg: &Atom) -> Result<Vec<Value>, EvalError> {
    Ok(arg.eval(ctx, ctx.this)?.into_collection())
}

/// Runs `f` on a singleton string input. Empty input and a `None` result
/// both yield the empty collection.
pub(crate) fn apply_string_fn(
    name: &str,
    input: &[Value],
    f: impl FnOnce(&str) -> Result<Option<Value>, EvalError>,
) -> Result<Value, EvalError> {
    let Some(value) = validate_singleton(name, input)? else {
        return Ok(Value::empty());
    };
    let Value::String(s) = value else {
        return Err(EvalError::Type(
            "String function cannot be called with non-string".to_string(),
        ));
    };
    Ok(f(s)?.unwrap_or_else(Value::empty))
}

/// Runs `f` on a singleton numeric input, unwrapping and re-wrapping a
/// quantity. Non-finite results yield the empty collection.
pub(crate) fn apply_math_fn(
    name: &str,
    input: &[Value],
    f: impl FnOnce(f64) -> Result<Option<f64>, EvalError>,
) -> Result<Value, EvalError> {
    let Some(value) = validate_singleton(name, input)? else {
        return Ok(Value::empty());
    };
    let Some(number) = value.quantity_value().or_else(|| value.as_number()) else {
        return Err(EvalError::Type(
            "Math function cannot be called with non-number".to_string(),
        ));
    };
    Ok(match f(number)? {
        Some(result) if result.is_finite() => value.with_quantity_value(result),
        _ => Value::empty(),
    })
}
