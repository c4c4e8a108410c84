use regex::Regex;

use super::{apply_string_fn, number_arg, string_arg};
use crate::{
    ast::Atom,
    evaluator::{EvalContext, EvalError},
    value::Value,
};

// String functions evaluate their arguments with the input string as focus.

fn compile(pattern: &str) -> Result<Regex, EvalError> {
    Regex::new(pattern).map_err(|e| EvalError::Argument(format!("Invalid regular expression: {}", e)))
}

/// indexOf(substring) - character index of the first occurrence, or -1
pub fn index_of(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    apply_string_fn("indexOf", input, |s| {
        let focus = Value::from(s);
        let Some(needle) = string_arg(ctx, args.first(), &focus, "indexOf")? else {
            return Ok(None);
        };
        let index = match s.find(&needle) {
            Some(byte) => s[..byte].chars().count() as f64,
            None => -1.0,
        };
        Ok(Some(Value::Number(index)))
    })
}

/// substring(start, length?) - empty when start is outside the string
pub fn substring(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    apply_string_fn("substring", input, |s| {
        let focus = Value::from(s);
        let Some(start) = number_arg(ctx, args.first(), &focus, "substring")? else {
            return Ok(None);
        };
        let length = number_arg(ctx, args.get(1), &focus, "substring")?;

        let char_count = s.chars().count();
        if start < 0.0 || start >= char_count as f64 {
            return Ok(None);
        }
        let chars = s.chars().skip(start as usize);
        let result: String = match length {
            Some(len) if len <= 0.0 => String::new(),
            Some(len) => chars.take(len as usize).collect(),
            None => chars.collect(),
        };
        Ok(Some(Value::String(result)))
    })
}

/// startsWith(prefix)
pub fn starts_with(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    apply_string_fn("startsWith", input, |s| {
        let prefix = string_arg(ctx, args.first(), &Value::from(s), "startsWith")?;
        Ok(prefix.map(|p| Value::Boolean(s.starts_with(&p))))
    })
}

/// endsWith(suffix)
pub fn ends_with(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    apply_string_fn("endsWith", input, |s| {
        let suffix = string_arg(ctx, args.first(), &Value::from(s), "endsWith")?;
        Ok(suffix.map(|p| Value::Boolean(s.ends_with(&p))))
    })
}

/// contains(substring) - the function, not the membership operator
pub fn contains(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    apply_string_fn("contains", input, |s| {
        let needle = string_arg(ctx, args.first(), &Value::from(s), "contains")?;
        Ok(needle.map(|n| Value::Boolean(s.contains(&n))))
    })
}

/// upper() - converts string to uppercase
pub fn upper(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    apply_string_fn("upper", input, |s| Ok(Some(Value::String(s.to_uppercase()))))
}

/// lower() - converts string to lowercase
pub fn lower(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    apply_string_fn("lower", input, |s| Ok(Some(Value::String(s.to_lowercase()))))
}

/// replace(pattern, substitution) - replaces every literal occurrence
pub fn replace(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    apply_string_fn("replace", input, |s| {
        let focus = Value::from(s);
        let pattern = string_arg(ctx, args.first(), &focus, "replace")?;
        let substitution = string_arg(ctx, args.get(1), &focus, "replace")?;
        Ok(match (pattern, substitution) {
            (Some(p), Some(r)) => Some(Value::String(s.replace(&p, &r))),
            _ => None,
        })
    })
}

/// matches(regex) - true when the regular expression matches anywhere
pub fn matches(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    apply_string_fn("matches", input, |s| {
        let Some(pattern) = string_arg(ctx, args.first(), &Value::from(s), "matches")? else {
            return Ok(None);
        };
        Ok(Some(Value::Boolean(compile(&pattern)?.is_match(s))))
    })
}

/// replaceMatches(regex, substitution) - regex replace, `$1` refers to groups
pub fn replace_matches(
    ctx: &EvalContext,
    input: &[Value],
    args: &[Atom],
) -> Result<Value, EvalError> {
    apply_string_fn("replaceMatches", input, |s| {
        let focus = Value::from(s);
        let pattern = string_arg(ctx, args.first(), &focus, "replaceMatches")?;
        let substitution = string_arg(ctx, args.get(1), &focus, "replaceMatches")?;
        let (Some(pattern), Some(substitution)) = (pattern, substitution) else {
            return Ok(None);
        };
        let regex = compile(&pattern)?;
        Ok(Some(Value::String(
            regex.replace_all(s, substitution.as_str()).into_owned(),
        )))
    })
}

/// length() - number of characters
pub fn length(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    apply_string_fn("length", input, |s| {
        Ok(Some(Value::Number(s.chars().count() as f64)))
    })
}

/// toChars() - one single-character string per character
pub fn to_chars(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    apply_string_fn("toChars", input, |s| {
        Ok(Some(Value::Collection(
            s.chars().map(|c| Value::String(c.to_string())).collect(),
        )))
    })
}
