use super::collection_arg;
use crate::{
    ast::Atom,
    evaluator::{EvalContext, EvalError},
    value::{Value, equals, remove_duplicates},
};

/// single() - the only element; errors on more than one
pub fn single(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    if input.len() > 1 {
        return Err(EvalError::Arity(
            "Expected input length one for single()".to_string(),
        ));
    }
    Ok(Value::Collection(input.to_vec()))
}

/// first() - the first element, if any
pub fn first(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    Ok(Value::Collection(input.first().cloned().into_iter().collect()))
}

/// last() - the last element, if any
pub fn last(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    Ok(Value::Collection(input.last().cloned().into_iter().collect()))
}

/// tail() - everything but the first element
pub fn tail(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    Ok(Value::Collection(input.iter().skip(1).cloned().collect()))
}

/// Evaluates the count of skip()/take() against a `0` focus; counts are
/// constant expressions.
fn count_arg(ctx: &EvalContext, args: &[Atom], name: &str) -> Result<f64, EvalError> {
    let placeholder = Value::Number(0.0);
    let value = match args.first() {
        Some(arg) => arg.eval(&ctx.with_this(&placeholder), &placeholder)?,
        None => Value::empty(),
    };
    value
        .singleton()
        .and_then(Value::as_number)
        .ok_or_else(|| EvalError::Argument(format!("Expected a number for {}(num)", name)))
}

/// skip(num) - all but the first num elements
pub fn skip(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    let num = count_arg(ctx, args, "skip")?;
    if num >= input.len() as f64 {
        return Ok(Value::empty());
    }
    if num <= 0.0 {
        return Ok(Value::Collection(input.to_vec()));
    }
    Ok(Value::Collection(input[num as usize..].to_vec()))
}

/// take(num) - the first num elements
pub fn take(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    let num = count_arg(ctx, args, "take")?;
    if num >= input.len() as f64 {
        return Ok(Value::Collection(input.to_vec()));
    }
    if num <= 0.0 {
        return Ok(Value::empty());
    }
    Ok(Value::Collection(input[..num as usize].to_vec()))
}

/// intersect(other) - distinct elements present in both collections
pub fn intersect(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    let Some(other) = args.first() else {
        return Ok(Value::Collection(input.to_vec()));
    };
    let other = collection_arg(ctx, other)?;
    let common: Vec<Value> = input
        .iter()
        .filter(|item| other.iter().any(|o| equals(o, item)))
        .cloned()
        .collect();
    Ok(Value::Collection(remove_duplicates(common)))
}

/// exclude(other) - input elements not present in other, duplicates kept
pub fn exclude(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    let Some(other) = args.first() else {
        return Ok(Value::Collection(input.to_vec()));
    };
    let other = collection_arg(ctx, other)?;
    Ok(Value::Collection(
        input
            .iter()
            .filter(|item| !other.iter().any(|o| equals(o, item)))
            .cloned()
            .collect(),
    ))
}
