use super::collection_arg;
use crate::{
    ast::Atom,
    evaluator::{EvalContext, EvalError},
    value::{Value, equals, remove_duplicates},
};

/// empty() - true when the input is empty
pub fn empty(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    Ok(Value::Boolean(input.is_empty()))
}

/// exists(criteria?) - true when any element (matching criteria) exists
pub fn exists(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    let Some(criteria) = args.first() else {
        return Ok(Value::Boolean(!input.is_empty()));
    };
    for item in input {
        if criteria.eval(&ctx.with_this(item), item)?.is_truthy() {
            return Ok(Value::Boolean(true));
        }
    }
    Ok(Value::Boolean(false))
}

/// all(criteria) - true when every element satisfies criteria
pub fn all(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    let Some(criteria) = args.first() else {
        return Err(EvalError::Argument(
            "all() requires a criteria argument".to_string(),
        ));
    };
    for item in input {
        if !criteria.eval(&ctx.with_this(item), item)?.is_truthy() {
            return Ok(Value::Boolean(false));
        }
    }
    Ok(Value::Boolean(true))
}

/// allTrue() - true when every element is truthy, or the input is empty
pub fn all_true(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    Ok(Value::Boolean(input.iter().all(Value::is_truthy)))
}

/// anyTrue() - true when some element is truthy
pub fn any_true(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    Ok(Value::Boolean(input.iter().any(Value::is_truthy)))
}

/// allFalse() - true when no element is truthy, or the input is empty
pub fn all_false(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    Ok(Value::Boolean(!input.iter().any(Value::is_truthy)))
}

/// anyFalse() - true when some element is falsy
pub fn any_false(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    Ok(Value::Boolean(input.iter().any(|v| !v.is_truthy())))
}

fn includes_all(container: &[Value], items: &[Value]) -> bool {
    items
        .iter()
        .all(|item| container.iter().any(|c| equals(c, item)))
}

/// subsetOf(other) - true when every input element is in other
pub fn subset_of(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    let Some(other) = args.first() else {
        return Ok(Value::Boolean(input.is_empty()));
    };
    let other = collection_arg(ctx, other)?;
    Ok(Value::Boolean(includes_all(&other, input)))
}

/// supersetOf(other) - true when every element of other is in the input
pub fn superset_of(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    let Some(other) = args.first() else {
        return Ok(Value::Boolean(true));
    };
    let other = collection_arg(ctx, other)?;
    Ok(Value::Boolean(includes_all(input, &other)))
}

/// count() - number of elements
pub fn count(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    Ok(Value::Number(input.len() as f64))
}

/// distinct() - input without duplicates
pub fn distinct(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    Ok(Value::Collection(remove_duplicates(input.to_vec())))
}

/// isDistinct() - true when the input has no duplicates
pub fn is_distinct(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    let unique = remove_duplicates(input.to_vec());
    Ok(Value::Boolean(unique.len() == input.len()))
}
