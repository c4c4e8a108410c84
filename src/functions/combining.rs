use super::collection_arg;
use crate::{
    ast::Atom,
    evaluator::{EvalContext, EvalError},
    value::{Value, remove_duplicates},
};

/// union(other) - both collections merged, duplicates removed
pub fn union(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    let Some(other) = args.first() else {
        return Ok(Value::Collection(input.to_vec()));
    };
    let mut items = input.to_vec();
    items.extend(collection_arg(ctx, other)?);
    Ok(Value::Collection(remove_duplicates(items)))
}

/// combine(other) - input followed by other, duplicates kept
pub fn combine(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    let Some(other) = args.first() else {
        return Ok(Value::Collection(input.to_vec()));
    };
    let mut items = input.to_vec();
    items.extend(collection_arg(ctx, other)?);
    Ok(Value::Collection(items))
}
