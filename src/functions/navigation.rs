use crate::{
    ast::Atom,
    evaluator::{EvalContext, EvalError, push_flat},
    value::Value,
};

fn child_values(item: &Value) -> Vec<Value> {
    let mut out = Vec::new();
    if let Value::Object(map) = item {
        for value in map.values() {
            push_flat(&mut out, value.clone());
        }
    }
    out
}

/// children() - the direct child values of every element
pub fn children(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    Ok(Value::Collection(input.iter().flat_map(child_values).collect()))
}

/// descendants() - children, recursively
pub fn descendants(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    let mut result = Vec::new();
    let mut frontier: Vec<Value> = input.iter().flat_map(child_values).collect();
    while !frontier.is_empty() {
        let next: Vec<Value> = frontier.iter().flat_map(child_values).collect();
        result.append(&mut frontier);
        frontier = next;
    }
    Ok(Value::Collection(result))
}

/// resolve() - looks up each reference through the environment's resolver;
/// unresolvable references are dropped
pub fn resolve(ctx: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    let resolver = ctx.env.resolver();
    let resolved = input
        .iter()
        .filter_map(|item| match item {
            Value::String(reference) => Some(reference.as_str()),
            Value::Object(_) => item.get("reference").and_then(Value::as_str),
            _ => None,
        })
        .filter(|reference| !reference.is_empty())
        .filter_map(|reference| resolver.resolve(reference))
        .collect();
    Ok(Value::Collection(resolved))
}
