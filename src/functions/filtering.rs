use crate::{
    ast::Atom,
    evaluator::{EvalContext, EvalError, push_flat},
    parser::type_name_of,
    value::{Value, equals, is_type},
};

/// where(criteria) - keeps the elements for which criteria is true
///
/// Criteria is evaluated once per element, with that element as `$this`.
pub fn where_(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    let Some(criteria) = args.first() else {
        return Err(EvalError::Argument(
            "where() requires a criteria argument".to_string(),
        ));
    };

    let mut kept = Vec::new();
    for item in input {
        let result = criteria.eval(&ctx.with_this(item), item)?;
        if ctx.env.is_strict() && !result.is_empty_collection() && result.as_bool().is_none() {
            return Err(EvalError::Type(format!(
                "Expected where() criteria to evaluate to a Boolean, got {}",
                result.type_name()
            )));
        }
        if result.is_truthy() {
            kept.push(item.clone());
        }
    }
    Ok(Value::Collection(kept))
}

/// select(projection) - evaluates projection once over the whole input
pub fn select(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    let Some(projection) = args.first() else {
        return Err(EvalError::Argument(
            "select() requires a projection argument".to_string(),
        ));
    };
    let focus = Value::Collection(input.to_vec());
    let result = projection.eval(&ctx.with_this(&focus), &focus)?;

    let mut out = Vec::new();
    for value in result.into_collection() {
        push_flat(&mut out, value);
    }
    Ok(Value::Collection(out))
}

/// repeat(projection) - applies projection to the input, then to its results,
/// until nothing new turns up
pub fn repeat(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    let Some(projection) = args.first() else {
        return Err(EvalError::Argument(
            "repeat() requires a projection argument".to_string(),
        ));
    };

    let mut result: Vec<Value> = Vec::new();
    let mut frontier = input.to_vec();
    while !frontier.is_empty() {
        let mut next = Vec::new();
        for item in &frontier {
            for found in projection.eval(&ctx.with_this(item), item)?.into_collection() {
                if !result.iter().any(|seen| equals(seen, &found)) {
                    result.push(found.clone());
                    next.push(found);
                }
            }
        }
        frontier = next;
    }
    Ok(Value::Collection(result))
}

/// ofType(type) - keeps the elements of the given type
pub fn of_type(_: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    let type_name = type_argument("ofType", args)?;
    Ok(Value::Collection(
        input
            .iter()
            .filter(|item| is_type(item, &type_name))
            .cloned()
            .collect(),
    ))
}

/// Reads a type specifier argument (`Patient`, `FHIR.Patient`) from its
/// source text.
pub(crate) fn type_argument(name: &str, args: &[Atom]) -> Result<String, EvalError> {
    let Some(arg) = args.first() else {
        return Err(EvalError::Argument(format!(
            "{}() requires a type argument",
            name
        )));
    };
    type_name_of(arg).map_err(|e| EvalError::Argument(e.to_string()))
}
