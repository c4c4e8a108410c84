use super::string_arg;
use crate::{
    ast::Atom,
    date,
    evaluator::{EvalContext, EvalError},
    value::Value,
};

/// trace(name, projection?) - passes the input through unchanged and hands
/// it (or the projection of it) to the environment's trace sink
pub fn trace(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    let name = string_arg(ctx, args.first(), ctx.this, "trace")?.unwrap_or_else(|| "trace".to_string());
    let focus = Value::Collection(input.to_vec());

    match args.get(1) {
        Some(projection) => {
            let projected = projection
                .eval(&ctx.with_this(&focus), &focus)?
                .into_collection();
            ctx.env.tracer().trace(&name, &projected);
        }
        None => ctx.env.tracer().trace(&name, input),
    }
    Ok(focus)
}

/// now() - current date-time in UTC
pub fn now(_: &EvalContext, _: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    Ok(Value::String(date::now()))
}

/// today() - current date
pub fn today(_: &EvalContext, _: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    Ok(Value::String(date::today()))
}

/// timeOfDay() - current time
pub fn time_of_day(_: &EvalContext, _: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    Ok(Value::String(date::time_of_day()))
}
