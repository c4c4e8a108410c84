use rust_decimal::{Decimal, RoundingStrategy, prelude::FromPrimitive, prelude::ToPrimitive};

use super::{apply_math_fn, number_arg};
use crate::{
    ast::Atom,
    evaluator::{EvalContext, EvalError},
    value::Value,
};

// Math functions take a singleton number or quantity; arguments are
// evaluated against an empty focus.

fn required_number(
    ctx: &EvalContext,
    args: &[Atom],
    name: &str,
) -> Result<Option<f64>, EvalError> {
    if args.is_empty() {
        return Err(EvalError::Argument(format!(
            "{}() requires a number argument",
            name
        )));
    }
    number_arg(ctx, args.first(), &Value::empty(), name)
}

/// abs() - absolute value
pub fn abs(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    apply_math_fn("abs", input, |x| Ok(Some(x.abs())))
}

/// ceiling() - smallest integer not below the input
pub fn ceiling(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    apply_math_fn("ceiling", input, |x| Ok(Some(x.ceil())))
}

/// exp() - e raised to the input
pub fn exp(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    apply_math_fn("exp", input, |x| Ok(Some(x.exp())))
}

/// floor() - largest integer not above the input
pub fn floor(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    apply_math_fn("floor", input, |x| Ok(Some(x.floor())))
}

/// ln() - natural logarithm
pub fn ln(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    apply_math_fn("ln", input, |x| Ok(Some(x.ln())))
}

/// log(base) - logarithm in the given base
pub fn log(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    apply_math_fn("log", input, |x| {
        Ok(required_number(ctx, args, "log")?.map(|base| x.ln() / base.ln()))
    })
}

/// power(exponent)
pub fn power(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    apply_math_fn("power", input, |x| {
        Ok(required_number(ctx, args, "power")?.map(|e| x.powf(e)))
    })
}

/// round(precision?) - rounds half away from zero to `precision` decimals
pub fn round(ctx: &EvalContext, input: &[Value], args: &[Atom]) -> Result<Value, EvalError> {
    apply_math_fn("round", input, |x| {
        let precision = number_arg(ctx, args.first(), &Value::empty(), "round")?.unwrap_or(0.0);
        if precision < 0.0 {
            return Err(EvalError::Argument(
                "round() precision must not be negative".to_string(),
            ));
        }
        let rounded = Decimal::from_f64(x)
            .map(|d| d.round_dp_with_strategy(precision as u32, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|d| d.to_f64());
        Ok(Some(rounded.unwrap_or_else(|| x.round())))
    })
}

/// sqrt() - square root, empty for negative input
pub fn sqrt(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    apply_math_fn("sqrt", input, |x| Ok(Some(x.sqrt())))
}

/// truncate() - integer part
pub fn truncate(_: &EvalContext, input: &[Value], _: &[Atom]) -> Result<Value, EvalError> {
    apply_math_fn("truncate", input, |x| Ok(Some(x.trunc())))
}
