use std::{cmp::Ordering, collections::HashMap, fmt, sync::Arc, sync::LazyLock};

use indexmap::IndexMap;
use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::{
    ast::{Atom, BinOp, Program, UnaryOp},
    value::{Value, equals, equivalent, is_type, remove_duplicates},
};

/// Looks up the target of a reference for `resolve()`.
pub trait ReferenceResolver: Send + Sync {
    /// Returns the referenced entity, or `None` to drop the reference.
    fn resolve(&self, reference: &str) -> Option<Value>;
}

/// Receives the values passed through `trace()`.
pub trait TraceSink: Send + Sync {
    fn trace(&self, name: &str, values: &[Value]);
}

/// Turns `Type/id` into a stub `{resourceType, id}` object.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubResolver;

impl ReferenceResolver for StubResolver {
    fn resolve(&self, reference: &str) -> Option<Value> {
        let mut parts = reference.split('/');
        let resource_type = parts.next().filter(|s| !s.is_empty())?;
        let mut stub = IndexMap::new();
        stub.insert("resourceType".to_string(), Value::from(resource_type));
        if let Some(id) = parts.next() {
            stub.insert("id".to_string(), Value::from(id));
        }
        Some(Value::Object(stub))
    }
}

/// Emits traced values as `tracing` events on the `fhirpath::trace` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTracer;

impl TraceSink for LogTracer {
    fn trace(&self, name: &str, values: &[Value]) {
        let rendered = Value::Collection(values.to_vec()).to_string();
        info!(target: "fhirpath::trace", label = name, count = values.len(), values = %rendered, "trace");
    }
}

/// Everything an evaluation may consult besides its input.
///
/// # Examples
///
/// ```
/// use fhirpath_lang::{Environment, Value, parser::parse};
///
/// let env = Environment::new().with_variable("limit", Value::Number(2.0));
/// let program = parse("%limit + 1").unwrap();
///
/// assert_eq!(program.evaluate_with(&Value::empty(), &env).unwrap(), vec![Value::Number(3.0)]);
/// ```
#[derive(Clone)]
pub struct Environment {
    variables: HashMap<String, Value>,
    resolver: Arc<dyn ReferenceResolver>,
    tracer: Arc<dyn TraceSink>,
    strict: bool,
}

impl Default for Environment {
    fn default() -> Self {
        Environment {
            variables: HashMap::new(),
            resolver: Arc::new(StubResolver),
            tracer: Arc::new(LogTracer),
            strict: false,
        }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("variables", &self.variables)
            .field("strict", &self.strict)
            .finish_non_exhaustive()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `%name`.
    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    pub fn with_resolver(mut self, resolver: impl ReferenceResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn with_tracer(mut self, tracer: impl TraceSink + 'static) -> Self {
        self.tracer = Arc::new(tracer);
        self
    }

    /// In strict mode `where` criteria must produce a single boolean.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn resolver(&self) -> &dyn ReferenceResolver {
        self.resolver.as_ref()
    }

    pub fn tracer(&self) -> &dyn TraceSink {
        self.tracer.as_ref()
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }
}

static DEFAULT_ENVIRONMENT: LazyLock<Environment> = LazyLock::new(Environment::default);

/// Per-call evaluation state: the environment plus the current `$this`.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub env: &'a Environment,
    pub this: &'a Value,
}

impl<'a> EvalContext<'a> {
    pub fn new(env: &'a Environment, this: &'a Value) -> Self {
        EvalContext { env, this }
    }

    /// Same environment, different `$this`.
    pub fn with_this<'b>(&self, this: &'b Value) -> EvalContext<'b>
    where
        'a: 'b,
    {
        EvalContext {
            env: self.env,
            this,
        }
    }
}

/// Errors that can occur during evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A singleton-only operation received more than one element
    #[error("{0}")]
    Arity(String),

    /// An operation received a value of the wrong kind
    #[error("{0}")]
    Type(String),

    /// A control argument evaluated to an unusable value
    #[error("{0}")]
    Argument(String),

    /// Reference to an unbound `%variable`
    #[error("Undefined variable %{0}")]
    UndefinedVariable(String),

    /// Any of the above, tagged with the expression that raised it
    #[error("FhirPathError on \"{expression}\": {cause}")]
    Expression {
        expression: String,
        #[source]
        cause: Box<EvalError>,
    },
}

impl EvalError {
    /// The error with every [`EvalError::Expression`] wrapper removed.
    pub fn root_cause(&self) -> &EvalError {
        match self {
            EvalError::Expression { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}

/// Appends `value` to `out`, splicing one level of collection.
pub(crate) fn push_flat(out: &mut Vec<Value>, value: Value) {
    match value {
        Value::Collection(items) => out.extend(items),
        other => out.push(other),
    }
}

/// Applies `f` to a scalar, or to every element of a collection and
/// flattens the results one level.
pub(crate) fn map_maybe_array(
    input: &Value,
    mut f: impl FnMut(&Value) -> Result<Value, EvalError>,
) -> Result<Value, EvalError> {
    match input {
        Value::Collection(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                push_flat(&mut out, f(item)?);
            }
            Ok(Value::Collection(out))
        }
        other => f(other),
    }
}

impl Program {
    /// Evaluates against `input` with the default environment.
    pub fn evaluate(&self, input: &Value) -> Result<Vec<Value>, EvalError> {
        self.evaluate_with(input, &DEFAULT_ENVIRONMENT)
    }

    /// Evaluates against `input`.
    ///
    /// A non-empty collection input is evaluated once per element with that
    /// element as `$this`. The result is flattened one level with empties
    /// dropped. Errors are tagged with the source expression.
    pub fn evaluate_with(&self, input: &Value, env: &Environment) -> Result<Vec<Value>, EvalError> {
        let ctx = EvalContext::new(env, input);
        let result = match input {
            Value::Collection(items) if !items.is_empty() => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match self.child.eval(&ctx.with_this(item), item) {
                        Ok(value) => push_flat(&mut out, value),
                        Err(e) => return Err(self.wrap_error(e)),
                    }
                }
                Value::Collection(out)
            }
            other => self.child.eval(&ctx, other).map_err(|e| self.wrap_error(e))?,
        };

        let mut normalized = Vec::new();
        for value in result.into_collection() {
            push_flat(&mut normalized, value);
        }
        Ok(normalized)
    }

    fn wrap_error(&self, cause: EvalError) -> EvalError {
        debug!(expression = %self.source, error = %cause, "evaluation failed");
        EvalError::Expression {
            expression: self.source.clone(),
            cause: Box::new(cause),
        }
    }
}

impl Atom {
    /// Evaluates this node with `input` as the focus.
    pub fn eval(&self, ctx: &EvalContext, input: &Value) -> Result<Value, EvalError> {
        match self {
            Atom::Literal(value) => Ok(value.clone()),
            Atom::EmptySet => Ok(Value::empty()),
            Atom::Symbol(name) => eval_symbol(ctx, name, input),
            Atom::Unary { op, operand } => {
                let value = operand.eval(ctx, input)?;
                match op {
                    UnaryOp::Plus => Ok(value),
                    UnaryOp::Minus => eval_arithmetic(BinOp::Subtract, &Value::Number(0.0), &value),
                }
            }
            Atom::Binary { op, left, right } => eval_binary(ctx, *op, left, right, input),
            Atom::Is { operand, type_name } => {
                let value = operand.eval(ctx, input)?;
                Ok(match value.singleton() {
                    Some(item) => Value::Boolean(is_type(item, type_name)),
                    _ => Value::empty(),
                })
            }
            Atom::As { operand, type_name } => {
                let value = operand.eval(ctx, input)?;
                Ok(Value::Collection(
                    value
                        .into_collection()
                        .into_iter()
                        .filter(|item| is_type(item, type_name))
                        .collect(),
                ))
            }
            Atom::Indexer { left, index } => {
                let items = left.eval(ctx, input)?.into_collection();
                let index = index.eval(ctx, input)?;
                let position = match index.singleton().and_then(Value::as_number) {
                    Some(n) => n,
                    None => {
                        return Err(EvalError::Argument(format!(
                            "Expected a number for indexer, got {}",
                            index.type_name()
                        )));
                    }
                };
                if position < 0.0 || position.fract() != 0.0 {
                    return Ok(Value::empty());
                }
                Ok(items
                    .into_iter()
                    .nth(position as usize)
                    .unwrap_or_else(Value::empty))
            }
            Atom::Function { name, args, func } => {
                let items = input.to_collection();
                trace!(function = %name, inputs = items.len(), "calling function");
                func(ctx, &items, args)
            }
        }
    }
}

// ========================================
// Symbols
// ========================================

fn eval_symbol(ctx: &EvalContext, name: &str, input: &Value) -> Result<Value, EvalError> {
    if name == "$this" {
        return Ok(ctx.this.clone());
    }
    if let Some(variable) = name.strip_prefix('%') {
        return ctx
            .env
            .variable(variable)
            .cloned()
            .ok_or_else(|| EvalError::UndefinedVariable(variable.to_string()));
    }
    map_maybe_array(input, |item| Ok(lookup_property(item, name)))
}

/// Resolves `name` on one element: type guard, then direct key, then a
/// unique choice-type key (`value` finds `valueQuantity`).
fn lookup_property(item: &Value, name: &str) -> Value {
    let Value::Object(map) = item else {
        return Value::empty();
    };
    if item.resource_type() == Some(name) {
        return item.clone();
    }
    if let Some(value) = map.get(name) {
        return value.clone();
    }
    let mut choices = map.iter().filter(|(key, _)| {
        key.strip_prefix(name)
            .and_then(|suffix| suffix.chars().next())
            .is_some_and(char::is_uppercase)
    });
    match (choices.next(), choices.next()) {
        (Some((_, value)), None) => value.clone(),
        _ => Value::empty(),
    }
}

// ========================================
// Binary operators
// ========================================

fn eval_binary(
    ctx: &EvalContext,
    op: BinOp,
    left: &Atom,
    right: &Atom,
    input: &Value,
) -> Result<Value, EvalError> {
    use BinOp::*;

    match op {
        Dot => {
            let focus = left.eval(ctx, input)?;
            return right.eval(ctx, &focus);
        }
        Or => {
            let l = left.eval(ctx, input)?;
            if l.is_truthy() {
                return Ok(l);
            }
            let r = right.eval(ctx, input)?;
            return Ok(if r.is_truthy() {
                r
            } else if l.as_bool() == Some(false) && r.as_bool() == Some(false) {
                Value::Boolean(false)
            } else {
                Value::empty()
            });
        }
        _ => {}
    }

    let l = left.eval(ctx, input)?;
    let r = right.eval(ctx, input)?;

    match op {
        Add | Subtract | Multiply | Divide | Div | Mod => eval_arithmetic(op, &l, &r),
        LessThan | LessEqual | GreaterThan | GreaterEqual => eval_comparison(op, &l, &r),
        Equals => Ok(eval_equals(&l, &r)),
        NotEquals => Ok(Value::Boolean(!eval_equals(&l, &r).is_truthy())),
        Equivalent => Ok(Value::Boolean(eval_equivalent(l, r))),
        NotEquivalent => Ok(Value::Boolean(!eval_equivalent(l, r))),
        Union => {
            let mut items = l.into_collection();
            items.extend(r.into_collection());
            Ok(Value::Collection(remove_duplicates(items)))
        }
        Concat => {
            let mut items = l.into_collection();
            items.extend(r.into_collection());
            items.retain(Value::is_truthy);
            let strings: Option<Vec<&str>> = items.iter().map(Value::as_str).collect();
            Ok(match strings {
                Some(parts) if !parts.is_empty() => Value::String(parts.concat()),
                _ => Value::Collection(items),
            })
        }
        In => membership(op, &l, &r),
        Contains => membership(op, &r, &l),
        And => Ok(match (l.as_bool(), r.as_bool()) {
            (Some(true), Some(true)) => Value::Boolean(true),
            (Some(false), _) | (_, Some(false)) => Value::Boolean(false),
            _ => Value::empty(),
        }),
        Xor => Ok(match (l.as_bool(), r.as_bool()) {
            (Some(true), Some(true)) | (Some(false), Some(false)) => Value::Boolean(false),
            (Some(true), _) | (_, Some(true)) => Value::Boolean(true),
            _ => Value::empty(),
        }),
        Implies => Ok(match (l.as_bool(), r.as_bool()) {
            (Some(false), _) => Value::Boolean(true),
            (Some(true), Some(b)) => Value::Boolean(b),
            (None, Some(true)) => Value::Boolean(true),
            _ => Value::empty(),
        }),
        Dot | Or => unreachable!("handled above"),
    }
}

fn numeric_operand(value: &Value) -> Option<f64> {
    value.quantity_value().or_else(|| value.as_number())
}

/// Arithmetic through `Decimal` so decimal literals stay exact, falling back
/// to `f64` outside decimal range. `None` means no result (division by zero).
fn decimal_arithmetic(op: BinOp, a: f64, b: f64) -> Option<f64> {
    if let (Some(x), Some(y)) = (Decimal::from_f64(a), Decimal::from_f64(b)) {
        if y.is_zero() && matches!(op, BinOp::Divide | BinOp::Div | BinOp::Mod) {
            return None;
        }
        let result = match op {
            BinOp::Add => x.checked_add(y),
            BinOp::Subtract => x.checked_sub(y),
            BinOp::Multiply => x.checked_mul(y),
            BinOp::Divide => x.checked_div(y),
            BinOp::Div => x.checked_div(y).map(|q| q.trunc()),
            BinOp::Mod => x.checked_rem(y),
            _ => None,
        };
        if let Some(n) = result.and_then(|d| d.normalize().to_f64()) {
            return Some(n);
        }
    }

    let result = match op {
        BinOp::Add => a + b,
        BinOp::Subtract => a - b,
        BinOp::Multiply => a * b,
        BinOp::Divide => a / b,
        BinOp::Div => (a / b).trunc(),
        BinOp::Mod => a % b,
        _ => f64::NAN,
    };
    result.is_finite().then_some(result)
}

fn eval_arithmetic(op: BinOp, l: &Value, r: &Value) -> Result<Value, EvalError> {
    let (Some(a), Some(b)) = (l.singleton(), r.singleton()) else {
        return Ok(Value::empty());
    };

    if let (BinOp::Add, Value::String(x), Value::String(y)) = (op, a, b) {
        return Ok(Value::String(format!("{}{}", x, y)));
    }

    let (Some(x), Some(y)) = (numeric_operand(a), numeric_operand(b)) else {
        return Err(EvalError::Type(format!(
            "Cannot apply {} to {} and {}",
            op.symbol(),
            a.type_name(),
            b.type_name()
        )));
    };

    let Some(result) = decimal_arithmetic(op, x, y) else {
        return Ok(Value::empty());
    };

    Ok(if a.is_quantity() {
        a.with_quantity_value(result)
    } else if b.is_quantity() {
        b.with_quantity_value(result)
    } else {
        Value::Number(result)
    })
}

fn eval_comparison(op: BinOp, l: &Value, r: &Value) -> Result<Value, EvalError> {
    let (Some(a), Some(b)) = (l.singleton(), r.singleton()) else {
        return Ok(Value::empty());
    };

    let ordering = match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Boolean(x), Value::Boolean(y)) => Some(x.cmp(y)),
        _ => match (numeric_operand(a), numeric_operand(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => {
                return Err(EvalError::Type(format!(
                    "Cannot compare {} and {}",
                    a.type_name(),
                    b.type_name()
                )));
            }
        },
    };

    let Some(ordering) = ordering else {
        return Ok(Value::empty());
    };
    let result = match op {
        BinOp::LessThan => ordering == Ordering::Less,
        BinOp::LessEqual => ordering != Ordering::Greater,
        BinOp::GreaterThan => ordering == Ordering::Greater,
        BinOp::GreaterEqual => ordering != Ordering::Less,
        _ => false,
    };
    Ok(Value::Boolean(result))
}

/// `=`: both empty is true, one empty is empty, two collections compare
/// element-wise, otherwise compare each left element with the right value.
fn eval_equals(l: &Value, r: &Value) -> Value {
    match (l.is_empty_collection(), r.is_empty_collection()) {
        (true, true) => return Value::Boolean(true),
        (true, false) | (false, true) => return Value::empty(),
        _ => {}
    }
    if let (Value::Collection(_), Value::Collection(_)) = (l, r) {
        return Value::Boolean(equals(l, r));
    }
    let other = r.singleton().unwrap_or(r);
    match l {
        Value::Collection(items) => Value::Collection(
            items
                .iter()
                .map(|item| Value::Boolean(equals(item, other)))
                .collect(),
        ),
        item => Value::Boolean(equals(item, other)),
    }
}

/// `~`: both empty is true, one empty is false, otherwise an
/// order-independent comparison.
fn eval_equivalent(l: Value, r: Value) -> bool {
    let l = Value::Collection(l.into_collection());
    let r = Value::Collection(r.into_collection());
    match (l.is_empty_collection(), r.is_empty_collection()) {
        (true, true) => true,
        (true, false) | (false, true) => false,
        _ => equivalent(&l, &r),
    }
}

/// Whether `container` holds the single `probe` item. An empty probe gives
/// empty; more than one item is an error.
fn membership(op: BinOp, probe: &Value, container: &Value) -> Result<Value, EvalError> {
    let probe = probe.to_collection();
    let item = match probe.as_slice() {
        [] => return Ok(Value::empty()),
        [item] => item,
        _ => {
            return Err(EvalError::Arity(format!(
                "Expected a single item for {}, got {}",
                op.symbol(),
                probe.len()
            )));
        }
    };
    let container = container.to_collection();
    Ok(Value::Boolean(container.iter().any(|c| equals(c, item))))
}
