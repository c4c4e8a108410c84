//! Evaluate FHIRPath expressions against JSON input

use tracing::debug;

use super::{CliError, json_to_value};
use crate::{Environment, Value, parser::parse};

/// Options for the eval command
#[derive(Debug, Clone, Default)]
pub struct EvalOptions {
    /// The expression to evaluate
    pub expression: String,
    /// JSON input document; evaluation runs against an empty collection
    /// when absent
    pub input: Option<String>,
    /// Only validate syntax, don't evaluate
    pub syntax_only: bool,
    /// Reject non-boolean `where()` criteria
    pub strict: bool,
    /// `%name` bindings as `name=JSON`
    pub variables: Vec<String>,
}

/// Result of an eval operation
#[derive(Debug, Clone, PartialEq)]
pub enum EvalOutcome {
    /// Syntax validation passed; carries the canonical rendering
    SyntaxValid(String),
    /// The result collection
    Success(Vec<Value>),
}

/// Splits `name=value`. The value is read as JSON, falling back to a plain
/// string when it is not valid JSON.
pub fn parse_variable(binding: &str) -> Result<(String, Value), CliError> {
    let (name, raw) = binding
        .split_once('=')
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| CliError::InvalidVariable(binding.to_string()))?;
    let value = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(json) => json_to_value(json),
        Err(_) => Value::String(raw.to_string()),
    };
    Ok((name.trim_start_matches('%').to_string(), value))
}

/// Execute an eval operation
pub fn execute_eval(options: &EvalOptions) -> Result<EvalOutcome, CliError> {
    let program = parse(&options.expression)?;

    if options.syntax_only {
        return Ok(EvalOutcome::SyntaxValid(program.to_string()));
    }

    let input = match &options.input {
        Some(json) => json_to_value(serde_json::from_str(json)?),
        None => Value::empty(),
    };

    let mut env = Environment::new().with_strict(options.strict);
    for binding in &options.variables {
        let (name, value) = parse_variable(binding)?;
        debug!(variable = %name, "bound variable");
        env = env.with_variable(name, value);
    }

    Ok(EvalOutcome::Success(program.evaluate_with(&input, &env)?))
}
