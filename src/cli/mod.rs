//! CLI support for fhirpath-lang
//!
//! Provides programmatic access to the `fhirpath` command so other tools can
//! embed it, plus the JSON conversion the command relies on.

mod convert;
mod eval;

pub use convert::json_to_value;
pub use eval::{EvalOptions, EvalOutcome, execute_eval, parse_variable};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    /// The expression does not parse
    #[error("Invalid expression: {0}")]
    Parse(#[from] crate::ParseError),

    /// The expression failed against the input
    #[error("Evaluation failed: {0}")]
    Eval(#[from] crate::EvalError),

    /// The input document is not JSON
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading stdin failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A `--var` binding without `=`
    #[error("Invalid variable binding '{0}', expected name=value")]
    InvalidVariable(String),
}
