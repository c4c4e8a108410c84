//! A FHIRPath expression engine.
//!
//! Expressions are parsed once into a [`Program`] and evaluated against
//! loosely-typed JSON documents as often as needed:
//!
//! ```
//! use fhirpath_lang::{Value, parse};
//! use serde_json::json;
//!
//! let patient = Value::from(json!({
//!     "resourceType": "Patient",
//!     "name": [{ "given": ["Alice"], "family": "Smith" }]
//! }));
//!
//! let program = parse("Patient.name.given").unwrap();
//! assert_eq!(program.evaluate(&patient).unwrap(), vec![Value::from("Alice")]);
//! ```

pub mod ast;
pub mod cli;
pub mod date;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod value;

pub use ast::{Atom, BinOp, Program, Token, TokenKind};
pub use evaluator::{EvalContext, EvalError, Environment, ReferenceResolver, TraceSink};
pub use lexer::{Lexer, tokenize};
pub use output::{to_json, to_json_pretty, to_literal};
pub use parser::{ParseError, Parser, parse};
pub use value::{Quantity, Value};

use thiserror::Error;

/// Either phase of [`evaluate`] failing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Parses and evaluates in one step.
///
/// ```
/// use fhirpath_lang::{Value, evaluate};
///
/// let result = evaluate("3 / 3 + 4 * 9 - 1", &Value::empty()).unwrap();
/// assert_eq!(result, vec![Value::Number(36.0)]);
/// ```
pub fn evaluate(source: &str, input: &Value) -> Result<Vec<Value>, Error> {
    let program = parse(source)?;
    Ok(program.evaluate(input)?)
}
