//! # FHIRPath - Abstract Syntax Tree
//!
//! This module defines the syntax tree the parser builds and the evaluator
//! walks.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[operators]** - Binary and unary operators with their precedence
//! - **[atoms]** - Expression nodes and the [`Program`] root
//!
//! ## Core Concepts
//!
//! ### Everything is a collection
//!
//! Every expression evaluates to an ordered collection. A missing property is
//! the empty collection, never null, and operators map over collections
//! element by element:
//!
//! ```text
//! Patient.name.given            // every given name of every name
//! Patient.name.given.first()    // just the first one
//! ```
//!
//! ### Lazy arguments
//!
//! Function arguments are kept as unevaluated atoms. Each function decides
//! when and against what to evaluate them, which is how `where` runs its
//! criteria once per element and `iif` evaluates only the branch it takes:
//!
//! ```text
//! Patient.telecom.where(system = 'phone')
//! iif(active, 'yes', 'no')
//! ```
//!
//! ### Precedence
//!
//! From tightest to loosest: call, `.`, `[]`, unary `+ -`, `* / div mod`,
//! `+ - &`, `is as`, `|`, `< <= > >=`, `= != ~ !~`, `in contains`, `and`,
//! `xor or`, `implies`.
pub mod atoms;
pub mod operators;
pub mod tokens;

pub use atoms::{Atom, Program};
pub use operators::{BinOp, UnaryOp};
pub use tokens::{Token, TokenKind};
