use std::fmt;

use super::operators::{BinOp, Precedence, TYPE_PRECEDENCE, UNARY_PRECEDENCE, UnaryOp};
use crate::{functions::FunctionImpl, output::to_literal, value::Value};

/// An expression node.
///
/// Atoms are immutable once built and hold no evaluation state, so one tree
/// can be evaluated any number of times, from any number of threads.
#[derive(Debug, Clone)]
pub enum Atom {
    /// Constant value (string, number, boolean, quantity, date)
    Literal(Value),

    /// Property access, resource type guard, `$this` or `%variable`
    Symbol(String),

    /// `{}`
    EmptySet,

    /// Prefix `+` / `-`
    Unary { op: UnaryOp, operand: Box<Atom> },

    /// Any binary operator, including `.` navigation
    Binary {
        op: BinOp,
        left: Box<Atom>,
        right: Box<Atom>,
    },

    /// `operand is Type`
    Is { operand: Box<Atom>, type_name: String },

    /// `operand as Type`
    As { operand: Box<Atom>, type_name: String },

    /// `left[index]`
    Indexer { left: Box<Atom>, index: Box<Atom> },

    /// Call to a library function, resolved at parse time
    Function {
        name: String,
        args: Vec<Atom>,
        func: FunctionImpl,
    },
}

impl Atom {
    pub fn binary(op: BinOp, left: Atom, right: Atom) -> Atom {
        Atom::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn literal(value: impl Into<Value>) -> Atom {
        Atom::Literal(value.into())
    }

    fn precedence(&self) -> Precedence {
        match self {
            Atom::Binary { op, .. } => op.precedence(),
            Atom::Is { .. } | Atom::As { .. } => TYPE_PRECEDENCE,
            Atom::Unary { .. } => UNARY_PRECEDENCE,
            _ => 0,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, ceiling: Precedence) -> fmt::Result {
        if self.precedence() > ceiling {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let first_ok = match chars.next() {
        Some('$') | Some('%') => chars.next().is_some_and(|c| c.is_alphabetic()),
        Some(c) => c.is_alphabetic() || c == '_',
        None => false,
    };
    first_ok && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Renders the atom back to expression source.
///
/// Parentheses are added only where precedence requires them, so parsing the
/// output yields an equivalent tree.
impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Literal(value) => match to_literal(value) {
                Some(text) => f.write_str(&text),
                None => write!(f, "{}", value),
            },
            Atom::Symbol(name) if is_plain_identifier(name) => f.write_str(name),
            Atom::Symbol(name) => write!(f, "`{}`", name),
            Atom::EmptySet => f.write_str("{}"),
            Atom::Unary { op, operand } => {
                f.write_str(op.symbol())?;
                operand.fmt_operand(f, UNARY_PRECEDENCE)
            }
            Atom::Binary {
                op: BinOp::Dot,
                left,
                right,
            } => {
                left.fmt_operand(f, BinOp::Dot.precedence())?;
                f.write_str(".")?;
                right.fmt_operand(f, BinOp::Dot.precedence() - 1)
            }
            Atom::Binary { op, left, right } => {
                let precedence = op.precedence();
                left.fmt_operand(f, precedence)?;
                write!(f, " {} ", op.symbol())?;
                right.fmt_operand(f, precedence - 1)
            }
            Atom::Is { operand, type_name } => {
                operand.fmt_operand(f, TYPE_PRECEDENCE)?;
                write!(f, " is {}", type_name)
            }
            Atom::As { operand, type_name } => {
                operand.fmt_operand(f, TYPE_PRECEDENCE)?;
                write!(f, " as {}", type_name)
            }
            Atom::Indexer { left, index } => {
                left.fmt_operand(f, BinOp::Dot.precedence())?;
                write!(f, "[{}]", index)
            }
            Atom::Function { name, args, .. } => {
                let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                write!(f, "{}({})", name, args.join(", "))
            }
        }
    }
}

/// A parsed expression together with its source text.
///
/// Produced by [`crate::parser::parse`]; evaluate it with
/// [`Program::evaluate`] as many times as needed.
#[derive(Debug, Clone)]
pub struct Program {
    pub source: String,
    pub child: Atom,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.child)
    }
}
