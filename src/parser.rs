use std::{collections::HashMap, sync::LazyLock};

use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{
        Atom, BinOp, Program, Token, TokenKind, UnaryOp,
        operators::{
            CALL_PRECEDENCE, INDEXER_PRECEDENCE, LOWEST_PRECEDENCE, Precedence, TYPE_PRECEDENCE,
            UNARY_PRECEDENCE,
        },
    },
    date::parse_date_string,
    functions,
    lexer::Lexer,
    value::{Quantity, Value},
};

/// Errors raised while turning source text into a [`Program`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The expression ended where more input was required
    #[error("Cant consume unknown more tokens.")]
    UnexpectedEnd,

    /// A closing delimiter is missing
    #[error("Parse error: expected `{0}`")]
    Expected(String),

    /// The token cannot start an expression
    #[error("Parse error at \"{text}\" (line {line}, column {column}). No matching prefix parselet.")]
    NoPrefixParselet {
        text: String,
        line: usize,
        column: usize,
    },

    /// `(` after something other than a function name
    #[error("Unexpected parentheses")]
    UnexpectedParentheses,

    /// Call to a name missing from the function library
    #[error("Unrecognized function: {0}")]
    UnrecognizedFunction(String),

    /// Input left over after a complete expression
    #[error("Parse error at \"{text}\" (line {line}, column {column}). Unexpected token.")]
    UnexpectedToken {
        text: String,
        line: usize,
        column: usize,
    },

    /// `is` / `as` followed by something that is not a type name
    #[error("Invalid type name: {0}")]
    InvalidTypeName(String),

    /// Number or quantity text that does not parse
    #[error("Invalid literal: {0}")]
    InvalidLiteral(String),
}

type PrefixParselet = fn(&mut Parser, Token) -> Result<Atom, ParseError>;
type InfixFn = fn(&mut Parser, Atom, Token) -> Result<Atom, ParseError>;

#[derive(Clone, Copy)]
struct InfixParselet {
    precedence: Precedence,
    parse: InfixFn,
}

static PREFIX_PARSELETS: LazyLock<HashMap<TokenKind, PrefixParselet>> = LazyLock::new(|| {
    let mut table: HashMap<TokenKind, PrefixParselet> = HashMap::new();
    table.insert(TokenKind::String, parse_string);
    table.insert(TokenKind::Number, parse_number);
    table.insert(TokenKind::Quantity, parse_quantity);
    table.insert(TokenKind::DateTime, parse_date_time);
    table.insert(TokenKind::Symbol, parse_symbol);
    table.insert(TokenKind::EmptySet, parse_empty_set);
    table.insert(TokenKind::LParen, parse_group);
    table.insert(TokenKind::Plus, parse_unary_plus);
    table.insert(TokenKind::Minus, parse_unary_minus);
    table
});

static INFIX_PARSELETS: LazyLock<HashMap<TokenKind, InfixParselet>> = LazyLock::new(|| {
    let mut table = HashMap::new();
    table.insert(
        TokenKind::LParen,
        InfixParselet {
            precedence: CALL_PRECEDENCE,
            parse: parse_call,
        },
    );
    table.insert(
        TokenKind::LBracket,
        InfixParselet {
            precedence: INDEXER_PRECEDENCE,
            parse: parse_indexer,
        },
    );
    for kind in [
        TokenKind::Dot,
        TokenKind::Plus,
        TokenKind::Minus,
        TokenKind::Star,
        TokenKind::Slash,
        TokenKind::Ampersand,
        TokenKind::Pipe,
        TokenKind::Less,
        TokenKind::LessEqual,
        TokenKind::Greater,
        TokenKind::GreaterEqual,
        TokenKind::Equals,
        TokenKind::NotEquals,
        TokenKind::Tilde,
        TokenKind::NotTilde,
    ] {
        let probe = Token::new(kind, "", 0, 0);
        if let Some(op) = BinOp::from_token(&probe) {
            table.insert(
                kind,
                InfixParselet {
                    precedence: op.precedence(),
                    parse: parse_binary,
                },
            );
        }
    }
    table
});

/// Word operators, dispatched through the symbol token.
static KEYWORD_PARSELETS: LazyLock<HashMap<&'static str, InfixParselet>> = LazyLock::new(|| {
    let mut table = HashMap::new();
    for word in ["div", "mod", "in", "contains", "and", "or", "xor", "implies"] {
        if let Some(op) = BinOp::from_keyword(word) {
            table.insert(
                word,
                InfixParselet {
                    precedence: op.precedence(),
                    parse: parse_keyword_binary,
                },
            );
        }
    }
    table.insert(
        "is",
        InfixParselet {
            precedence: TYPE_PRECEDENCE,
            parse: parse_type_operator,
        },
    );
    table.insert(
        "as",
        InfixParselet {
            precedence: TYPE_PRECEDENCE,
            parse: parse_type_operator,
        },
    );
    table
});

fn infix_parselet(token: &Token) -> Option<InfixParselet> {
    if token.kind == TokenKind::Symbol {
        KEYWORD_PARSELETS.get(token.text.as_str()).copied()
    } else {
        INFIX_PARSELETS.get(&token.kind).copied()
    }
}

/// Pratt parser over the token stream of one expression.
pub struct Parser {
    lexer: Lexer,
    current_token: Option<Token>,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Self {
        let current_token = lexer.next_token();
        Parser {
            lexer,
            current_token,
        }
    }

    fn consume(&mut self) -> Result<Token, ParseError> {
        let next = self.lexer.next_token();
        std::mem::replace(&mut self.current_token, next).ok_or(ParseError::UnexpectedEnd)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current_token.as_ref().is_some_and(|t| t.kind == kind)
    }

    fn expect(&mut self, kind: TokenKind, text: &str) -> Result<Token, ParseError> {
        if !self.check(kind) {
            return Err(ParseError::Expected(text.to_string()));
        }
        self.consume()
    }

    /// Parses an expression whose operators all bind tighter than `ceiling`.
    pub fn parse_expression(&mut self, ceiling: Precedence) -> Result<Atom, ParseError> {
        let token = self.consume()?;
        let prefix = PREFIX_PARSELETS
            .get(&token.kind)
            .ok_or_else(|| ParseError::NoPrefixParselet {
                text: token.text.clone(),
                line: token.line,
                column: token.column,
            })?;
        let mut left = prefix(self, token)?;

        while let Some(infix) = self.current_token.as_ref().and_then(infix_parselet) {
            if infix.precedence >= ceiling {
                break;
            }
            let token = self.consume()?;
            left = (infix.parse)(self, left, token)?;
        }

        Ok(left)
    }

    fn parse_unary(&mut self, op: UnaryOp) -> Result<Atom, ParseError> {
        let operand = self.parse_expression(UNARY_PRECEDENCE)?;
        Ok(Atom::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// Parses a complete expression and rejects trailing input.
    pub fn parse(&mut self) -> Result<Atom, ParseError> {
        let atom = self.parse_expression(LOWEST_PRECEDENCE)?;
        match self.current_token.take() {
            None => Ok(atom),
            Some(token) => Err(ParseError::UnexpectedToken {
                text: token.text,
                line: token.line,
                column: token.column,
            }),
        }
    }
}

// ========================================
// Prefix parselets
// ========================================

fn parse_string(_: &mut Parser, token: Token) -> Result<Atom, ParseError> {
    Ok(Atom::Literal(Value::String(unescape(&token.text))))
}

fn parse_number(_: &mut Parser, token: Token) -> Result<Atom, ParseError> {
    let n = token
        .text
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidLiteral(token.text.clone()))?;
    Ok(Atom::Literal(Value::Number(n)))
}

/// `5 'mg'` keeps the UCUM unit; `4 days` becomes the placeholder `{days}`.
fn parse_quantity(_: &mut Parser, token: Token) -> Result<Atom, ParseError> {
    let (number, unit) = token
        .text
        .split_once(' ')
        .ok_or_else(|| ParseError::InvalidLiteral(token.text.clone()))?;
    let value = number
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidLiteral(token.text.clone()))?;
    let unit = match unit.strip_prefix('\'').and_then(|u| u.strip_suffix('\'')) {
        Some(ucum) => unescape(ucum),
        None => format!("{{{}}}", unit),
    };
    Ok(Atom::Literal(Value::Quantity(Quantity::new(value, unit))))
}

fn parse_date_time(_: &mut Parser, token: Token) -> Result<Atom, ParseError> {
    Ok(Atom::Literal(Value::String(parse_date_string(&token.text))))
}

fn parse_symbol(_: &mut Parser, token: Token) -> Result<Atom, ParseError> {
    Ok(match token.text.as_str() {
        "true" => Atom::Literal(Value::Boolean(true)),
        "false" => Atom::Literal(Value::Boolean(false)),
        _ => Atom::Symbol(token.text),
    })
}

fn parse_empty_set(_: &mut Parser, _: Token) -> Result<Atom, ParseError> {
    Ok(Atom::EmptySet)
}

fn parse_unary_plus(parser: &mut Parser, _: Token) -> Result<Atom, ParseError> {
    parser.parse_unary(UnaryOp::Plus)
}

fn parse_unary_minus(parser: &mut Parser, _: Token) -> Result<Atom, ParseError> {
    parser.parse_unary(UnaryOp::Minus)
}

fn parse_group(parser: &mut Parser, _: Token) -> Result<Atom, ParseError> {
    let inner = parser.parse_expression(LOWEST_PRECEDENCE)?;
    parser.expect(TokenKind::RParen, ")")?;
    Ok(inner)
}

// ========================================
// Infix parselets
// ========================================

fn parse_binary(parser: &mut Parser, left: Atom, token: Token) -> Result<Atom, ParseError> {
    let op = BinOp::from_token(&token).ok_or_else(|| ParseError::UnexpectedToken {
        text: token.text.clone(),
        line: token.line,
        column: token.column,
    })?;
    let right = parser.parse_expression(op.precedence())?;
    Ok(Atom::binary(op, left, right))
}

fn parse_keyword_binary(parser: &mut Parser, left: Atom, token: Token) -> Result<Atom, ParseError> {
    let op = BinOp::from_keyword(&token.text).ok_or_else(|| ParseError::UnexpectedToken {
        text: token.text.clone(),
        line: token.line,
        column: token.column,
    })?;
    let right = parser.parse_expression(op.precedence())?;
    Ok(Atom::binary(op, left, right))
}

fn parse_type_operator(parser: &mut Parser, left: Atom, token: Token) -> Result<Atom, ParseError> {
    let right = parser.parse_expression(TYPE_PRECEDENCE)?;
    let type_name = type_name_of(&right)?;
    let operand = Box::new(left);
    Ok(if token.text == "is" {
        Atom::Is { operand, type_name }
    } else {
        Atom::As { operand, type_name }
    })
}

fn parse_call(parser: &mut Parser, left: Atom, _: Token) -> Result<Atom, ParseError> {
    let Atom::Symbol(name) = left else {
        return Err(ParseError::UnexpectedParentheses);
    };
    let func = functions::lookup(&name).ok_or_else(|| ParseError::UnrecognizedFunction(name.clone()))?;

    let mut args = Vec::new();
    if !parser.check(TokenKind::RParen) {
        loop {
            args.push(parser.parse_expression(LOWEST_PRECEDENCE)?);
            if parser.check(TokenKind::Comma) {
                parser.consume()?;
            } else {
                break;
            }
        }
    }
    parser.expect(TokenKind::RParen, ")")?;

    Ok(Atom::Function { name, args, func })
}

fn parse_indexer(parser: &mut Parser, left: Atom, _: Token) -> Result<Atom, ParseError> {
    let index = parser.parse_expression(LOWEST_PRECEDENCE)?;
    parser.expect(TokenKind::RBracket, "]")?;
    Ok(Atom::Indexer {
        left: Box::new(left),
        index: Box::new(index),
    })
}

/// Extracts the unqualified type name from `Patient`, `FHIR.Patient` or
/// `System.Boolean`.
pub fn type_name_of(atom: &Atom) -> Result<String, ParseError> {
    let text = atom.to_string();
    let valid = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.');
    if !valid {
        return Err(ParseError::InvalidTypeName(text));
    }
    Ok(text.rsplit('.').next().unwrap_or_default().to_string())
}

/// Decodes the escape sequences of a quoted string literal.
pub fn unescape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('f') => result.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => result.push(decoded),
                    None => {
                        result.push_str("\\u");
                        result.push_str(&hex);
                    }
                }
            }
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }
    result
}

/// Parses expression source into a reusable [`Program`].
///
/// ```
/// use fhirpath_lang::parser::parse;
///
/// let program = parse("Patient.name.given").unwrap();
/// assert_eq!(program.to_string(), "Patient.name.given");
///
/// assert!(parse("(2 + 1").is_err());
/// ```
pub fn parse(source: &str) -> Result<Program, ParseError> {
    let mut parser = Parser::new(Lexer::new(source));
    let child = parser.parse()?;
    debug!(expression = source, "parsed expression");
    Ok(Program {
        source: source.to_string(),
        child,
    })
}
