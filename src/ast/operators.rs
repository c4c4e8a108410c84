use super::tokens::{Token, TokenKind};

/// Binding strength of an infix construct. Lower binds tighter.
pub type Precedence = u8;

/// Precedence of a function call's `(`.
pub const CALL_PRECEDENCE: Precedence = 0;
/// Precedence of `.` navigation.
pub const DOT_PRECEDENCE: Precedence = 1;
/// Precedence of `[index]`.
pub const INDEXER_PRECEDENCE: Precedence = 2;
/// Precedence of prefix `+` and `-`.
pub const UNARY_PRECEDENCE: Precedence = 3;
/// Precedence of `is` and `as`.
pub const TYPE_PRECEDENCE: Precedence = 6;
/// Ceiling for a complete expression.
pub const LOWEST_PRECEDENCE: Precedence = 100;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    // Arithmetic
    /// Addition or string concatenation (`+`)
    Add,
    /// Subtraction (`-`)
    Subtract,
    /// Multiplication (`*`)
    Multiply,
    /// Division (`/`)
    Divide,
    /// Integer division (`div`)
    Div,
    /// Modulo (`mod`)
    Mod,

    // Collections
    /// String concatenation that skips empty operands (`&`)
    Concat,
    /// De-duplicating union (`|`)
    Union,

    // Comparison
    /// Less than (`<`)
    LessThan,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than (`>`)
    GreaterThan,
    /// Greater than or equal (`>=`)
    GreaterEqual,

    // Equality
    /// Equal (`=`)
    Equals,
    /// Not equal (`!=`)
    NotEquals,
    /// Equivalent (`~`)
    Equivalent,
    /// Not equivalent (`!~`)
    NotEquivalent,

    // Membership
    /// Left is a member of right (`in`)
    In,
    /// Right is a member of left (`contains`)
    Contains,

    // Logical
    /// Three-valued AND (`and`)
    And,
    /// Short-circuiting OR (`or`)
    Or,
    /// Three-valued XOR (`xor`)
    Xor,
    /// Three-valued implication (`implies`)
    Implies,

    // Navigation
    /// Evaluate the right side against the left result (`.`)
    Dot,
}

impl BinOp {
    pub fn precedence(self) -> Precedence {
        use BinOp::*;
        match self {
            Dot => DOT_PRECEDENCE,
            Multiply | Divide | Div | Mod => 4,
            Add | Subtract | Concat => 5,
            Union => 7,
            LessThan | LessEqual | GreaterThan | GreaterEqual => 8,
            Equals | NotEquals | Equivalent | NotEquivalent => 9,
            In | Contains => 10,
            And => 11,
            Xor | Or => 12,
            Implies => 13,
        }
    }

    /// Operator spelled by punctuation.
    pub fn from_token(token: &Token) -> Option<BinOp> {
        use BinOp::*;
        let op = match token.kind {
            TokenKind::Dot => Dot,
            TokenKind::Plus => Add,
            TokenKind::Minus => Subtract,
            TokenKind::Star => Multiply,
            TokenKind::Slash => Divide,
            TokenKind::Ampersand => Concat,
            TokenKind::Pipe => Union,
            TokenKind::Less => LessThan,
            TokenKind::LessEqual => LessEqual,
            TokenKind::Greater => GreaterThan,
            TokenKind::GreaterEqual => GreaterEqual,
            TokenKind::Equals => Equals,
            TokenKind::NotEquals => NotEquals,
            TokenKind::Tilde => Equivalent,
            TokenKind::NotTilde => NotEquivalent,
            _ => return None,
        };
        Some(op)
    }

    /// Operator spelled as a word (`and`, `div`, ...).
    pub fn from_keyword(word: &str) -> Option<BinOp> {
        use BinOp::*;
        let op = match word {
            "div" => Div,
            "mod" => Mod,
            "in" => In,
            "contains" => Contains,
            "and" => And,
            "or" => Or,
            "xor" => Xor,
            "implies" => Implies,
            _ => return None,
        };
        Some(op)
    }

    /// Source spelling.
    pub fn symbol(self) -> &'static str {
        use BinOp::*;
        match self {
            Add => "+",
            Subtract => "-",
            Multiply => "*",
            Divide => "/",
            Div => "div",
            Mod => "mod",
            Concat => "&",
            Union => "|",
            LessThan => "<",
            LessEqual => "<=",
            GreaterThan => ">",
            GreaterEqual => ">=",
            Equals => "=",
            NotEquals => "!=",
            Equivalent => "~",
            NotEquivalent => "!~",
            In => "in",
            Contains => "contains",
            And => "and",
            Or => "or",
            Xor => "xor",
            Implies => "implies",
            Dot => ".",
        }
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `+x`, returns the operand unchanged
    Plus,
    /// `-x`, negates numbers and quantities
    Minus,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
        }
    }
}
