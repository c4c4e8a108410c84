/// Lexical category of a [`Token`].
///
/// Punctuation gets one kind per character (or two-character operator), so
/// the parser can key its parselet tables directly on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    /// Single-quoted string, text kept verbatim (escapes undecoded)
    ///
    /// # Examples
    /// ```text
    /// 'hello'
    /// 'it\'s'
    /// ```
    String,

    /// Bare word, backtick-quoted name, `$this` or `%variable`
    ///
    /// `true`, `false` and the word operators (`and`, `div`, ...) are
    /// symbols too; the parser gives them meaning.
    ///
    /// # Examples
    /// ```text
    /// Patient
    /// `given name`
    /// $this
    /// %resource
    /// ```
    Symbol,

    /// Date, date-time or time literal, text without the leading `@`
    ///
    /// # Examples
    /// ```text
    /// @2024-01-15
    /// @2024-01-15T10:30:00Z
    /// @T14:30
    /// ```
    DateTime,

    /// Integer or decimal
    Number,

    /// Number merged with a following unit, text kept as written
    ///
    /// # Examples
    /// ```text
    /// 5 'mg'
    /// 4 days
    /// ```
    Quantity,

    /// `{}`
    EmptySet,

    // Punctuation
    Dot,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Ampersand,
    Pipe,
    Equals,
    NotEquals,
    Tilde,
    NotTilde,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    /// Any other character; only ever rejected by the parser
    Other,
}

/// A token with its source text and position.
///
/// `line` is 1-based, `column` is the 0-based offset of the first character
/// within that line.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            line,
            column,
        }
    }

    /// True for a symbol token spelling exactly `word`.
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Symbol && self.text == word
    }
}
