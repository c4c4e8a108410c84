use crate::ast::{Token, TokenKind};

/// Unit keywords that merge with a preceding number into a quantity.
pub const CALENDAR_UNITS: &[&str] = &[
    "year",
    "years",
    "month",
    "months",
    "week",
    "weeks",
    "day",
    "days",
    "hour",
    "hours",
    "minute",
    "minutes",
    "second",
    "seconds",
    "millisecond",
    "milliseconds",
];

/// Splits expression source into tokens.
///
/// The lexer is total: every input produces a token stream, and anything it
/// does not understand becomes a [`TokenKind::Other`] token for the parser to
/// reject.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    line_start: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            line_start: 0,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        if self.current_char() == Some('\n') {
            self.line += 1;
            self.line_start = self.position + 1;
        }
        self.position += 1;
    }

    fn slice(&self, start: usize) -> String {
        self.input[start..self.position].iter().collect()
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match (self.current_char(), self.peek_char(1)) {
                (Some(ch), _) if ch.is_whitespace() => self.advance(),
                (Some('/'), Some('*')) => {
                    self.advance();
                    self.advance();
                    while let Some(ch) = self.current_char() {
                        if ch == '*' && self.peek_char(1) == Some('/') {
                            self.advance();
                            self.advance();
                            break;
                        }
                        self.advance();
                    }
                }
                (Some('/'), Some('/')) => {
                    while let Some(ch) = self.current_char() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    /// Reads up to the closing `delimiter`, keeping backslash pairs as written.
    fn read_delimited(&mut self, delimiter: char) -> String {
        self.advance(); // opening delimiter
        let start = self.position;
        while let Some(ch) = self.current_char() {
            if ch == delimiter {
                let text = self.slice(start);
                self.advance();
                return text;
            }
            if ch == '\\' && self.peek_char(1).is_some() {
                self.advance();
            }
            self.advance();
        }
        self.slice(start)
    }

    fn read_identifier(&mut self) -> String {
        let start = self.position;
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
        self.slice(start)
    }

    fn digits_ahead(&self, offset: usize, count: usize) -> bool {
        (0..count).all(|i| self.peek_char(offset + i).is_some_and(|c| c.is_ascii_digit()))
    }

    /// Consumes `sep` followed by `count` digits, if both are present.
    fn consume_group(&mut self, sep: Option<char>, count: usize) -> bool {
        let offset = usize::from(sep.is_some());
        if let Some(sep) = sep
            && self.current_char() != Some(sep)
        {
            return false;
        }
        if !self.digits_ahead(offset, count) {
            return false;
        }
        for _ in 0..offset + count {
            self.advance();
        }
        true
    }

    fn read_date_time(&mut self) -> String {
        self.advance(); // '@'
        let start = self.position;

        if self.consume_group(None, 4) && self.consume_group(Some('-'), 2) {
            self.consume_group(Some('-'), 2);
        }

        if self.current_char() == Some('T') {
            self.advance();
            if self.consume_group(None, 2)
                && self.consume_group(Some(':'), 2)
                && self.consume_group(Some(':'), 2)
                && self.current_char() == Some('.')
                && self.digits_ahead(1, 1)
            {
                self.advance();
                while self.current_char().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
            match self.current_char() {
                Some('Z') => self.advance(),
                Some('+') | Some('-') if self.digits_ahead(1, 2) => {
                    self.advance();
                    self.consume_group(None, 2);
                    self.consume_group(Some(':'), 2);
                }
                _ => {}
            }
        }

        self.slice(start)
    }

    fn read_number(&mut self) -> String {
        let start = self.position;
        if self.current_char() == Some('-') {
            self.advance();
        }
        while self.current_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.current_char() == Some('.') && self.digits_ahead(1, 1) {
            self.advance();
            while self.current_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        self.slice(start)
    }

    /// Length of a unit following a number across exactly one space, if any.
    fn unit_length(&self) -> Option<usize> {
        if self.current_char() != Some(' ') {
            return None;
        }
        match self.peek_char(1) {
            Some('\'') => {
                let mut offset = 2;
                loop {
                    match self.peek_char(offset) {
                        Some('\'') => return Some(offset + 1),
                        Some('\\') => offset += 2,
                        Some(_) => offset += 1,
                        None => return None,
                    }
                }
            }
            Some(c) if c.is_alphabetic() => {
                let mut offset = 1;
                let mut word = String::new();
                while let Some(c) = self.peek_char(offset) {
                    if !(c.is_alphanumeric() || c == '_') {
                        break;
                    }
                    word.push(c);
                    offset += 1;
                }
                CALENDAR_UNITS.contains(&word.as_str()).then_some(offset)
            }
            _ => None,
        }
    }

    fn operator_kind(ch: char) -> TokenKind {
        match ch {
            '.' => TokenKind::Dot,
            ',' => TokenKind::Comma,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '&' => TokenKind::Ampersand,
            '|' => TokenKind::Pipe,
            '=' => TokenKind::Equals,
            '~' => TokenKind::Tilde,
            '<' => TokenKind::Less,
            '>' => TokenKind::Greater,
            _ => TokenKind::Other,
        }
    }

    /// Returns the next token, or `None` once the input is exhausted.
    pub fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace_and_comments();

        let ch = self.current_char()?;
        let line = self.line;
        let column = self.position - self.line_start;
        let token = |kind, text: String| Some(Token::new(kind, text, line, column));

        match ch {
            '\'' => {
                let text = self.read_delimited('\'');
                token(TokenKind::String, text)
            }
            '`' => {
                let text = self.read_delimited('`');
                token(TokenKind::Symbol, text)
            }
            '@' => {
                let text = self.read_date_time();
                token(TokenKind::DateTime, text)
            }
            c if c.is_ascii_digit()
                || (c == '-' && self.position == 0 && self.digits_ahead(1, 1)) =>
            {
                let number = self.read_number();
                match self.unit_length() {
                    Some(len) => {
                        let start = self.position;
                        for _ in 0..len {
                            self.advance();
                        }
                        let unit = self.slice(start);
                        token(TokenKind::Quantity, format!("{}{}", number, unit))
                    }
                    None => token(TokenKind::Number, number),
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let text = self.read_identifier();
                token(TokenKind::Symbol, text)
            }
            '$' | '%' if self.peek_char(1).is_some_and(|c| c.is_alphabetic()) => {
                self.advance();
                let text = format!("{}{}", ch, self.read_identifier());
                token(TokenKind::Symbol, text)
            }
            _ => {
                let two = match (ch, self.peek_char(1)) {
                    ('!', Some('=')) => Some(TokenKind::NotEquals),
                    ('!', Some('~')) => Some(TokenKind::NotTilde),
                    ('<', Some('=')) => Some(TokenKind::LessEqual),
                    ('>', Some('=')) => Some(TokenKind::GreaterEqual),
                    ('{', Some('}')) => Some(TokenKind::EmptySet),
                    _ => None,
                };
                let start = self.position;
                match two {
                    Some(kind) => {
                        self.advance();
                        self.advance();
                        token(kind, self.slice(start))
                    }
                    None => {
                        self.advance();
                        token(Self::operator_kind(ch), ch.to_string())
                    }
                }
            }
        }
    }
}

impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

/// Tokenizes a whole expression.
///
/// ```
/// use fhirpath_lang::lexer::tokenize;
/// use fhirpath_lang::ast::TokenKind;
///
/// let tokens = tokenize("Patient.name");
/// let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
/// assert_eq!(kinds, vec![TokenKind::Symbol, TokenKind::Dot, TokenKind::Symbol]);
/// ```
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).collect()
}
