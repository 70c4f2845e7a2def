//! Tokenizer for `showIf` expressions.
//!
//! Only the characters the restricted grammar needs are accepted. A lone `=`,
//! `.`, `[`, or any other character is rejected here, which keeps
//! assignments, member access, and calls out before parsing starts.

use super::ParseError;

/// Token categories.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Number(f64),
    Str(String),
    True,
    False,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Bang,
    Minus,
    LParen,
    RParen,
    Eof,
}

/// A token with its source text and byte offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub pos: usize,
}

impl Token {
    /// The end-of-input marker for a source of the given length.
    pub fn eof(pos: usize) -> Self {
        Self { kind: TokenKind::Eof, text: "end of input".to_owned(), pos }
    }
}

/// Split `source` into tokens. The end-of-input marker is not included.
///
/// # Errors
///
/// Returns a [`ParseError`] for unsupported characters, a lone `=`, `&`, or
/// `|`, malformed numbers, and unterminated strings.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer { source, pos: 0 };
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

struct Lexer<'a> {
    source: &'a str,
    pos: usize,
}

impl Lexer<'_> {
    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.source[self.pos..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn error(&self, message: &str, start: usize) -> ParseError {
        let end = self.pos.max(start + self.source[start..].chars().next().map_or(0, char::len_utf8));
        ParseError::new(message, &self.source[start..end.min(self.source.len())], start)
    }

    fn next_token(&mut self) -> Result<Option<Token>, ParseError> {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        let start = self.pos;
        let Some(ch) = self.peek() else {
            return Ok(None);
        };

        let kind = if is_ident_start(ch) {
            self.identifier()
        } else if ch.is_ascii_digit() || (ch == '.' && self.peek_second().is_some_and(|c| c.is_ascii_digit())) {
            self.number(start)?
        } else if ch == '\'' || ch == '"' {
            self.string(start)?
        } else {
            self.operator(start)?
        };

        Ok(Some(Token { kind, text: self.source[start..self.pos].to_owned(), pos: start }))
    }

    fn identifier(&mut self) -> TokenKind {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_continue) {
            self.bump();
        }
        match &self.source[start..self.pos] {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            word => TokenKind::Ident(word.to_owned()),
        }
    }

    fn number(&mut self, start: usize) -> Result<TokenKind, ParseError> {
        self.digits();
        if self.peek() == Some('.') {
            self.bump();
            self.digits();
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                return Err(self.error("malformed number exponent", start));
            }
            self.digits();
        }
        if self.peek().is_some_and(is_ident_start) {
            self.bump();
            return Err(self.error("identifier cannot start with a digit", start));
        }
        match self.source[start..self.pos].parse::<f64>() {
            Ok(number) => Ok(TokenKind::Number(number)),
            Err(_) => Err(self.error("invalid number", start)),
        }
    }

    fn digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
    }

    fn string(&mut self, start: usize) -> Result<TokenKind, ParseError> {
        let Some(quote) = self.bump() else {
            return Err(self.error("unterminated string", start));
        };
        let mut text = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string", start)),
                Some(ch) if ch == quote => return Ok(TokenKind::Str(text)),
                Some('\\') => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(escaped @ ('\\' | '\'' | '"')) => text.push(escaped),
                    Some(_) => return Err(self.error("unsupported escape sequence", start)),
                    None => return Err(self.error("unterminated string", start)),
                },
                Some(ch) => text.push(ch),
            }
        }
    }

    fn operator(&mut self, start: usize) -> Result<TokenKind, ParseError> {
        let Some(ch) = self.bump() else {
            return Err(self.error("unexpected end of input", start));
        };
        let kind = match ch {
            '=' => {
                if !self.eat('=') {
                    return Err(self.error("assignment is not supported", start));
                }
                self.eat('=');
                TokenKind::EqEq
            }
            '!' => {
                if self.eat('=') {
                    self.eat('=');
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.eat('=') { TokenKind::Le } else { TokenKind::Lt }
            }
            '>' => {
                if self.eat('=') { TokenKind::Ge } else { TokenKind::Gt }
            }
            '&' => {
                if !self.eat('&') {
                    return Err(self.error("expected `&&`", start));
                }
                TokenKind::AndAnd
            }
            '|' => {
                if !self.eat('|') {
                    return Err(self.error("expected `||`", start));
                }
                TokenKind::OrOr
            }
            '-' => TokenKind::Minus,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            _ => return Err(self.error("unexpected character", start)),
        };
        Ok(kind)
    }
}

/// Whether `name` lexes as a single identifier, i.e. a `showIf` can refer to it.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(is_ident_start) && chars.all(is_ident_continue) && !matches!(name, "true" | "false")
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}
