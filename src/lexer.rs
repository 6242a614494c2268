//! Lexical Analyzer for the Basil Scripting Language
//!
//! This module implements the tokenization phase of the interpreter pipeline.
//! It converts raw source code text into a stream of tokens that can be parsed
//! into an Abstract Syntax Tree.
//!
//! ## Tokenization Process
//!
//! The lexer scans the input one character at a time from a [`Position`]
//! cursor, with one character of lookahead for multi-character tokens
//! (`==`, `<=`, `->`, `!=`). Rules, first match wins:
//!
//! - Spaces and tabs are skipped; `\n` and `;` emit a `Newline` token
//! - `#` starts a comment running to the end of the line
//! - A leading digit starts a number (`Int` or `Float`, at most one `.`)
//! - A leading letter starts an identifier, promoted to a keyword when the
//!   spelling is reserved
//! - `"` starts a string literal with backslash escapes
//! - `!` must be followed by `=`; a bare `!` is an illegal character
//!
//! Lexing stops at the first illegal character: no partial token stream is
//! produced, only the error.

use crate::error::IllegalCharError;
use crate::token::{Keyword, Position, Token, TokenKind};
use std::rc::Rc;

/// Lexical analyzer that converts source code into tokens.
///
/// The lexer owns one mutable [`Position`] cursor and copies it at token
/// boundaries, so every emitted token carries an exact source span.
pub struct Lexer {
    /// Source code as a vector of characters for cheap single-step lookahead
    chars: Vec<char>,
    /// Cursor into the character stream
    pos: Position,
    /// Character at the cursor, or `None` at end of input
    current: Option<char>,
}

impl Lexer {
    pub fn new(file_name: &str, text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let current = chars.first().copied();
        Self {
            chars,
            pos: Position::new(Rc::from(file_name)),
            current,
        }
    }

    /// Tokenizes the entire input into a vector terminated by `Eof`.
    ///
    /// # Returns
    /// * `Ok(Vec<Token>)` - the complete token stream, `Eof` last
    /// * `Err(IllegalCharError)` - the first unrecognised character, with its
    ///   position
    pub fn make_tokens(mut self) -> Result<Vec<Token>, IllegalCharError> {
        let mut tokens = Vec::new();

        while let Some(c) = self.current {
            match c {
                ' ' | '\t' | '\r' => self.advance(),
                '#' => self.skip_comment(),
                '\n' | ';' => tokens.push(self.single(TokenKind::Newline)),
                '0'..='9' => tokens.push(self.make_number()),
                c if c.is_ascii_alphabetic() => tokens.push(self.make_identifier()),
                '"' => tokens.push(self.make_string()),
                '+' => tokens.push(self.single(TokenKind::Plus)),
                '-' => tokens.push(self.make_minus_or_arrow()),
                '*' => tokens.push(self.single(TokenKind::Mul)),
                '/' => tokens.push(self.single(TokenKind::Div)),
                '^' => tokens.push(self.single(TokenKind::Pow)),
                '(' => tokens.push(self.single(TokenKind::LParen)),
                ')' => tokens.push(self.single(TokenKind::RParen)),
                '[' => tokens.push(self.single(TokenKind::LSquare)),
                ']' => tokens.push(self.single(TokenKind::RSquare)),
                ',' => tokens.push(self.single(TokenKind::Comma)),
                '=' => tokens.push(self.make_equals()),
                '<' => tokens.push(self.make_less_than()),
                '>' => tokens.push(self.make_greater_than()),
                '!' => tokens.push(self.make_not_equals()?),
                _ => {
                    let pos_start = self.pos.clone();
                    self.advance();
                    return Err(IllegalCharError::new(
                        pos_start,
                        self.pos.clone(),
                        format!("'{}'", c),
                    ));
                }
            }
        }

        tokens.push(Token::new(
            TokenKind::Eof,
            self.pos.clone(),
            self.pos.clone(),
        ));
        Ok(tokens)
    }

    /// Consumes the current character and moves the cursor forward.
    fn advance(&mut self) {
        self.pos.advance(self.current);
        self.current = self.chars.get(self.pos.index).copied();
    }

    /// Emits a token for a single-character lexeme at the cursor.
    fn single(&mut self, kind: TokenKind) -> Token {
        let pos_start = self.pos.clone();
        self.advance();
        Token::new(kind, pos_start, self.pos.clone())
    }

    /// Skips a `#` comment up to (but not including) the line break, so the
    /// statement separator is still emitted.
    fn skip_comment(&mut self) {
        while let Some(c) = self.current {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Scans a numeric literal.
    ///
    /// Accumulates digits with at most one decimal point; a second `.`
    /// terminates the number. Emits `Int` or `Float` accordingly.
    fn make_number(&mut self) -> Token {
        let mut text = String::new();
        let mut dot_count = 0;
        let pos_start = self.pos.clone();

        while let Some(c) = self.current {
            if c == '.' {
                if dot_count == 1 {
                    break;
                }
                dot_count += 1;
                text.push('.');
            } else if c.is_ascii_digit() {
                text.push(c);
            } else {
                break;
            }
            self.advance();
        }

        let kind = if dot_count == 0 {
            // The accumulated text is all digits, so this can only fail on
            // values that overflow i64; fall back to the float reading.
            match text.parse::<i64>() {
                Ok(value) => TokenKind::Int(value),
                Err(_) => TokenKind::Float(text.parse::<f64>().unwrap_or(f64::INFINITY)),
            }
        } else {
            TokenKind::Float(text.parse::<f64>().unwrap_or(0.0))
        };

        Token::new(kind, pos_start, self.pos.clone())
    }

    /// Scans an identifier or keyword.
    ///
    /// Identifiers start with an ASCII letter and continue with letters,
    /// digits, or underscores. The complete spelling is checked against the
    /// keyword table.
    fn make_identifier(&mut self) -> Token {
        let mut text = String::new();
        let pos_start = self.pos.clone();

        while let Some(c) = self.current {
            if c.is_ascii_alphanumeric() || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let kind = match Keyword::lookup(&text) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Identifier(text),
        };

        Token::new(kind, pos_start, self.pos.clone())
    }

    /// Scans a string literal delimited by double quotes.
    ///
    /// A backslash escapes the next character: `\n` and `\t` map to their
    /// control characters, everything else (including `\"` and `\\`) maps to
    /// the character itself. An unterminated string ends at end of input.
    fn make_string(&mut self) -> Token {
        let mut text = String::new();
        let pos_start = self.pos.clone();
        let mut escaped = false;
        self.advance(); // consume opening '"'

        while let Some(c) = self.current {
            if escaped {
                text.push(match c {
                    'n' => '\n',
                    't' => '\t',
                    other => other,
                });
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                break;
            } else {
                text.push(c);
            }
            self.advance();
        }

        self.advance(); // consume closing '"'
        Token::new(TokenKind::Str(text), pos_start, self.pos.clone())
    }

    /// Scans `-` or `->`.
    fn make_minus_or_arrow(&mut self) -> Token {
        let pos_start = self.pos.clone();
        self.advance();

        let kind = if self.current == Some('>') {
            self.advance();
            TokenKind::Arrow
        } else {
            TokenKind::Minus
        };

        Token::new(kind, pos_start, self.pos.clone())
    }

    /// Scans `=` or `==`.
    fn make_equals(&mut self) -> Token {
        let pos_start = self.pos.clone();
        self.advance();

        let kind = if self.current == Some('=') {
            self.advance();
            TokenKind::Ee
        } else {
            TokenKind::Eq
        };

        Token::new(kind, pos_start, self.pos.clone())
    }

    /// Scans `<` or `<=`.
    fn make_less_than(&mut self) -> Token {
        let pos_start = self.pos.clone();
        self.advance();

        let kind = if self.current == Some('=') {
            self.advance();
            TokenKind::Lte
        } else {
            TokenKind::Lt
        };

        Token::new(kind, pos_start, self.pos.clone())
    }

    /// Scans `>` or `>=`.
    fn make_greater_than(&mut self) -> Token {
        let pos_start = self.pos.clone();
        self.advance();

        let kind = if self.current == Some('=') {
            self.advance();
            TokenKind::Gte
        } else {
            TokenKind::Gt
        };

        Token::new(kind, pos_start, self.pos.clone())
    }

    /// Scans `!=`; a bare `!` is an illegal character.
    fn make_not_equals(&mut self) -> Result<Token, IllegalCharError> {
        let pos_start = self.pos.clone();
        self.advance();

        if self.current == Some('=') {
            self.advance();
            return Ok(Token::new(TokenKind::Ne, pos_start, self.pos.clone()));
        }

        self.advance();
        Err(IllegalCharError::new(
            pos_start,
            self.pos.clone(),
            "'=' expected after '!'".to_string(),
        ))
    }
}
