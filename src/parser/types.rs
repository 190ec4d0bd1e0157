//! Parser types and limits.
//!
//! Shared types and watchdog constants used across the parser modules.

use std::fmt;
use crate::parser::lexer::{Token, TokenType};

// Watchdog limits against runaway parsing of corrupt input
pub const MAX_INPUT_SIZE: usize = 1_000_000;
pub const MAX_TOKENS: usize = 100_000;
pub const MAX_PARSE_ITERATIONS: usize = 100_000;
pub const MAX_PARSER_DEPTH: usize = 200;

/// Check if a token type is a redirection operator.
pub fn is_redirection_token(t: TokenType) -> bool {
    matches!(
        t,
        TokenType::Less
            | TokenType::Great
            | TokenType::DLess
            | TokenType::DGreat
            | TokenType::LessAnd
            | TokenType::GreatAnd
            | TokenType::LessGreat
            | TokenType::DLessDash
            | TokenType::Clobber
            | TokenType::TLess
            | TokenType::AndGreat
            | TokenType::AndDGreat
    )
}

/// Check if a token type may follow a bare fd number in a redirection.
/// &> and &>> never take an fd prefix.
pub fn is_redirection_after_number(t: TokenType) -> bool {
    is_redirection_token(t) && !matches!(t, TokenType::AndGreat | TokenType::AndDGreat)
}

#[derive(Debug, Clone)]
pub struct ParseException {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub token: Option<Token>,
}

impl fmt::Display for ParseException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parse error at {}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for ParseException {}

impl ParseException {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self { message: message.into(), line, column, token: None }
    }

    pub fn at_token(message: impl Into<String>, token: &Token) -> Self {
        Self {
            message: message.into(),
            line: token.line,
            column: token.column,
            token: Some(token.clone()),
        }
    }
}
