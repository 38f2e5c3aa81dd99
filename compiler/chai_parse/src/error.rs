//! Parse error type.

use chai_ir::Span;
use chai_lexer::{Token, TokenKind};
use std::fmt;

/// A syntax error. Parsing stops at the first one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        ParseError {
            message: message.into(),
            span,
        }
    }

    #[cold]
    pub(crate) fn expected(what: &str, found: Token) -> Self {
        let message = if found.kind == TokenKind::Error {
            format!("expected {what}, found invalid token")
        } else {
            format!("expected {what}, found {}", found.kind.describe())
        };
        ParseError::new(message, found.span)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.span)
    }
}

impl std::error::Error for ParseError {}
