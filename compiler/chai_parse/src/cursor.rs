//! Token cursor for navigating the token stream.

use crate::ParseError;
use chai_ir::{Name, Span};
use chai_lexer::{Token, TokenKind, TokenList};

/// Cursor over a lexed token list.
///
/// Invariant: the list ends with `Eof`, and the cursor never moves past it.
pub(crate) struct Cursor<'a> {
    tokens: &'a TokenList,
    pos: usize,
    /// Span of the most recently consumed token.
    prev_span: Span,
}

impl<'a> Cursor<'a> {
    pub fn new(tokens: &'a TokenList) -> Self {
        Cursor {
            tokens,
            pos: 0,
            prev_span: Span::point(0),
        }
    }

    #[inline]
    pub fn current(&self) -> Token {
        self.tokens.get(self.pos)
    }

    #[inline]
    pub fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    #[inline]
    pub fn current_span(&self) -> Span {
        self.current().span
    }

    #[inline]
    pub fn peek_kind(&self, offset: usize) -> TokenKind {
        self.tokens.get(self.pos + offset).kind
    }

    #[inline]
    pub fn previous_span(&self) -> Span {
        self.prev_span
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.current_kind() == TokenKind::Eof
    }

    /// Consume and return the current token.
    pub fn advance(&mut self) -> Token {
        let token = self.current();
        if !self.at_end() {
            self.pos += 1;
        }
        self.prev_span = token.span;
        token
    }

    /// Whether the current token has the same kind as `kind`.
    ///
    /// Payload-carrying kinds are compared by variant only.
    #[inline]
    pub fn check(&self, kind: TokenKind) -> bool {
        std::mem::discriminant(&self.current_kind()) == std::mem::discriminant(&kind)
    }

    /// Consume the current token if it matches `kind`.
    pub fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a token of kind `kind` or fail with an "expected" error.
    pub fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::expected(kind.describe(), self.current()))
        }
    }

    /// Consume an identifier and return its name.
    pub fn expect_ident(&mut self) -> Result<Name, ParseError> {
        match self.current_kind() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(ParseError::expected("identifier", self.current())),
        }
    }

    /// Span from `start` to the end of the last consumed token.
    #[inline]
    pub fn span_from(&self, start: Span) -> Span {
        start.merge(self.prev_span)
    }
}
