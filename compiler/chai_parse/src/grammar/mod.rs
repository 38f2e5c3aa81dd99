//! Grammar productions.
//!
//! - `stmt`: statements, definitions and control flow
//! - `expr`: operator expressions, postfix chains and primaries

mod expr;
mod stmt;

use crate::cursor::Cursor;
use crate::ParseError;
use chai_ir::{Expr, ExprArena, ExprId, ExprKind, Span};
use chai_lexer::{TokenKind, TokenList};

pub(crate) struct Parser<'a> {
    cursor: Cursor<'a>,
    arena: ExprArena,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a TokenList, source_len: usize) -> Self {
        Parser {
            cursor: Cursor::new(tokens),
            arena: ExprArena::with_capacity(source_len),
        }
    }

    pub fn into_arena(self) -> ExprArena {
        self.arena
    }

    /// Parse a whole script into an `ExprKind::Script` node.
    pub fn parse_script(&mut self) -> Result<ExprId, ParseError> {
        let start = self.cursor.current_span();
        let mut statements = Vec::new();
        self.skip_semicolons();
        while !self.cursor.at_end() {
            statements.push(self.parse_statement()?);
            self.skip_semicolons();
        }
        let body = self.arena.alloc_expr_list(statements);
        let span = start.merge(self.cursor.current_span());
        Ok(self.alloc(ExprKind::Script(body), span))
    }

    #[inline]
    fn alloc(&mut self, kind: ExprKind, span: Span) -> ExprId {
        self.arena.alloc_expr(Expr::new(kind, span))
    }

    fn skip_semicolons(&mut self) {
        while self.cursor.eat(TokenKind::Semicolon) {}
    }
}
