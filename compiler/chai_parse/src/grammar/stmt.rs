//! Statements, definitions and control flow.

use super::Parser;
use crate::ParseError;
use chai_ir::{CatchClause, ExprId, ExprKind, Param, ParamRange};
use chai_lexer::TokenKind;
use chai_stack::ensure_sufficient_stack;

impl Parser<'_> {
    /// Parse one statement. Trailing `;` are consumed by the caller.
    pub(super) fn parse_statement(&mut self) -> Result<ExprId, ParseError> {
        ensure_sufficient_stack(|| match self.cursor.current_kind() {
            TokenKind::Def => self.parse_def(),
            TokenKind::Class => self.parse_class(),
            TokenKind::Attr => self.parse_attr(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Try => self.parse_try(),
            TokenKind::LBrace => self.parse_block(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Break => {
                let token = self.cursor.advance();
                Ok(self.alloc(ExprKind::Break, token.span))
            }
            TokenKind::Continue => {
                let token = self.cursor.advance();
                Ok(self.alloc(ExprKind::Continue, token.span))
            }
            TokenKind::Throw => {
                let start = self.cursor.advance().span;
                let value = self.parse_expr()?;
                let span = self.cursor.span_from(start);
                Ok(self.alloc(ExprKind::Throw(value), span))
            }
            _ => self.parse_expr(),
        })
    }

    /// `{ statements }`
    pub(super) fn parse_block(&mut self) -> Result<ExprId, ParseError> {
        let start = self.cursor.expect(TokenKind::LBrace)?.span;
        let mut statements = Vec::new();
        self.skip_semicolons();
        while !self.cursor.check(TokenKind::RBrace) {
            if self.cursor.at_end() {
                return Err(ParseError::expected("`}`", self.cursor.current()));
            }
            statements.push(self.parse_statement()?);
            self.skip_semicolons();
        }
        self.cursor.advance();
        let body = self.arena.alloc_expr_list(statements);
        let span = self.cursor.span_from(start);
        Ok(self.alloc(ExprKind::Block(body), span))
    }

    /// `def [Class::]name(params) [: guard] { body }`
    ///
    /// Inside a class body the qualifier is omitted and the evaluator
    /// supplies the enclosing class.
    fn parse_def(&mut self) -> Result<ExprId, ParseError> {
        let start = self.cursor.expect(TokenKind::Def)?.span;
        let first = self.cursor.expect_ident()?;
        let (class, name) = if self.cursor.eat(TokenKind::DoubleColon) {
            (Some(first), self.cursor.expect_ident()?)
        } else {
            (None, first)
        };

        let params = self.parse_params()?;
        let guard = if self.cursor.eat(TokenKind::Colon) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let body = self.parse_block()?;
        let span = self.cursor.span_from(start);
        Ok(self.alloc(
            ExprKind::Def {
                name,
                class,
                params,
                guard,
                body,
            },
            span,
        ))
    }

    /// `( [type] name, ... )`
    pub(super) fn parse_params(&mut self) -> Result<ParamRange, ParseError> {
        self.cursor.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.cursor.check(TokenKind::RParen) {
            let start = self.cursor.current_span();
            let first = self.cursor.expect_ident()?;
            let param = match self.cursor.current_kind() {
                TokenKind::Ident(name) => {
                    self.cursor.advance();
                    Param {
                        name,
                        ty: Some(first),
                        span: self.cursor.span_from(start),
                    }
                }
                _ => Param {
                    name: first,
                    ty: None,
                    span: start,
                },
            };
            params.push(param);
            if !self.cursor.eat(TokenKind::Comma) {
                break;
            }
        }
        self.cursor.expect(TokenKind::RParen)?;
        Ok(self.arena.alloc_params(params))
    }

    /// `class Name { attr x; var y; def Name(..) {..} def m(..) {..} }`
    fn parse_class(&mut self) -> Result<ExprId, ParseError> {
        let start = self.cursor.expect(TokenKind::Class)?.span;
        let name = self.cursor.expect_ident()?;
        self.cursor.expect(TokenKind::LBrace)?;

        let mut members = Vec::new();
        self.skip_semicolons();
        while !self.cursor.eat(TokenKind::RBrace) {
            let member = match self.cursor.current_kind() {
                TokenKind::Def => self.parse_def()?,
                TokenKind::Attr => self.parse_attr()?,
                // `var x` inside a class body declares an attribute.
                TokenKind::Var | TokenKind::Auto => {
                    let member_start = self.cursor.advance().span;
                    let attr = self.cursor.expect_ident()?;
                    let span = self.cursor.span_from(member_start);
                    self.alloc(
                        ExprKind::Attr {
                            class: None,
                            name: attr,
                        },
                        span,
                    )
                }
                _ => {
                    return Err(ParseError::expected(
                        "`def`, `attr` or `}`",
                        self.cursor.current(),
                    ))
                }
            };
            members.push(member);
            self.skip_semicolons();
        }

        let body = self.arena.alloc_expr_list(members);
        let span = self.cursor.span_from(start);
        Ok(self.alloc(ExprKind::Class { name, body }, span))
    }

    /// `attr [Class::]name`
    fn parse_attr(&mut self) -> Result<ExprId, ParseError> {
        let start = self.cursor.expect(TokenKind::Attr)?.span;
        let first = self.cursor.expect_ident()?;
        let (class, name) = if self.cursor.eat(TokenKind::DoubleColon) {
            (Some(first), self.cursor.expect_ident()?)
        } else {
            (None, first)
        };
        let span = self.cursor.span_from(start);
        Ok(self.alloc(ExprKind::Attr { class, name }, span))
    }

    /// `if (cond) { .. } [else if .. | else { .. }]`
    fn parse_if(&mut self) -> Result<ExprId, ParseError> {
        let start = self.cursor.expect(TokenKind::If)?.span;
        let cond = self.parse_paren_expr()?;
        let then_branch = self.parse_block()?;
        let else_branch = if self.cursor.eat(TokenKind::Else) {
            if self.cursor.check(TokenKind::If) {
                Some(self.parse_if()?)
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        let span = self.cursor.span_from(start);
        Ok(self.alloc(
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            },
            span,
        ))
    }

    fn parse_while(&mut self) -> Result<ExprId, ParseError> {
        let start = self.cursor.expect(TokenKind::While)?.span;
        let cond = self.parse_paren_expr()?;
        let body = self.parse_block()?;
        let span = self.cursor.span_from(start);
        Ok(self.alloc(ExprKind::While { cond, body }, span))
    }

    /// `for (init; cond; step) { .. }`, each clause optional.
    fn parse_for(&mut self) -> Result<ExprId, ParseError> {
        let start = self.cursor.expect(TokenKind::For)?.span;
        self.cursor.expect(TokenKind::LParen)?;
        let init = self.parse_optional_clause(TokenKind::Semicolon)?;
        self.cursor.expect(TokenKind::Semicolon)?;
        let cond = self.parse_optional_clause(TokenKind::Semicolon)?;
        self.cursor.expect(TokenKind::Semicolon)?;
        let step = self.parse_optional_clause(TokenKind::RParen)?;
        self.cursor.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        let span = self.cursor.span_from(start);
        Ok(self.alloc(
            ExprKind::For {
                init,
                cond,
                step,
                body,
            },
            span,
        ))
    }

    fn parse_optional_clause(&mut self, end: TokenKind) -> Result<Option<ExprId>, ParseError> {
        if self.cursor.check(end) {
            Ok(None)
        } else {
            self.parse_expr().map(Some)
        }
    }

    /// `try { .. } catch [([Type] e)] { .. } ... [finally { .. }]`
    fn parse_try(&mut self) -> Result<ExprId, ParseError> {
        let start = self.cursor.expect(TokenKind::Try)?.span;
        let body = self.parse_block()?;

        let mut catches = Vec::new();
        while self.cursor.check(TokenKind::Catch) {
            let catch_start = self.cursor.advance().span;
            let (binding, ty) = if self.cursor.eat(TokenKind::LParen) {
                let first = self.cursor.expect_ident()?;
                let clause = match self.cursor.current_kind() {
                    TokenKind::Ident(binding) => {
                        self.cursor.advance();
                        (Some(binding), Some(first))
                    }
                    _ => (Some(first), None),
                };
                self.cursor.expect(TokenKind::RParen)?;
                clause
            } else {
                (None, None)
            };
            let catch_body = self.parse_block()?;
            catches.push(CatchClause {
                binding,
                ty,
                body: catch_body,
                span: self.cursor.span_from(catch_start),
            });
        }

        let finally = if self.cursor.eat(TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };

        if catches.is_empty() && finally.is_none() {
            return Err(ParseError::expected(
                "`catch` or `finally`",
                self.cursor.current(),
            ));
        }

        let catches = self.arena.alloc_catches(catches);
        let span = self.cursor.span_from(start);
        Ok(self.alloc(
            ExprKind::Try {
                body,
                catches,
                finally,
            },
            span,
        ))
    }

    fn parse_return(&mut self) -> Result<ExprId, ParseError> {
        let start = self.cursor.expect(TokenKind::Return)?.span;
        let value = match self.cursor.current_kind() {
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof => None,
            _ => Some(self.parse_expr()?),
        };
        let span = self.cursor.span_from(start);
        Ok(self.alloc(ExprKind::Return(value), span))
    }

    /// `( expr )`
    pub(super) fn parse_paren_expr(&mut self) -> Result<ExprId, ParseError> {
        self.cursor.expect(TokenKind::LParen)?;
        let expr = self.parse_expr()?;
        self.cursor.expect(TokenKind::RParen)?;
        Ok(expr)
    }
}
