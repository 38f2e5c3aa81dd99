//! Expression parsing: assignment, ternary, binary operators via
//! precedence climbing, unary prefixes, postfix chains and primaries.

use super::Parser;
use crate::ParseError;
use chai_ir::{BinaryOp, DeclKind, ExprId, ExprKind, NumberLit, Span, UnaryOp};
use chai_lexer::TokenKind;
use chai_stack::ensure_sufficient_stack;

/// Binary operator for a token, if it is one.
fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::NotEq => BinaryOp::NotEq,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::LtEq,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::GtEq,
        TokenKind::AmpAmp => BinaryOp::And,
        TokenKind::PipePipe => BinaryOp::Or,
        TokenKind::Amp => BinaryOp::BitAnd,
        TokenKind::Pipe => BinaryOp::BitOr,
        TokenKind::Caret => BinaryOp::BitXor,
        TokenKind::Shl => BinaryOp::Shl,
        TokenKind::Shr => BinaryOp::Shr,
        _ => return None,
    })
}

/// Operator of a compound assignment token (`+=` -> `+`).
fn compound_op(kind: TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::PlusEq => BinaryOp::Add,
        TokenKind::MinusEq => BinaryOp::Sub,
        TokenKind::StarEq => BinaryOp::Mul,
        TokenKind::SlashEq => BinaryOp::Div,
        TokenKind::PercentEq => BinaryOp::Mod,
        TokenKind::AmpEq => BinaryOp::BitAnd,
        TokenKind::PipeEq => BinaryOp::BitOr,
        TokenKind::CaretEq => BinaryOp::BitXor,
        TokenKind::ShlEq => BinaryOp::Shl,
        TokenKind::ShrEq => BinaryOp::Shr,
        _ => return None,
    })
}

impl Parser<'_> {
    /// Parse a full expression (assignment level).
    pub(super) fn parse_expr(&mut self) -> Result<ExprId, ParseError> {
        ensure_sufficient_stack(|| self.parse_assignment())
    }

    /// Assignment is right-associative: `a = b = c`.
    fn parse_assignment(&mut self) -> Result<ExprId, ParseError> {
        let target = self.parse_ternary()?;
        let kind = self.cursor.current_kind();

        if kind == TokenKind::Eq {
            self.cursor.advance();
            let value = self.parse_expr()?;
            let span = self.arena.span(target).merge(self.arena.span(value));
            return Ok(self.alloc(ExprKind::Assign { target, value }, span));
        }
        if let Some(op) = compound_op(kind) {
            self.cursor.advance();
            let value = self.parse_expr()?;
            let span = self.arena.span(target).merge(self.arena.span(value));
            return Ok(self.alloc(ExprKind::CompoundAssign { op, target, value }, span));
        }
        Ok(target)
    }

    /// `cond ? a : b`
    fn parse_ternary(&mut self) -> Result<ExprId, ParseError> {
        let cond = self.parse_binary(1)?;
        if !self.cursor.eat(TokenKind::Question) {
            return Ok(cond);
        }
        let then_branch = self.parse_expr()?;
        self.cursor.expect(TokenKind::Colon)?;
        let else_branch = self.parse_expr()?;
        let span = self.arena.span(cond).merge(self.arena.span(else_branch));
        Ok(self.alloc(
            ExprKind::Ternary {
                cond,
                then_branch,
                else_branch,
            },
            span,
        ))
    }

    /// Precedence climbing over left-associative binary operators.
    fn parse_binary(&mut self, min_prec: u8) -> Result<ExprId, ParseError> {
        let mut left = self.parse_unary()?;
        while let Some(op) = binary_op(self.cursor.current_kind()) {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.cursor.advance();
            let right = ensure_sufficient_stack(|| self.parse_binary(prec + 1))?;
            let span = self.arena.span(left).merge(self.arena.span(right));
            left = self.alloc(ExprKind::Binary { op, left, right }, span);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<ExprId, ParseError> {
        let start = self.cursor.current_span();
        let op = match self.cursor.current_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Tilde => UnaryOp::BitNot,
            TokenKind::Plus => {
                self.cursor.advance();
                return self.parse_unary();
            }
            // Prefix increment desugars to `x += 1`.
            kind @ (TokenKind::PlusPlus | TokenKind::MinusMinus) => {
                self.cursor.advance();
                let target = ensure_sufficient_stack(|| self.parse_unary())?;
                let one = self.alloc(ExprKind::Number(NumberLit::Int(1)), start);
                let op = if kind == TokenKind::PlusPlus {
                    BinaryOp::Add
                } else {
                    BinaryOp::Sub
                };
                let span = self.cursor.span_from(start);
                return Ok(self.alloc(
                    ExprKind::CompoundAssign {
                        op,
                        target,
                        value: one,
                    },
                    span,
                ));
            }
            _ => return self.parse_postfix(),
        };
        self.cursor.advance();
        let operand = ensure_sufficient_stack(|| self.parse_unary())?;
        let span = self.cursor.span_from(start);
        Ok(self.alloc(ExprKind::Unary { op, operand }, span))
    }

    /// Calls, indexing, member access and method calls.
    fn parse_postfix(&mut self) -> Result<ExprId, ParseError> {
        let start = self.cursor.current_span();
        let mut expr = self.parse_primary()?;
        loop {
            match self.cursor.current_kind() {
                TokenKind::LParen => {
                    let args = self.parse_args(TokenKind::LParen, TokenKind::RParen)?;
                    let span = self.cursor.span_from(start);
                    expr = self.alloc(ExprKind::Call { callee: expr, args }, span);
                }
                TokenKind::LBracket => {
                    self.cursor.advance();
                    let index = self.parse_expr()?;
                    self.cursor.expect(TokenKind::RBracket)?;
                    let span = self.cursor.span_from(start);
                    expr = self.alloc(
                        ExprKind::Index {
                            receiver: expr,
                            index,
                        },
                        span,
                    );
                }
                TokenKind::Dot => {
                    self.cursor.advance();
                    let name = self.cursor.expect_ident()?;
                    if self.cursor.check(TokenKind::LParen) {
                        let args = self.parse_args(TokenKind::LParen, TokenKind::RParen)?;
                        let span = self.cursor.span_from(start);
                        expr = self.alloc(
                            ExprKind::MethodCall {
                                receiver: expr,
                                method: name,
                                args,
                            },
                            span,
                        );
                    } else {
                        let span = self.cursor.span_from(start);
                        expr = self.alloc(
                            ExprKind::Member {
                                receiver: expr,
                                name,
                            },
                            span,
                        );
                    }
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Comma-separated expressions between `open` and `close`.
    fn parse_args(
        &mut self,
        open: TokenKind,
        close: TokenKind,
    ) -> Result<chai_ir::ExprRange, ParseError> {
        self.cursor.expect(open)?;
        let mut args = Vec::new();
        while !self.cursor.check(close) {
            args.push(self.parse_expr()?);
            if !self.cursor.eat(TokenKind::Comma) {
                break;
            }
        }
        self.cursor.expect(close)?;
        Ok(self.arena.alloc_expr_list(args))
    }

    fn parse_primary(&mut self) -> Result<ExprId, ParseError> {
        let token = self.cursor.current();
        let kind = match token.kind {
            TokenKind::Number(lit) => ExprKind::Number(lit),
            TokenKind::String(name) => ExprKind::Str(name),
            TokenKind::Char(c) => ExprKind::Char(c),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::Ident(name) => ExprKind::Ident(name),
            TokenKind::LParen => {
                self.cursor.advance();
                let inner = self.parse_expr()?;
                self.cursor.expect(TokenKind::RParen)?;
                return Ok(inner);
            }
            TokenKind::LBracket => return self.parse_collection(),
            TokenKind::Fun => return self.parse_lambda(),
            TokenKind::Var | TokenKind::Auto | TokenKind::Global => return self.parse_decl(),
            TokenKind::Use | TokenKind::EvalFile => {
                self.cursor.advance();
                let path = self.parse_paren_expr()?;
                let span = self.cursor.span_from(token.span);
                return Ok(self.alloc(
                    ExprKind::Use {
                        path,
                        once: token.kind == TokenKind::Use,
                    },
                    span,
                ));
            }
            _ => return Err(ParseError::expected("expression", token)),
        };
        self.cursor.advance();
        Ok(self.alloc(kind, token.span))
    }

    /// `var x`, `var x = e`, `var x := e`, `global x = e`.
    fn parse_decl(&mut self) -> Result<ExprId, ParseError> {
        let keyword = self.cursor.advance();
        let name = self.cursor.expect_ident()?;
        let (kind, init) = match self.cursor.current_kind() {
            TokenKind::ColonEq if keyword.kind != TokenKind::Global => {
                self.cursor.advance();
                (DeclKind::Reference, Some(self.parse_expr()?))
            }
            TokenKind::Eq => {
                self.cursor.advance();
                let kind = if keyword.kind == TokenKind::Global {
                    DeclKind::Global
                } else {
                    DeclKind::Var
                };
                (kind, Some(self.parse_expr()?))
            }
            _ if keyword.kind == TokenKind::Global => (DeclKind::Global, None),
            _ => (DeclKind::Var, None),
        };
        let span = self.cursor.span_from(keyword.span);
        Ok(self.alloc(ExprKind::Decl { name, kind, init }, span))
    }

    /// `fun[captures](params) { body }`
    fn parse_lambda(&mut self) -> Result<ExprId, ParseError> {
        let start = self.cursor.expect(TokenKind::Fun)?.span;
        let mut captures = Vec::new();
        if self.cursor.eat(TokenKind::LBracket) {
            while !self.cursor.check(TokenKind::RBracket) {
                captures.push(self.cursor.expect_ident()?);
                if !self.cursor.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.cursor.expect(TokenKind::RBracket)?;
        }
        let captures = self.arena.alloc_names(captures);
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        let span = self.cursor.span_from(start);
        Ok(self.alloc(
            ExprKind::Lambda {
                captures,
                params,
                body,
            },
            span,
        ))
    }

    /// `[a, b]` vector or `["k": v]` map literal. `[]` is an empty vector.
    fn parse_collection(&mut self) -> Result<ExprId, ParseError> {
        let start = self.cursor.expect(TokenKind::LBracket)?.span;
        if self.cursor.eat(TokenKind::RBracket) {
            let empty = self.arena.alloc_expr_list([]);
            return Ok(self.alloc(ExprKind::Vector(empty), self.cursor.span_from(start)));
        }

        let first = self.parse_expr()?;
        let is_map = self.cursor.check(TokenKind::Colon);
        let mut items = vec![first];
        if is_map {
            self.cursor.advance();
            items.push(self.parse_expr()?);
        }

        while self.cursor.eat(TokenKind::Comma) {
            if self.cursor.check(TokenKind::RBracket) {
                break;
            }
            items.push(self.parse_expr()?);
            if is_map {
                self.cursor.expect(TokenKind::Colon)?;
                items.push(self.parse_expr()?);
            }
        }
        self.cursor.expect(TokenKind::RBracket)?;

        let items = self.arena.alloc_expr_list(items);
        let span: Span = self.cursor.span_from(start);
        let kind = if is_map {
            ExprKind::Map(items)
        } else {
            ExprKind::Vector(items)
        };
        Ok(self.alloc(kind, span))
    }
}
