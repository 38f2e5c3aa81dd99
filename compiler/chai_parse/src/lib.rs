//! Parser for Chai scripts.
//!
//! A recursive descent parser producing the flat arena AST of `chai_ir`.
//! Binary operators use precedence climbing over
//! [`BinaryOp::precedence`](chai_ir::BinaryOp::precedence). Statement
//! terminators (`;`) are optional; the parser decides statement boundaries
//! from the grammar.
//!
//! The first syntax error aborts the parse.

mod cursor;
mod error;
mod grammar;

use chai_ir::{ExprId, SharedArena, StringInterner};

pub use error::ParseError;

/// Output of a successful parse.
#[derive(Clone, Debug)]
pub struct ParsedScript {
    pub arena: SharedArena,
    /// An `ExprKind::Script` node holding the top-level statements.
    pub root: ExprId,
}

/// Lex and parse `source`, interning names into `interner`.
#[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
pub fn parse(source: &str, interner: &StringInterner) -> Result<ParsedScript, ParseError> {
    let tokens = chai_lexer::lex(source, interner);
    let mut parser = grammar::Parser::new(&tokens, source.len());
    let root = parser.parse_script()?;
    let arena = parser.into_arena();
    tracing::debug!(exprs = arena.expr_count(), "parsed script");
    Ok(ParsedScript {
        arena: SharedArena::new(arena),
        root,
    })
}
