//! Chai IR - names, spans and the flat AST.
//!
//! This crate holds the data structures shared by the front end
//! (`chai_lexer`, `chai_parse`) and the runtime (`chai_boxed`, `chai_eval`):
//! - `Span` for source locations
//! - `Name` for interned identifiers, produced by `StringInterner`
//! - `ExprArena` / `ExprId` for the arena-allocated AST
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: identifiers and string literals become `Name(u32)`
//! - **Flatten Everything**: no `Box<Expr>`, children are `ExprId(u32)` indices
//!   and lists are ranges into side tables of the arena
//!
//! Float literals are stored as their bit patterns so AST nodes stay `Eq`.

mod arena;
pub mod ast;
mod expr_id;
mod interner;
mod name;
mod span;

pub use arena::{ExprArena, SharedArena};
pub use ast::{
    BinaryOp, CatchClause, DeclKind, Expr, ExprKind, NumberLit, Param, UnaryOp,
};
pub use expr_id::{CatchRange, ExprId, ExprRange, NameRange, ParamRange};
pub use interner::{InternError, SharedInterner, StringInterner};
pub use name::Name;
pub use span::{Span, SpanError};
