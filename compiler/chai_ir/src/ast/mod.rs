//! Flat AST types using arena allocation.
//!
//! - `expr`: expression nodes (`Expr`, `ExprKind`) and their side-table items
//! - `operators`: binary and unary operators

mod expr;
mod operators;

pub use expr::{CatchClause, DeclKind, Expr, ExprKind, NumberLit, Param};
pub use operators::{BinaryOp, UnaryOp};
