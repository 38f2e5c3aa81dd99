//! Arena allocation for the flat AST.
//!
//! - Contiguous storage for all expressions of one script
//! - Child references use `ExprId` indices
//! - Lists (arguments, block bodies, parameters) are ranges into side tables

use crate::{
    CatchClause, CatchRange, Expr, ExprId, ExprRange, Name, NameRange, Param, ParamRange, Span,
};
use std::fmt;
use std::sync::Arc;

/// Contiguous storage for all expressions parsed from one source.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ExprArena {
    /// All expressions (indexed by `ExprId`).
    exprs: Vec<Expr>,

    /// Flattened expression lists (call args, block statements, literals).
    expr_lists: Vec<ExprId>,

    /// All parameters.
    params: Vec<Param>,

    /// Lambda capture lists.
    names: Vec<Name>,

    /// `catch` clauses.
    catches: Vec<CatchClause>,
}

impl ExprArena {
    /// Create a new empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with estimated capacity based on source size.
    /// Heuristic: ~1 expression per 8 bytes of source.
    pub fn with_capacity(source_len: usize) -> Self {
        let estimated_exprs = source_len / 8;
        ExprArena {
            exprs: Vec::with_capacity(estimated_exprs),
            expr_lists: Vec::with_capacity(estimated_exprs / 2),
            params: Vec::with_capacity(estimated_exprs / 16),
            names: Vec::new(),
            catches: Vec::new(),
        }
    }

    // ===== Expressions =====

    /// Allocate expression, return ID.
    #[inline]
    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(to_u32(self.exprs.len()));
        self.exprs.push(expr);
        id
    }

    /// Get expression by ID.
    ///
    /// # Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    #[track_caller]
    pub fn get_expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    /// Span of an expression.
    #[inline]
    #[track_caller]
    pub fn span(&self, id: ExprId) -> Span {
        self.exprs[id.index()].span
    }

    /// Get number of expressions.
    #[inline]
    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    // ===== Expression lists =====

    /// Allocate expression list, return range.
    pub fn alloc_expr_list(&mut self, exprs: impl IntoIterator<Item = ExprId>) -> ExprRange {
        let start = to_u32(self.expr_lists.len());
        self.expr_lists.extend(exprs);
        ExprRange::new(start, to_u32(self.expr_lists.len()) - start)
    }

    /// Get expression list by range.
    #[inline]
    pub fn get_expr_list(&self, range: ExprRange) -> &[ExprId] {
        &self.expr_lists[range.to_range()]
    }

    // ===== Parameters =====

    /// Allocate parameter list, return range.
    pub fn alloc_params(&mut self, params: impl IntoIterator<Item = Param>) -> ParamRange {
        let start = to_u32(self.params.len());
        self.params.extend(params);
        ParamRange::new(start, to_u32(self.params.len()) - start)
    }

    /// Get parameters by range.
    #[inline]
    pub fn get_params(&self, range: ParamRange) -> &[Param] {
        &self.params[range.to_range()]
    }

    // ===== Names =====

    pub fn alloc_names(&mut self, names: impl IntoIterator<Item = Name>) -> NameRange {
        let start = to_u32(self.names.len());
        self.names.extend(names);
        NameRange::new(start, to_u32(self.names.len()) - start)
    }

    #[inline]
    pub fn get_names(&self, range: NameRange) -> &[Name] {
        &self.names[range.to_range()]
    }

    // ===== Catch clauses =====

    pub fn alloc_catches(&mut self, catches: impl IntoIterator<Item = CatchClause>) -> CatchRange {
        let start = to_u32(self.catches.len());
        self.catches.extend(catches);
        CatchRange::new(start, to_u32(self.catches.len()) - start)
    }

    #[inline]
    pub fn get_catches(&self, range: CatchRange) -> &[CatchClause] {
        &self.catches[range.to_range()]
    }
}

/// Arena indices are `u32`.
#[inline]
#[expect(
    clippy::cast_possible_truncation,
    reason = "arena tables never exceed u32::MAX entries"
)]
fn to_u32(len: usize) -> u32 {
    len as u32
}

impl fmt::Debug for ExprArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExprArena")
            .field("exprs", &self.exprs.len())
            .field("expr_lists", &self.expr_lists.len())
            .field("params", &self.params.len())
            .field("names", &self.names.len())
            .field("catches", &self.catches.len())
            .finish()
    }
}

/// Shared expression arena.
///
/// Script functions carry the arena their body lives in, so a function
/// defined by one `eval` (or loaded by `use`) stays callable after the
/// evaluation that defined it has finished.
#[derive(Clone)]
pub struct SharedArena(Arc<ExprArena>);

impl SharedArena {
    /// Create a new shared arena from an `ExprArena`.
    pub fn new(arena: ExprArena) -> Self {
        SharedArena(Arc::new(arena))
    }

    /// Whether two handles point at the same arena.
    pub fn ptr_eq(&self, other: &SharedArena) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::ops::Deref for SharedArena {
    type Target = ExprArena;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for SharedArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedArena({:?})", &*self.0)
    }
}

#[cfg(test)]
mod tests;
