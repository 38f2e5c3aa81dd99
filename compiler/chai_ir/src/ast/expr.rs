//! Expression nodes.
//!
//! Chai has no statement/expression split: every node yields a value, and a
//! block's value is the value of its last node.

use super::operators::{BinaryOp, UnaryOp};
use crate::{CatchRange, ExprId, ExprRange, Name, NameRange, ParamRange, Span};

/// Expression node.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

/// Numeric literal, already narrowed to the type its suffix selects.
///
/// Floats are stored as bit patterns so the AST stays `Eq + Hash`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum NumberLit {
    Int(i32),
    Long(i64),
    Unsigned(u32),
    UnsignedLong(u64),
    Float(u32),
    Double(u64),
}

impl NumberLit {
    /// Build a `double` literal.
    pub fn double(value: f64) -> Self {
        NumberLit::Double(value.to_bits())
    }

    /// Build a `float` literal.
    pub fn float(value: f32) -> Self {
        NumberLit::Float(value.to_bits())
    }
}

/// How a `var`-like declaration binds its name.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DeclKind {
    /// `var x` / `auto x`: binds an undefined value or a copy of the initializer.
    Var,
    /// `var x := y`: binds an alias of the initializer's storage.
    Reference,
    /// `global x`: binds into the root scope.
    Global,
}

/// Function or lambda parameter, optionally typed (`int x`).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Param {
    pub name: Name,
    pub ty: Option<Name>,
    pub span: Span,
}

/// One `catch` clause of a `try` expression.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct CatchClause {
    /// Binding for the caught value (`catch (e)`), if any.
    pub binding: Option<Name>,
    /// Type filter (`catch (int e)`), if any.
    pub ty: Option<Name>,
    pub body: ExprId,
    pub span: Span,
}

/// Expression kinds.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum ExprKind {
    // Literals
    Number(NumberLit),
    Bool(bool),
    Str(Name),
    Char(char),
    /// `[a, b, c]`
    Vector(ExprRange),
    /// `["k": v, ...]`, stored as alternating key/value expressions.
    Map(ExprRange),

    // Names and bindings
    Ident(Name),
    Decl {
        name: Name,
        kind: DeclKind,
        init: Option<ExprId>,
    },
    Assign {
        target: ExprId,
        value: ExprId,
    },
    /// `target op= value`
    CompoundAssign {
        op: BinaryOp,
        target: ExprId,
        value: ExprId,
    },

    // Operators
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    Ternary {
        cond: ExprId,
        then_branch: ExprId,
        else_branch: ExprId,
    },

    // Calls and access
    Call {
        callee: ExprId,
        args: ExprRange,
    },
    MethodCall {
        receiver: ExprId,
        method: Name,
        args: ExprRange,
    },
    Member {
        receiver: ExprId,
        name: Name,
    },
    Index {
        receiver: ExprId,
        index: ExprId,
    },

    // Definitions
    /// `fun[captures](params) { body }`
    Lambda {
        captures: NameRange,
        params: ParamRange,
        body: ExprId,
    },
    /// `def [Class::]name(params) [: guard] { body }`
    Def {
        name: Name,
        class: Option<Name>,
        params: ParamRange,
        guard: Option<ExprId>,
        body: ExprId,
    },
    /// `class Name { attr ...; def ... }`
    Class {
        name: Name,
        body: ExprRange,
    },
    /// `attr [Class::]name`
    Attr {
        class: Option<Name>,
        name: Name,
    },

    // Control flow
    /// `{ ... }` introduces a scope.
    Block(ExprRange),
    /// Top-level statement list; evaluated in the caller's scope.
    Script(ExprRange),
    If {
        cond: ExprId,
        then_branch: ExprId,
        else_branch: Option<ExprId>,
    },
    While {
        cond: ExprId,
        body: ExprId,
    },
    For {
        init: Option<ExprId>,
        cond: Option<ExprId>,
        step: Option<ExprId>,
        body: ExprId,
    },
    Break,
    Continue,
    Return(Option<ExprId>),
    Throw(ExprId),
    Try {
        body: ExprId,
        catches: CatchRange,
        finally: Option<ExprId>,
    },

    /// `use(path)` (`once == true`) or `eval_file(path)`.
    Use {
        path: ExprId,
        once: bool,
    },
}
