//! Operator evaluation.
//!
//! Numbers, strings, booleans and chars have builtin operators. Anything
//! else (and any builtin type paired with an operator it lacks) dispatches
//! to the function named by the operator symbol, so scripts and hosts can
//! overload `+`, `==`, `[]` and friends for their own types.

use super::{Flow, Interpreter};
use chai_boxed::errors::undefined_variable;
use chai_boxed::{expect_bool, BoxedValue, ControlAction, EvalError, Payload};
use chai_ir::{BinaryOp, ExprId, Span, UnaryOp};
use std::cmp::Ordering;

impl Interpreter {
    pub(super) fn eval_condition(&mut self, cond: ExprId) -> Result<bool, ControlAction> {
        let value = self.eval(cond)?;
        Ok(expect_bool(&value)?)
    }

    pub(super) fn eval_binary(
        &mut self,
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
        span: Span,
    ) -> Flow {
        if op.is_short_circuit() {
            let lhs = self.eval_condition(left)?;
            let result = match (op, lhs) {
                (BinaryOp::And, false) => false,
                (BinaryOp::Or, true) => true,
                _ => self.eval_condition(right)?,
            };
            return Ok(BoxedValue::bool(result));
        }
        let lhs = self.eval(left)?;
        let rhs = self.eval(right)?;
        self.binary_values(op, &lhs, &rhs, span)
    }

    /// Apply `op` to two evaluated operands.
    pub(super) fn binary_values(
        &mut self,
        op: BinaryOp,
        lhs: &BoxedValue,
        rhs: &BoxedValue,
        span: Span,
    ) -> Flow {
        if lhs.is_undef() || rhs.is_undef() {
            return Err(undefined_variable("").into());
        }
        if let Some(result) = builtin_binary(op, lhs, rhs)? {
            return Ok(result);
        }
        let name = self.state.interner.intern(op.as_symbol());
        Ok(self.call_named(name, vec![lhs.clone(), rhs.clone()], Some(span))?)
    }

    pub(super) fn eval_unary(&mut self, op: UnaryOp, operand: ExprId, span: Span) -> Flow {
        let value = self.eval(operand)?;
        if value.is_undef() {
            return Err(undefined_variable("").into());
        }
        match op {
            UnaryOp::Not => {
                if let Some(b) = value.as_bool() {
                    return Ok(BoxedValue::bool(!b));
                }
            }
            UnaryOp::Neg | UnaryOp::BitNot => {
                if let Some(n) = value.as_number() {
                    return Ok(BoxedValue::number(n.unary(op)?));
                }
            }
        }
        let name = self.state.interner.intern(op.as_symbol());
        Ok(self.call_named(name, vec![value], Some(span))?)
    }
}

/// Builtin operator semantics; `None` when the operand types have none.
fn builtin_binary(
    op: BinaryOp,
    lhs: &BoxedValue,
    rhs: &BoxedValue,
) -> Result<Option<BoxedValue>, EvalError> {
    if let (Some(a), Some(b)) = (lhs.as_number(), rhs.as_number()) {
        return Ok(Some(if op.is_comparison() {
            BoxedValue::bool(a.compare_op(op, b)?)
        } else {
            BoxedValue::number(a.arith(op, b)?)
        }));
    }
    if let (Some(a), Some(b)) = (lhs.as_string(), rhs.as_string()) {
        if op == BinaryOp::Add {
            return Ok(Some(BoxedValue::string(a + &b)));
        }
        return Ok(ordering_op(op, a.cmp(&b)).map(BoxedValue::bool));
    }
    if let (Some(a), Some(b)) = (lhs.as_bool(), rhs.as_bool()) {
        return Ok(match op {
            BinaryOp::Eq => Some(BoxedValue::bool(a == b)),
            BinaryOp::NotEq => Some(BoxedValue::bool(a != b)),
            _ => None,
        });
    }
    if let (Some(Payload::Char(a)), Some(Payload::Char(b))) = (lhs.payload(), rhs.payload()) {
        return Ok(ordering_op(op, a.cmp(&b)).map(BoxedValue::bool));
    }
    if matches!(op, BinaryOp::Eq | BinaryOp::NotEq) {
        if let Some(equal) = structural_eq(lhs, rhs) {
            return Ok(Some(BoxedValue::bool(equal == (op == BinaryOp::Eq))));
        }
    }
    Ok(None)
}

fn ordering_op(op: BinaryOp, ordering: Ordering) -> Option<bool> {
    Some(match op {
        BinaryOp::Eq => ordering == Ordering::Equal,
        BinaryOp::NotEq => ordering != Ordering::Equal,
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::LtEq => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::GtEq => ordering != Ordering::Less,
        _ => return None,
    })
}

/// Element-wise equality of vectors and maps of builtin values.
///
/// `None` if either side is not a container, or holds something without
/// builtin equality.
fn structural_eq(lhs: &BoxedValue, rhs: &BoxedValue) -> Option<bool> {
    match (lhs.payload()?, rhs.payload()?) {
        (Payload::Vector(a), Payload::Vector(b)) => {
            if a.len() != b.len() {
                return Some(false);
            }
            all_equal(a.iter().zip(b.iter()))
        }
        (Payload::Map(a), Payload::Map(b)) => {
            if a.len() != b.len() || a.keys().ne(b.keys()) {
                return Some(false);
            }
            all_equal(a.values().zip(b.values()))
        }
        _ => None,
    }
}

fn all_equal<'v>(pairs: impl Iterator<Item = (&'v BoxedValue, &'v BoxedValue)>) -> Option<bool> {
    for (a, b) in pairs {
        if !element_eq(a, b)? {
            return Some(false);
        }
    }
    Some(true)
}

fn element_eq(a: &BoxedValue, b: &BoxedValue) -> Option<bool> {
    match (a.payload()?, b.payload()?) {
        (Payload::Number(x), Payload::Number(y)) => x.compare_op(BinaryOp::Eq, y).ok(),
        (Payload::Str(x), Payload::Str(y)) => Some(x == y),
        (Payload::Bool(x), Payload::Bool(y)) => Some(x == y),
        (Payload::Char(x), Payload::Char(y)) => Some(x == y),
        (Payload::Void, Payload::Void) => Some(true),
        (Payload::Vector(_), Payload::Vector(_)) | (Payload::Map(_), Payload::Map(_)) => {
            structural_eq(a, b)
        }
        _ => Some(false),
    }
}
