use super::*;
use crate::{ExprKind, NumberLit};
use pretty_assertions::assert_eq;

fn int(arena: &mut ExprArena, value: i32, at: u32) -> ExprId {
    arena.alloc_expr(Expr::new(
        ExprKind::Number(NumberLit::Int(value)),
        Span::new(at, at + 1),
    ))
}

#[test]
fn test_alloc_expr() {
    let mut arena = ExprArena::new();

    let id1 = int(&mut arena, 1, 0);
    let id2 = int(&mut arena, 2, 2);

    assert_eq!(id1.index(), 0);
    assert_eq!(id2.index(), 1);
    assert_eq!(arena.expr_count(), 2);
    assert_eq!(arena.span(id2), Span::new(2, 3));
    assert!(matches!(
        arena.get_expr(id1).kind,
        ExprKind::Number(NumberLit::Int(1))
    ));
}

#[test]
fn test_alloc_expr_list() {
    let mut arena = ExprArena::new();
    let a = int(&mut arena, 1, 0);
    let b = int(&mut arena, 2, 2);
    let c = int(&mut arena, 3, 4);

    let first = arena.alloc_expr_list([a, b]);
    let second = arena.alloc_expr_list([c]);
    let empty = arena.alloc_expr_list([]);

    assert_eq!(arena.get_expr_list(first), &[a, b]);
    assert_eq!(arena.get_expr_list(second), &[c]);
    assert!(empty.is_empty());
    assert!(arena.get_expr_list(empty).is_empty());
}

#[test]
fn test_side_tables() {
    let mut arena = ExprArena::new();
    let body = int(&mut arena, 0, 0);

    let params = arena.alloc_params([Param {
        name: Name::from_raw(1),
        ty: None,
        span: Span::new(0, 1),
    }]);
    let names = arena.alloc_names([Name::from_raw(2), Name::from_raw(3)]);
    let catches = arena.alloc_catches([CatchClause {
        binding: Some(Name::from_raw(4)),
        ty: None,
        body,
        span: Span::new(0, 1),
    }]);

    assert_eq!(arena.get_params(params).len(), 1);
    assert_eq!(
        arena.get_names(names),
        &[Name::from_raw(2), Name::from_raw(3)]
    );
    assert_eq!(arena.get_catches(catches)[0].body, body);
}

#[test]
fn test_shared_arena_clone_is_same_arena() {
    let mut arena = ExprArena::new();
    int(&mut arena, 7, 0);
    let shared = SharedArena::new(arena);
    let other = shared.clone();

    assert!(shared.ptr_eq(&other));
    assert_eq!(other.expr_count(), 1);
}
