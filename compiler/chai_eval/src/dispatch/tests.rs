#![allow(clippy::unwrap_used, reason = "Tests can panic")]

use super::*;
use chai_boxed::{EvalErrorKind, IntoBoxed, Number, ParamConstraint, ProxyBody};

fn types() -> SharedMutableRegistry<TypeRegistry> {
    SharedMutableRegistry::new(TypeRegistry::new())
}

/// Guards in these tests are native; run them directly.
fn run_guard(guard: &ProxyFunction, args: &[BoxedValue]) -> Result<bool, EvalError> {
    match guard.body() {
        ProxyBody::Native(native) => Ok(native(args)?.as_bool().unwrap_or(false)),
        other => panic!("unexpected guard body {other:?}"),
    }
}

fn tagged(name: &str, tag: i32) -> ProxyFunction {
    ProxyFunction::native_raw(name, [ParamConstraint::Any], move |_| Ok(tag.into_boxed()))
}

fn run(selected: &Selected) -> Option<Number> {
    match selected.function.body() {
        ProxyBody::Native(native) => native(&selected.args).unwrap().as_number(),
        _ => None,
    }
}

fn resolve_simple(
    overloads: &[Arc<ProxyFunction>],
    args: &[BoxedValue],
) -> Result<Selected, EvalError> {
    resolve("f", overloads, args, &types(), run_guard)
}

#[test]
fn test_typed_overloads_dispatch_exactly() {
    let overloads = vec![
        Arc::new(ProxyFunction::native("f", |_: i32| 1_i32)),
        Arc::new(ProxyFunction::native("f", |_: String| 2_i32)),
        Arc::new(ProxyFunction::native("f", |_: f64| 3_i32)),
    ];

    let sel = resolve_simple(&overloads, &[5_i32.into_boxed()]).unwrap();
    assert_eq!(run(&sel), Some(Number::I32(1)));
    let sel = resolve_simple(&overloads, &["s".into_boxed()]).unwrap();
    assert_eq!(run(&sel), Some(Number::I32(2)));
    let sel = resolve_simple(&overloads, &[1.5_f64.into_boxed()]).unwrap();
    assert_eq!(run(&sel), Some(Number::I32(3)));
    assert!(!sel.widened);
}

#[test]
fn test_identical_signatures_are_ambiguous() {
    let overloads = vec![
        Arc::new(ProxyFunction::native("f", |_: i32| 1_i32)),
        Arc::new(ProxyFunction::native("f", |_: i32| 2_i32)),
    ];
    let err = resolve_simple(&overloads, &[5_i32.into_boxed()]).unwrap_err();
    assert!(matches!(
        err.kind,
        EvalErrorKind::AmbiguousCall { arity: 1, candidates: 2, .. }
    ));
}

#[test]
fn test_exact_beats_any() {
    let overloads = vec![
        Arc::new(tagged("f", 0)),
        Arc::new(ProxyFunction::native("f", |_: i32| 1_i32)),
    ];
    let sel = resolve_simple(&overloads, &[5_i32.into_boxed()]).unwrap();
    assert_eq!(run(&sel), Some(Number::I32(1)));

    let sel = resolve_simple(&overloads, &["s".into_boxed()]).unwrap();
    assert_eq!(run(&sel), Some(Number::I32(0)));
}

#[test]
fn test_crossed_partial_matches_are_ambiguous() {
    let int = || ParamConstraint::Exact {
        tag: chai_boxed::TypeTag::Number(chai_boxed::NumberKind::I32),
        mutable: false,
    };
    let overloads = vec![
        Arc::new(ProxyFunction::native_raw(
            "f",
            [int(), ParamConstraint::Any],
            |_| Ok(1_i32.into_boxed()),
        )),
        Arc::new(ProxyFunction::native_raw(
            "f",
            [ParamConstraint::Any, int()],
            |_| Ok(2_i32.into_boxed()),
        )),
    ];
    let err = resolve_simple(&overloads, &[1_i32.into_boxed(), 2_i32.into_boxed()]).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::AmbiguousCall { .. }));
}

#[test]
fn test_false_guard_is_skipped() {
    let positive = ProxyFunction::native("f", |_: i32| 1_i32)
        .with_guard(ProxyFunction::native("guard", |x: i32| x > 0));
    let fallback = ProxyFunction::native("f", |_: i32| 2_i32)
        .with_guard(ProxyFunction::native("guard", |x: i32| x <= 0));
    let overloads = vec![Arc::new(positive), Arc::new(fallback)];

    let sel = resolve_simple(&overloads, &[5_i32.into_boxed()]).unwrap();
    assert_eq!(run(&sel), Some(Number::I32(1)));
    let sel = resolve_simple(&overloads, &[(-5_i32).into_boxed()]).unwrap();
    assert_eq!(run(&sel), Some(Number::I32(2)));
}

#[test]
fn test_guards_do_not_rank() {
    let guarded = ProxyFunction::native("f", |_: i32| 1_i32)
        .with_guard(ProxyFunction::native("guard", |_: i32| true));
    let plain = ProxyFunction::native("f", |_: i32| 2_i32);
    let overloads = vec![Arc::new(guarded), Arc::new(plain)];

    let err = resolve_simple(&overloads, &[1_i32.into_boxed()]).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::AmbiguousCall { .. }));
}

#[test]
fn test_guards_run_only_on_type_survivors() {
    let guard_calls = std::sync::atomic::AtomicUsize::new(0);
    let overloads = vec![Arc::new(
        ProxyFunction::native("f", |_: String| 1_i32)
            .with_guard(ProxyFunction::native("guard", |_: String| true)),
    )];
    let result = resolve("f", &overloads, &[1_i32.into_boxed()], &types(), |g, a| {
        guard_calls.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        run_guard(g, a)
    });
    assert!(result.is_err());
    assert_eq!(guard_calls.into_inner(), 0);
}

#[test]
fn test_widening_retry_converts_arguments() {
    let overloads = vec![Arc::new(ProxyFunction::native("f", |x: i64| x * 2))];
    let sel = resolve_simple(&overloads, &[21_i32.into_boxed()]).unwrap();
    assert!(sel.widened);
    assert_eq!(sel.args[0].as_number(), Some(Number::I64(21)));
    assert_eq!(run(&sel), Some(Number::I64(42)));
}

#[test]
fn test_failed_guard_runs_once() {
    let guard_calls = std::sync::atomic::AtomicUsize::new(0);
    let overloads = vec![Arc::new(
        ProxyFunction::native("f", |x: i32| x)
            .with_guard(ProxyFunction::native("guard", |_: i32| false)),
    )];
    let result = resolve("f", &overloads, &[1_i32.into_boxed()], &types(), |g, a| {
        guard_calls.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        run_guard(g, a)
    });
    assert!(matches!(
        result.unwrap_err().kind,
        EvalErrorKind::Dispatch { arity: 1, candidates: 1, .. }
    ));
    assert_eq!(guard_calls.into_inner(), 1);
}

#[test]
fn test_widening_retry_skips_type_survivors() {
    // The i32 overload's guard rejects; only the i64 overload is widened.
    let guard_calls = std::sync::atomic::AtomicUsize::new(0);
    let overloads = vec![
        Arc::new(
            ProxyFunction::native("f", |_: i32| 1_i64)
                .with_guard(ProxyFunction::native("guard", |_: i32| false)),
        ),
        Arc::new(ProxyFunction::native("f", |x: i64| x * 2)),
    ];
    let sel = resolve("f", &overloads, &[21_i32.into_boxed()], &types(), |g, a| {
        guard_calls.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        run_guard(g, a)
    })
    .unwrap();
    assert!(sel.widened);
    assert_eq!(run(&sel), Some(Number::I64(42)));
    assert_eq!(guard_calls.into_inner(), 1);
}

#[test]
fn test_const_argument_never_fills_mutable_parameter() {
    let mutable_int = ParamConstraint::Exact {
        tag: chai_boxed::TypeTag::Number(chai_boxed::NumberKind::I32),
        mutable: true,
    };
    let overloads = vec![Arc::new(ProxyFunction::native_raw(
        "bump",
        [mutable_int],
        |args| {
            args[0].assign(&99_i32.into_boxed())?;
            Ok(BoxedValue::void())
        },
    ))];
    let frozen = 5_i32.into_boxed().alias_const();
    let err = resolve("bump", &overloads, &[frozen.clone()], &types(), run_guard).unwrap_err();
    assert!(matches!(
        err.kind,
        EvalErrorKind::Dispatch { arity: 1, candidates: 1, .. }
    ));
    assert_eq!(frozen.as_number(), Some(Number::I32(5)));
}

#[test]
fn test_widening_is_not_narrowing() {
    let overloads = vec![Arc::new(ProxyFunction::native("f", |x: i32| x))];
    let err = resolve_simple(&overloads, &[1.5_f64.into_boxed()]).unwrap_err();
    assert!(matches!(
        err.kind,
        EvalErrorKind::Dispatch { arity: 1, candidates: 1, .. }
    ));
}

#[test]
fn test_arity_mismatch_reports_dispatch_error() {
    let overloads = vec![Arc::new(ProxyFunction::native("f", |x: i32| x))];
    let err = resolve_simple(&overloads, &[]).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::Dispatch { arity: 0, .. }));
}

#[test]
fn test_table_appends() {
    let mut table = DispatchTable::new();
    let name = Name::from_raw(7);
    table.add(name, Arc::new(tagged("f", 1)));
    table.add(name, Arc::new(tagged("f", 2)));
    assert_eq!(table.count(name), 2);
    assert!(table.contains(name));
    assert_eq!(table.overloads(Name::from_raw(8)).len(), 0);
}
