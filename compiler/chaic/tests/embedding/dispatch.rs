//! Overload resolution seen from the host.

use crate::common::{engine, error_kind};
use chaic::{EvalErrorKind, Native, ProxyFunction};
use pretty_assertions::assert_eq;

#[test]
fn non_overlapping_typed_overloads_dispatch_exactly() {
    let engine = engine();
    engine.add_fn("kind", |_: i32| "int").unwrap();
    engine.add_fn("kind", |_: f64| "double").unwrap();
    engine.add_fn("kind", |_: String| "string").unwrap();
    engine.add_fn("kind", |_: bool| "bool").unwrap();

    assert_eq!(engine.eval_as::<String>("kind(1)").unwrap(), "int");
    assert_eq!(engine.eval_as::<String>("kind(1.0)").unwrap(), "double");
    assert_eq!(engine.eval_as::<String>("kind(\"s\")").unwrap(), "string");
    assert_eq!(engine.eval_as::<String>("kind(true)").unwrap(), "bool");
}

#[test]
fn identical_constraint_tuples_are_ambiguous() {
    let engine = engine();
    engine.add_fn("twin", |a: i32| a).unwrap();
    engine.add_fn("twin", |a: i32| a + 1).unwrap();
    let err = engine.eval("twin(1)").unwrap_err();
    assert!(matches!(
        error_kind(err),
        EvalErrorKind::AmbiguousCall { arity: 1, candidates: 2, .. }
    ));
}

#[test]
fn native_and_untyped_script_overloads_are_ambiguous() {
    let engine = engine();
    engine.add_fn("add", |a: i32, b: i32| a + b).unwrap();
    engine.eval("def add(x, y) { x - y }").unwrap();
    let err = engine.eval("add(1, 2)").unwrap_err();
    assert!(matches!(error_kind(err), EvalErrorKind::AmbiguousCall { .. }));
}

#[test]
fn exact_parameter_beats_any() {
    let engine = engine();
    engine
        .add(
            chaic::Registration::Function(ProxyFunction::native("pick", |_: chaic::BoxedValue| {
                "any"
            })),
            "pick",
        )
        .unwrap();
    engine.add_fn("pick", |_: i32| "int").unwrap();
    assert_eq!(engine.eval_as::<String>("pick(3)").unwrap(), "int");
    assert_eq!(engine.eval_as::<String>("pick(\"x\")").unwrap(), "any");
}

#[test]
fn mixed_positions_do_not_dominate() {
    let engine = engine();
    engine
        .add_fn("mix", |_: i32, _: chaic::BoxedValue| "left")
        .unwrap();
    engine
        .add_fn("mix", |_: chaic::BoxedValue, _: i32| "right")
        .unwrap();
    assert_eq!(engine.eval_as::<String>("mix(1, \"a\")").unwrap(), "left");
    let err = engine.eval("mix(1, 2)").unwrap_err();
    assert!(matches!(error_kind(err), EvalErrorKind::AmbiguousCall { .. }));
}

#[test]
fn false_guards_are_skipped() {
    let engine = engine();
    engine
        .eval(
            "
            def classify(x) : x < 0 { \"negative\" }
            def classify(x) : x == 0 { \"zero\" }
            def classify(x) : x > 0 { \"positive\" }
            ",
        )
        .unwrap();
    assert_eq!(engine.eval_as::<String>("classify(-4)").unwrap(), "negative");
    assert_eq!(engine.eval_as::<String>("classify(0)").unwrap(), "zero");
    assert_eq!(engine.eval_as::<String>("classify(9)").unwrap(), "positive");
}

#[test]
fn host_guard_filters_candidates() {
    let engine = engine();
    let small = ProxyFunction::native("size_class", |_: i32| "small")
        .with_guard(ProxyFunction::native("small guard", |n: i32| n < 10));
    let large = ProxyFunction::native("size_class", |_: i32| "large")
        .with_guard(ProxyFunction::native("large guard", |n: i32| n >= 10));
    engine
        .add(chaic::Registration::Function(small), "size_class")
        .unwrap();
    engine
        .add(chaic::Registration::Function(large), "size_class")
        .unwrap();
    assert_eq!(engine.eval_as::<String>("size_class(3)").unwrap(), "small");
    assert_eq!(engine.eval_as::<String>("size_class(30)").unwrap(), "large");
}

#[test]
fn no_match_reports_dispatch_error() {
    let engine = engine();
    engine.add_fn("only_int", |n: i32| n).unwrap();
    let err = engine.eval("only_int(\"s\")").unwrap_err();
    assert!(matches!(
        error_kind(err),
        EvalErrorKind::Dispatch { arity: 1, candidates: 1, .. }
    ));
}

#[test]
fn numeric_widening_retry() {
    let engine = engine();
    engine.add_fn("wide", |n: i64| n * 2).unwrap();
    assert_eq!(engine.eval_as::<i64>("wide(21)").unwrap(), 42);
}

#[derive(Clone, Debug)]
struct Counter {
    hits: i32,
}

#[test]
fn mutable_host_parameter_rejects_const_argument() {
    let engine = engine();
    engine.add_type::<Counter>("Counter").unwrap();
    engine
        .add_fn("hit", |c: chaic::Mut<Counter>| c.with(|c| c.hits += 1))
        .unwrap();
    engine
        .add_fn("hits", |c: Native<Counter>| c.0.hits)
        .unwrap();
    engine.add_global(Native(Counter { hits: 0 }), "counter").unwrap();
    engine.add_global_const(Native(Counter { hits: 5 }), "frozen").unwrap();

    engine.eval("hit(counter); hit(counter)").unwrap();
    assert_eq!(engine.eval_as::<i32>("hits(counter)").unwrap(), 2);

    let err = engine.eval("hit(frozen)").unwrap_err();
    assert!(matches!(error_kind(err), EvalErrorKind::Dispatch { .. }));
    assert_eq!(engine.eval_as::<i32>("hits(frozen)").unwrap(), 5);
}

#[test]
fn const_number_does_not_widen_into_mutable_parameter() {
    let engine = engine();
    let mutable_int = chai_boxed::ParamConstraint::Exact {
        tag: chai_boxed::TypeTag::Number(chai_boxed::NumberKind::I32),
        mutable: true,
    };
    let bump = ProxyFunction::native_raw("bump", [mutable_int], |args| {
        args[0].assign(&chaic::BoxedValue::owned(99_i32))?;
        Ok(chaic::BoxedValue::owned("mutated"))
    });
    engine
        .add(chaic::Registration::Function(bump), "bump")
        .unwrap();
    engine.add_global(7_i32, "loose").unwrap();
    engine.add_global_const(5_i32, "frozen").unwrap();

    assert_eq!(engine.eval_as::<String>("bump(loose)").unwrap(), "mutated");
    assert_eq!(engine.eval_as::<i32>("loose").unwrap(), 99);

    let err = engine.eval("bump(frozen)").unwrap_err();
    assert!(matches!(error_kind(err), EvalErrorKind::Dispatch { .. }));
    assert_eq!(engine.eval_as::<i32>("frozen").unwrap(), 5);
}

#[test]
fn failing_script_guard_runs_once_per_call() {
    let engine = engine();
    let calls = engine
        .eval_as::<i32>(
            "
            global n = 0;
            def chk(x) { n += 1; false }
            def f(x) : chk(x) { x }
            try { f(1) } catch(e) {}
            n
            ",
        )
        .unwrap();
    assert_eq!(calls, 1);
}

#[test]
fn failing_host_guard_runs_once_per_call() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let engine = engine();
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let guard = ProxyFunction::native("never", move |_: i32| {
        counted.fetch_add(1, Ordering::Relaxed);
        false
    });
    engine
        .add(
            chaic::Registration::Function(ProxyFunction::native("f", |x: i32| x).with_guard(guard)),
            "f",
        )
        .unwrap();

    let err = engine.eval("f(1)").unwrap_err();
    assert!(matches!(error_kind(err), EvalErrorKind::Dispatch { .. }));
    assert_eq!(calls.load(Ordering::Relaxed), 1);
}

#[test]
fn operator_overloading_on_host_types() {
    let engine = engine();
    engine.add_type::<Counter>("Counter").unwrap();
    engine
        .add_fn("counter", |hits: i32| Native(Counter { hits }))
        .unwrap();
    engine
        .add_fn("+", |a: Native<Counter>, b: Native<Counter>| {
            Native(Counter {
                hits: a.0.hits + b.0.hits,
            })
        })
        .unwrap();
    let Native(sum) = engine
        .eval_as::<Native<Counter>>("counter(2) + counter(3)")
        .unwrap();
    assert_eq!(sum.hits, 5);
}
