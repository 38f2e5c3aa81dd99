#![allow(clippy::unwrap_used, reason = "Tests can panic")]

use super::*;
use chai_boxed::{EvalErrorKind, Native, Number, SharedSlot};
use pretty_assertions::assert_eq;

#[derive(Clone, Debug, PartialEq)]
struct Widget {
    size: i32,
}

fn engine() -> Engine {
    Engine::builder().capture_output().build()
}

fn kind(err: ChaiError) -> EvalErrorKind {
    match err {
        ChaiError::Eval(err) | ChaiError::Parse(err) => err.kind,
        ChaiError::Caught(caught) => panic!("unexpected caught exception: {caught}"),
    }
}

#[test]
fn test_engine_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Engine>();
    assert_send_sync::<FunctionHandle>();
}

#[test]
fn test_add_fn_and_eval_as() {
    let engine = engine();
    engine.add_fn("add", |a: i32, b: i32| a + b).unwrap();
    assert_eq!(engine.eval_as::<i32>("add(1, 2)").unwrap(), 3);
}

#[test]
fn test_definitions_persist_between_evals() {
    let engine = engine();
    engine.eval("var total = 1; def bump(n) { n + 1 }").unwrap();
    assert_eq!(engine.eval_as::<i32>("bump(total)").unwrap(), 2);
}

#[test]
fn test_parse_error_is_reported_as_parse() {
    let err = engine().eval("var = ;").unwrap_err();
    assert!(matches!(err, ChaiError::Parse(_)));
    assert!(matches!(kind(err), EvalErrorKind::Parse));
}

#[test]
fn test_host_type_round_trip() {
    let engine = engine();
    engine.add_type::<Widget>("Widget").unwrap();
    engine
        .add_fn("widget", |size: i32| Native(Widget { size }))
        .unwrap();
    engine
        .add_fn("widget_size", |w: Native<Widget>| w.0.size)
        .unwrap();

    assert_eq!(engine.eval_as::<i32>("widget_size(widget(4))").unwrap(), 4);
    assert_eq!(
        engine.eval_as::<String>("type_name(widget(1))").unwrap(),
        "Widget"
    );
    let Native(widget) = engine.eval_as::<Native<Widget>>("widget(9)").unwrap();
    assert_eq!(widget, Widget { size: 9 });
}

#[test]
fn test_typed_script_parameter_names_host_type() {
    let engine = engine();
    engine.add_type::<Widget>("Widget").unwrap();
    engine.add_fn("widget", |size: i32| Native(Widget { size })).unwrap();
    engine
        .eval("def describe(Widget w) { \"widget\" } def describe(int n) { \"int\" }")
        .unwrap();
    assert_eq!(engine.eval_as::<String>("describe(widget(1))").unwrap(), "widget");
    assert_eq!(engine.eval_as::<String>("describe(1)").unwrap(), "int");
}

#[test]
fn test_name_conflicts() {
    let engine = engine();
    engine.add_global(1, "taken").unwrap();
    let err = engine.add_fn("taken", || 1).unwrap_err();
    assert!(matches!(kind(err), EvalErrorKind::NameConflict { .. }));

    engine.add_type::<Widget>("Widget").unwrap();
    let err = engine.add_global(2, "Widget").unwrap_err();
    assert!(matches!(kind(err), EvalErrorKind::NameConflict { .. }));

    let err = engine.add_type::<Widget>("int").unwrap_err();
    assert!(matches!(kind(err), EvalErrorKind::NameConflict { .. }));

    engine.add_fn("helper", || 1).unwrap();
    let err = engine.add_global(3, "helper").unwrap_err();
    assert!(matches!(kind(err), EvalErrorKind::NameConflict { .. }));

    // Re-registering the same type under the same name is allowed.
    engine.add_type::<Widget>("Widget").unwrap();
}

#[test]
fn test_overloads_accumulate() {
    let engine = engine();
    engine.add_fn("show", |_: i32| "int").unwrap();
    engine.add_fn("show", |_: String| "string").unwrap();
    assert_eq!(engine.eval_as::<String>("show(1)").unwrap(), "int");
    assert_eq!(engine.eval_as::<String>("show(\"a\")").unwrap(), "string");
}

#[test]
fn test_global_const_rejects_writes() {
    let engine = engine();
    engine.add_global_const(3, "LIMIT").unwrap();
    assert_eq!(engine.eval_as::<i32>("LIMIT").unwrap(), 3);
    let err = engine.eval("LIMIT = 4").unwrap_err();
    assert!(matches!(kind(err), EvalErrorKind::ConstViolation { .. }));
    assert_eq!(engine.eval_as::<i32>("LIMIT").unwrap(), 3);
}

#[test]
fn test_global_const_rejects_aliasing_values() {
    let engine = engine();
    let slot = SharedSlot::new(1);
    let err = engine
        .add_global_const(BoxedValue::shared(&slot), "shared")
        .unwrap_err();
    assert!(matches!(kind(err), EvalErrorKind::NonConstValue { .. }));

    let reference = BoxedValue::owned(1).alias().unwrap();
    let err = engine.add_global_const(reference, "alias").unwrap_err();
    assert!(matches!(kind(err), EvalErrorKind::NonConstValue { .. }));
}

#[test]
fn test_global_const_of_mutable_only_type() {
    let engine = engine();
    engine.add_type_mutable_only::<Widget>("Widget").unwrap();
    let err = engine
        .add_global_const(Native(Widget { size: 1 }), "w")
        .unwrap_err();
    let err = err.eval_error().cloned().unwrap();
    assert_eq!(
        err.kind,
        EvalErrorKind::NonConstValue {
            name: "w".to_string()
        }
    );
    assert!(err.notes[0].message.contains("Widget"));
    assert!(engine.eval("w").is_err());
}

#[test]
fn test_shared_global_writes_reach_host() {
    let engine = engine();
    let slot = SharedSlot::new(5);
    engine.add_global(BoxedValue::shared(&slot), "counter").unwrap();
    engine.eval("counter = counter + 2").unwrap();
    assert_eq!(slot.get::<i32>().unwrap(), 7);

    slot.set(10).unwrap();
    assert_eq!(engine.eval_as::<i32>("counter").unwrap(), 10);

    let err = engine.eval("counter = \"text\"").unwrap_err();
    assert!(matches!(kind(err), EvalErrorKind::Cast { .. }));
}

#[test]
fn test_conversions_apply_on_extraction() {
    let engine = engine();
    assert!(engine.eval_as::<String>("7").is_err());

    engine
        .add_conversion::<i32, String, _>(|n| format!("#{n}"))
        .unwrap();
    assert_eq!(engine.eval_as::<String>("7").unwrap(), "#7");

    let value = BoxedValue::number(Number::I32(2));
    assert_eq!(
        engine.boxed_cast_with_conversions::<String>(&value).unwrap(),
        "#2"
    );
    // Strict extraction ignores conversions.
    assert!(chai_boxed::boxed_cast::<String>(&value).is_err());
}

#[test]
fn test_conversion_needs_concrete_types() {
    let err = engine()
        .add_conversion::<BoxedValue, String, _>(|v| v.to_string())
        .unwrap_err();
    assert!(matches!(kind(err), EvalErrorKind::Custom { .. }));
}

#[test]
fn test_function_handles() {
    let engine = engine();
    engine.eval("def square(x) { x * x }").unwrap();
    let square = engine.function("square").unwrap();
    assert_eq!(square.call_as::<i32>((4,)).unwrap(), 16);
    assert_eq!(
        square
            .call(&[BoxedValue::number(Number::F64(1.5))])
            .unwrap()
            .as_number(),
        Some(Number::F64(2.25))
    );

    let lambda = engine.eval("fun(a, b) { a + b }").unwrap();
    let handle = engine.handle(lambda.as_function().unwrap());
    assert_eq!(handle.call_as::<String>(("a", "b")).unwrap(), "ab");

    engine.eval("var stored = fun(x) { x + 1 }").unwrap();
    assert_eq!(engine.function("stored").unwrap().call_as::<i32>((1,)).unwrap(), 2);

    assert!(engine.function("missing").is_err());
}

#[test]
fn test_function_handle_dispatch_errors() {
    let engine = engine();
    engine.eval("def one(int x) { x }").unwrap();
    let err = engine
        .function("one")
        .unwrap()
        .call_with(("s",))
        .unwrap_err();
    assert!(matches!(kind(err), EvalErrorKind::Dispatch { .. }));
}

#[test]
fn test_print_is_captured() {
    let engine = engine();
    engine.eval("print(\"a\"); puts(1); puts(2)").unwrap();
    assert_eq!(engine.print_handler().get_output(), "a\n12");
}

#[test]
fn test_without_prelude() {
    let engine = Engine::builder().without_prelude().capture_output().build();
    assert!(engine.eval("print(1)").is_err());
    assert_eq!(engine.eval_as::<i32>("1 + 1").unwrap(), 2);
}

#[test]
fn test_max_call_depth() {
    let engine = Engine::builder().capture_output().max_call_depth(20).build();
    let err = engine.eval("def down(n) { down(n + 1) } down(0)").unwrap_err();
    assert!(matches!(kind(err), EvalErrorKind::StackOverflow { depth: 20 }));
}

#[test]
fn test_without_modules() {
    let engine = Engine::builder().without_modules().capture_output().build();
    let err = engine.eval("use(\"lib.chai\")").unwrap_err();
    assert!(matches!(kind(err), EvalErrorKind::Module { .. }));
}

#[test]
fn test_custom_parser_is_used() {
    struct Fixed;
    impl ScriptParser for Fixed {
        fn parse(
            &self,
            _source: &str,
            interner: &chai_ir::StringInterner,
        ) -> Result<Program, EvalError> {
            ChaiParser.parse("40 + 2", interner)
        }
    }

    let engine = Engine::builder().parser(Arc::new(Fixed)).build();
    assert_eq!(engine.eval_as::<i32>("anything").unwrap(), 42);
}
