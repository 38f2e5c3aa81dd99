#![allow(clippy::unwrap_used, reason = "Tests can panic")]

use super::*;
use crate::{buffer_handler, Interpreter};
use pretty_assertions::assert_eq;

fn prelude() -> Interpreter {
    let mut state = EngineState::new();
    state.print = buffer_handler();
    register_prelude(&state);
    Interpreter::new(state)
}

fn call(interp: &mut Interpreter, name: &str, args: Vec<BoxedValue>) -> EvalResult {
    interp.call(name, args)
}

#[test]
fn test_size_of_containers() {
    let mut interp = prelude();
    let vector = BoxedValue::vector(vec![BoxedValue::bool(true), BoxedValue::bool(false)]);
    let size = call(&mut interp, "size", vec![vector]).unwrap();
    assert_eq!(size.as_number(), Some(Number::I32(2)));

    let text = call(&mut interp, "size", vec![BoxedValue::string("héllo")]).unwrap();
    assert_eq!(text.as_number(), Some(Number::I32(5)));

    let err = call(&mut interp, "size", vec![BoxedValue::bool(true)]).unwrap_err();
    assert!(matches!(
        err.kind,
        chai_boxed::EvalErrorKind::TypeMismatch { .. }
    ));
}

#[test]
fn test_push_back_copies_item() {
    let mut interp = prelude();
    let vector = BoxedValue::vector(Vec::new());
    let item = BoxedValue::string("a");
    call(&mut interp, "push_back", vec![vector.clone(), item.clone()]).unwrap();
    item.assign(&BoxedValue::string("b")).unwrap();
    assert_eq!(vector.to_string(), "[\"a\"]");
}

#[test]
fn test_push_back_rejects_const_vector() {
    let mut interp = prelude();
    let vector = BoxedValue::vector(Vec::new()).alias_const();
    let err = call(&mut interp, "push_back", vec![vector, BoxedValue::bool(true)]).unwrap_err();
    assert!(matches!(err.kind, chai_boxed::EvalErrorKind::Dispatch { .. }));
}

#[test]
fn test_numeric_conversions() {
    let mut interp = prelude();
    let int = call(&mut interp, "to_int", vec![BoxedValue::string(" 42 ")]).unwrap();
    assert_eq!(int.as_number(), Some(Number::I32(42)));

    let double = call(&mut interp, "to_double", vec![BoxedValue::number(Number::I32(3))]).unwrap();
    assert_eq!(double.as_number(), Some(Number::F64(3.0)));

    let err = call(&mut interp, "to_int", vec![BoxedValue::string("x")]).unwrap_err();
    assert!(matches!(err.kind, chai_boxed::EvalErrorKind::Cast { .. }));
}

#[test]
fn test_type_name_and_is_undef() {
    let mut interp = prelude();
    let name = call(&mut interp, "type_name", vec![BoxedValue::number(Number::F64(1.0))]).unwrap();
    assert_eq!(name.as_string().as_deref(), Some("double"));

    let undef = call(&mut interp, "is_undef", vec![BoxedValue::undefined()]).unwrap();
    assert_eq!(undef.as_bool(), Some(true));
}

#[test]
fn test_clone_is_independent() {
    let mut interp = prelude();
    let original = BoxedValue::string("a");
    let copy = call(&mut interp, "clone", vec![original.clone()]).unwrap();
    copy.assign(&BoxedValue::string("b")).unwrap();
    assert_eq!(original.as_string().as_deref(), Some("a"));
}

#[test]
fn test_what_of_plain_value() {
    let mut interp = prelude();
    let message = call(&mut interp, "what", vec![BoxedValue::string("oops")]).unwrap();
    assert_eq!(message.as_string().as_deref(), Some("oops"));
}
