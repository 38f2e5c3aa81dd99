//! Ownership modes and extraction across the host boundary.

use crate::common::{engine, error_kind};
use chaic::{boxed_cast, BoxedValue, EvalErrorKind, Number, OwnershipMode, SharedSlot};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

#[test]
fn reference_declaration_aliases_source() {
    let engine = engine();
    assert_eq!(engine.eval_as::<i32>("var k = 5; var l := k; l = 9; k").unwrap(), 9);
}

#[test]
fn plain_declaration_copies() {
    let engine = engine();
    assert_eq!(engine.eval_as::<i32>("var a = 1; var b = a; b = 2; a").unwrap(), 1);
    assert_eq!(
        engine
            .eval_as::<i32>("var v = [1, 2]; var w = v; w[0] = 7; v[0]")
            .unwrap(),
        1
    );
}

#[test]
fn numeric_extraction_converts() {
    let engine = engine();
    assert_eq!(engine.eval_as::<i32>("2.75").unwrap(), 2);
    assert_eq!(engine.eval_as::<f64>("3").unwrap(), 3.0);
    assert_eq!(engine.eval_as::<u8>("258").unwrap(), 2);

    let err = engine.eval_as::<String>("12").unwrap_err();
    assert!(matches!(error_kind(err), EvalErrorKind::Cast { .. }));
}

#[test]
fn containers_extract_elementwise() {
    let engine = engine();
    assert_eq!(
        engine.eval_as::<Vec<i32>>("[1, 2, 3]").unwrap(),
        vec![1, 2, 3]
    );
    let map = engine
        .eval_as::<BTreeMap<String, String>>("[\"a\": \"x\", \"b\": \"y\"]")
        .unwrap();
    assert_eq!(map.get("b").map(String::as_str), Some("y"));
}

#[test]
fn host_shared_slot_is_visible_both_ways() {
    let engine = engine();
    let slot = SharedSlot::new(vec![1, 2]);
    engine.add_global(BoxedValue::shared(&slot), "items").unwrap();
    engine.eval("push_back(items, 3)").unwrap();
    assert_eq!(slot.get::<Vec<i32>>().unwrap(), vec![1, 2, 3]);
}

#[test]
fn owned_global_shares_storage_with_host_handle() {
    let engine = engine();
    let value = BoxedValue::owned(1);
    engine.add_global(value.clone(), "n").unwrap();
    engine.eval("n = 2").unwrap();
    // An owned value handed to the engine is the engine's storage.
    assert_eq!(boxed_cast::<i32>(&value).unwrap(), 2);

    let copy = value.rebox(OwnershipMode::OwnedCopy, &engine.state().types.read()).unwrap();
    engine.eval("n = 3").unwrap();
    assert_eq!(copy.as_number(), Some(Number::I32(2)));
}

#[test]
fn undefined_variable_declared_then_assigned_through_alias() {
    let engine = engine();
    assert_eq!(
        engine
            .eval_as::<String>("var u; var r := u; r = \"set\"; u")
            .unwrap(),
        "set"
    );
}

#[test]
fn extraction_of_undefined_is_an_error() {
    let engine = engine();
    let err = engine.eval_as::<i32>("var nothing; nothing").unwrap_err();
    assert!(matches!(
        error_kind(err),
        EvalErrorKind::UndefinedVariable { .. }
    ));
}
