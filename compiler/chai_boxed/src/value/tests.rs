#![allow(clippy::unwrap_used, reason = "Tests can panic")]

use super::*;
use crate::errors::EvalErrorKind;
use pretty_assertions::assert_eq;

fn int(v: i32) -> BoxedValue {
    BoxedValue::number(Number::I32(v))
}

#[derive(Clone, Debug, PartialEq)]
struct Counter(u32);

#[test]
fn test_clone_aliases_duplicate_copies() {
    let original = int(1);
    let alias = original.clone();
    let copy = original.duplicate();

    original.assign(&int(2)).unwrap();

    assert_eq!(alias.as_number(), Some(Number::I32(2)));
    assert_eq!(copy.as_number(), Some(Number::I32(1)));
    assert!(alias.same_storage(&original));
    assert!(!copy.same_storage(&original));
}

#[test]
fn test_reference_alias_sees_writes() {
    let k = int(5);
    let l = k.alias().unwrap();
    assert_eq!(l.mode(), OwnershipMode::Reference);

    l.assign(&int(9)).unwrap();
    assert_eq!(k.as_number(), Some(Number::I32(9)));
}

#[test]
fn test_reference_alias_keeps_type() {
    let k = int(5);
    let l = k.alias().unwrap();

    // numbers convert to the target kind
    l.assign(&BoxedValue::number(Number::F64(2.7))).unwrap();
    assert_eq!(k.as_number(), Some(Number::I32(2)));

    let err = l.assign(&BoxedValue::string("x")).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::Cast { .. }));
    assert_eq!(k.as_number(), Some(Number::I32(2)));
}

#[test]
fn test_owned_assign_changes_type() {
    let v = int(1);
    v.assign(&BoxedValue::string("now a string")).unwrap();
    assert_eq!(v.as_string().as_deref(), Some("now a string"));
}

#[test]
fn test_const_rejects_writes() {
    let value = int(1);
    let view = value.alias_const();

    let err = view.assign(&int(2)).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::ConstViolation { .. }));
    assert!(view.with_payload_mut(|_| ()).is_err());
    assert!(matches!(
        view.alias().unwrap_err().kind,
        EvalErrorKind::ConstViolation { .. }
    ));
    assert_eq!(value.as_number(), Some(Number::I32(1)));
}

#[test]
fn test_self_assignment() {
    let v = int(3);
    v.assign(&v.clone()).unwrap();
    assert_eq!(v.as_number(), Some(Number::I32(3)));
}

#[test]
fn test_undefined_is_shared_between_aliases() {
    let declared = BoxedValue::undefined();
    let alias = declared.alias().unwrap();
    assert!(declared.is_undef());
    assert!(declared.type_info().is_undef());

    alias.assign(&BoxedValue::bool(true)).unwrap();
    assert!(!declared.is_undef());
    assert_eq!(declared.as_bool(), Some(true));
}

#[test]
fn test_assigning_undefined_fails() {
    let target = int(1);
    let err = target.assign(&BoxedValue::undefined()).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::UndefinedVariable { .. }));
}

#[test]
fn test_duplicate_is_deep() {
    let inner = int(1);
    let vector = BoxedValue::vector(vec![inner.clone()]);
    let copy = vector.duplicate();

    inner.assign(&int(7)).unwrap();

    let copied_first = copy.with_payload(|p| match p {
        Some(Payload::Vector(items)) => items[0].as_number(),
        _ => None,
    });
    assert_eq!(copied_first, Some(Number::I32(1)));
    assert_eq!(vector.to_string(), "[7]");
}

#[test]
fn test_rebox_modes() {
    let mut registry = TypeRegistry::new();
    registry.register_native::<Counter>("Counter", true).unwrap();

    let counter = BoxedValue::new(Payload::Native(NativeBox::new(Counter(0))));
    let err = counter
        .rebox(OwnershipMode::ConstReference, &registry)
        .unwrap_err();
    assert!(matches!(
        err.kind,
        EvalErrorKind::Cast {
            cast: crate::errors::CastKind::TypeError,
            ..
        }
    ));
    assert!(counter.const_cast().is_const());

    let shared = counter.rebox(OwnershipMode::Shared, &registry).unwrap();
    assert!(shared.same_storage(&counter));

    let owned = counter.rebox(OwnershipMode::OwnedCopy, &registry).unwrap();
    assert!(!owned.same_storage(&counter));

    let text = BoxedValue::string("s");
    assert!(text
        .rebox(OwnershipMode::ConstReference, &registry)
        .unwrap()
        .is_const());
}

#[test]
fn test_shared_slot_round_trip() {
    let slot = SharedSlot::new(10_i32);
    let script_side = slot.boxed();
    assert_eq!(script_side.mode(), OwnershipMode::Shared);

    script_side.assign(&int(11)).unwrap();
    assert_eq!(slot.get::<i32>().unwrap(), 11);

    slot.set(12_i32).unwrap();
    assert_eq!(script_side.as_number(), Some(Number::I32(12)));

    assert!(slot.set("text").is_err());
}

#[test]
fn test_native_access() {
    let value = BoxedValue::new(Payload::Native(NativeBox::new(Counter(1))));
    value
        .with_native_mut(|c: &mut Counter| c.0 += 1)
        .unwrap()
        .unwrap();
    assert_eq!(value.with_native(|c: &Counter| c.0), Some(2));
    assert_eq!(value.with_native(|s: &String| s.len()), None);
    assert!(value.type_name_hint().ends_with("Counter"));
}

#[test]
fn test_display() {
    let mut entries = BTreeMap::new();
    entries.insert("a".to_string(), int(1));
    entries.insert("b".to_string(), BoxedValue::string("x"));

    assert_eq!(BoxedValue::string("plain").to_string(), "plain");
    assert_eq!(
        BoxedValue::vector(vec![int(1), BoxedValue::string("two")]).to_string(),
        "[1, \"two\"]"
    );
    assert_eq!(BoxedValue::map(entries).to_string(), "[\"a\": 1, \"b\": \"x\"]");
    assert_eq!(BoxedValue::void().to_string(), "");
    assert_eq!(BoxedValue::undefined().to_string(), "<undefined>");
}

#[test]
fn test_expect_bool() {
    assert!(expect_bool(&BoxedValue::bool(true)).unwrap());
    assert!(matches!(
        expect_bool(&int(1)).unwrap_err().kind,
        EvalErrorKind::TypeMismatch { .. }
    ));
}
