//! Exception specifications and native errors.

use crate::common::{engine, error_kind};
use chaic::{ChaiError, EvalErrorKind, ExceptionSpec, Native};
use pretty_assertions::assert_eq;

#[derive(Clone, Debug, PartialEq)]
struct Overheated {
    celsius: i32,
}

#[derive(Debug, thiserror::Error)]
#[error("sensor {0} offline")]
struct SensorOffline(u32);

fn spec() -> ExceptionSpec {
    ExceptionSpec::new()
        .with::<i32>()
        .with::<String>()
        .with::<f64>()
        .with::<Native<Overheated>>()
}

fn engine_with_sensor() -> chaic::Engine {
    let engine = engine();
    engine.add_type::<Overheated>("Overheated").unwrap();
    engine
        .add_fn("overheated", |celsius: i32| Native(Overheated { celsius }))
        .unwrap();
    engine
        .add_fn("read_sensor", |id: i32| -> Result<i32, SensorOffline> {
            if id == 0 {
                Ok(21)
            } else {
                Err(SensorOffline(id.unsigned_abs()))
            }
        })
        .unwrap();
    engine
}

#[test]
fn listed_types_are_caught_typed() {
    let engine = engine_with_sensor();
    let spec = spec();

    let Err(ChaiError::Caught(caught)) = engine.eval_with_spec("throw(\"boom\")", &spec) else {
        panic!("string throw was not caught");
    };
    assert_eq!(caught.index, 1);
    assert_eq!(caught.downcast::<String>().unwrap(), "boom");

    let Err(ChaiError::Caught(caught)) = engine.eval_with_spec("throw(overheated(90))", &spec)
    else {
        panic!("host object throw was not caught");
    };
    assert_eq!(caught.index, 3);
    let Native(hot) = caught.downcast::<Native<Overheated>>().unwrap();
    assert_eq!(hot, Overheated { celsius: 90 });
}

#[test]
fn unlisted_types_surface_as_generic_throw() {
    let engine = engine_with_sensor();
    let err = engine.eval_with_spec("throw([1, 2])", &spec()).unwrap_err();
    assert_eq!(err.thrown().unwrap().to_string(), "[1, 2]");
    assert!(matches!(error_kind(err), EvalErrorKind::ScriptThrow));
}

#[test]
fn plain_eval_never_catches() {
    let engine = engine_with_sensor();
    let err = engine.eval("throw(1)").unwrap_err();
    assert!(matches!(&err, ChaiError::Eval(e) if e.is_script_throw()));
}

#[test]
fn successful_eval_ignores_spec() {
    let engine = engine_with_sensor();
    let value = engine.eval_with_spec("read_sensor(0)", &spec()).unwrap();
    assert_eq!(value.to_string(), "21");
}

#[test]
fn script_catch_handles_throw_before_spec() {
    let engine = engine_with_sensor();
    let value = engine
        .eval_with_spec("var r = 0; try { throw(5) } catch (e) { r = e + 1 } r", &spec())
        .unwrap();
    assert_eq!(value.to_string(), "6");
}

#[test]
fn native_error_propagates_with_source() {
    let engine = engine_with_sensor();
    let err = engine.eval_with_spec("read_sensor(7)", &spec()).unwrap_err();
    let eval = match err {
        ChaiError::Eval(eval) => eval,
        other => panic!("native error was rethrown as {other:?}"),
    };
    assert!(matches!(eval.kind, EvalErrorKind::Native { .. }));
    assert_eq!(eval.message, "sensor 7 offline");
    let source = std::error::Error::source(&eval).unwrap();
    assert!(source.downcast_ref::<SensorOffline>().is_some());
}

#[test]
fn native_error_is_catchable_in_script() {
    let engine = engine_with_sensor();
    let message = engine
        .eval_as::<String>("var m = \"\"; try { read_sensor(3) } catch (e) { m = what(e) } m")
        .unwrap();
    assert_eq!(message, "sensor 3 offline");
}

#[test]
fn typed_script_catch_of_host_type() {
    let engine = engine_with_sensor();
    let value = engine
        .eval_as::<String>(
            "
            var caught = \"none\"
            try { throw(overheated(80)) }
            catch (int e) { caught = \"int\" }
            catch (Overheated e) { caught = \"overheated\" }
            caught
            ",
        )
        .unwrap();
    assert_eq!(value, "overheated");
}
