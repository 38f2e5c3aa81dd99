//! The prelude: functions every engine starts with.
//!
//! Operators on builtin types are evaluated directly by the interpreter;
//! these are the named functions scripts expect to find (`print`, `size`,
//! `push_back`, conversions).

use crate::EngineState;
use chai_boxed::errors::{bad_cast, type_mismatch, wrong_arg_count};
use chai_boxed::{
    BoxedValue, EvalError, EvalResult, Number, ParamConstraint, Payload, ProxyFunction, TypeTag,
};

/// Register the prelude into `state`.
pub fn register_prelude(state: &EngineState) {
    let print = state.print.clone();
    state.add_function(
        "print",
        ProxyFunction::native_raw("print", [ParamConstraint::Any], move |args| {
            let [value] = args else {
                return Err(wrong_arg_count(1, args.len()));
            };
            print.println(&value.to_string());
            Ok(BoxedValue::void())
        }),
    );

    let print = state.print.clone();
    state.add_function(
        "puts",
        ProxyFunction::native_raw("puts", [ParamConstraint::Any], move |args| {
            let [value] = args else {
                return Err(wrong_arg_count(1, args.len()));
            };
            print.print(&value.to_string());
            Ok(BoxedValue::void())
        }),
    );

    unary(state, "to_string", |value| Ok(BoxedValue::string(value.to_string())));
    unary(state, "is_undef", |value| Ok(BoxedValue::bool(value.is_undef())));
    unary(state, "clone", |value| Ok(value.duplicate()));
    unary(state, "size", size);
    unary(state, "what", what);
    unary(state, "to_int", |value| {
        to_number(value, "int").map(|n| BoxedValue::number(Number::I32(n.get_as())))
    });
    unary(state, "to_double", |value| {
        to_number(value, "double").map(|n| BoxedValue::number(Number::F64(n.get_as())))
    });

    let types = state.types.clone();
    unary(state, "type_name", move |value| {
        Ok(BoxedValue::string(value.type_name(&types.read())))
    });

    state.add_function(
        "push_back",
        ProxyFunction::native_raw(
            "push_back",
            [
                ParamConstraint::Exact {
                    tag: TypeTag::Vector,
                    mutable: true,
                },
                ParamConstraint::Any,
            ],
            |args| {
                let [vector, item] = args else {
                    return Err(wrong_arg_count(2, args.len()));
                };
                let item = item.duplicate();
                vector.with_payload_mut(|payload| {
                    if let Payload::Vector(items) = payload {
                        items.push(item);
                    }
                })?;
                Ok(BoxedValue::void())
            },
        ),
    );
}

/// Register a one-argument function accepting any value.
fn unary<F>(state: &EngineState, name: &str, f: F)
where
    F: Fn(&BoxedValue) -> EvalResult + Send + Sync + 'static,
{
    state.add_function(
        name,
        ProxyFunction::native_raw(name, [ParamConstraint::Any], move |args| {
            let [value] = args else {
                return Err(wrong_arg_count(1, args.len()));
            };
            f(value)
        }),
    );
}

fn size(value: &BoxedValue) -> EvalResult {
    let len = value.with_payload(|payload| match payload {
        Some(Payload::Vector(items)) => Some(items.len()),
        Some(Payload::Map(entries)) => Some(entries.len()),
        Some(Payload::Str(text)) => Some(text.chars().count()),
        _ => None,
    });
    match len {
        Some(len) => i32::try_from(len)
            .map(|len| BoxedValue::number(Number::I32(len)))
            .map_err(|_| EvalError::new(format!("size {len} does not fit in int"))),
        None => Err(type_mismatch("Vector, Map or string", &value.type_name_hint())),
    }
}

/// Message of an exception; other thrown values print as themselves.
fn what(value: &BoxedValue) -> EvalResult {
    let message = value.with_payload(|payload| match payload {
        Some(Payload::Exception(exception)) => Some(exception.message.clone()),
        _ => None,
    });
    Ok(BoxedValue::string(message.unwrap_or_else(|| value.to_string())))
}

fn to_number(value: &BoxedValue, to: &str) -> Result<Number, EvalError> {
    if let Some(number) = value.as_number() {
        return Ok(number);
    }
    if let Some(b) = value.as_bool() {
        return Ok(Number::I32(i32::from(b)));
    }
    if let Some(text) = value.as_string() {
        let text = text.trim();
        if let Ok(int) = text.parse::<i64>() {
            return Ok(Number::I64(int));
        }
        if let Ok(double) = text.parse::<f64>() {
            return Ok(Number::F64(double));
        }
    }
    Err(bad_cast(&value.type_name_hint(), to))
}

#[cfg(test)]
mod tests;
