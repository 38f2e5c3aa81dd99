//! Names, declarations, assignment, member and index access.

use super::{Flow, Interpreter};
use chai_boxed::errors::{index_out_of_bounds, key_not_found, type_mismatch, undefined_variable};
use chai_boxed::{BoxedValue, EvalError, FunctionValue, Number, Payload};
use chai_ir::{BinaryOp, DeclKind, ExprId, ExprKind, Name, Span};

impl Interpreter {
    /// Locals, then globals, then a function of that name.
    pub(super) fn eval_ident(&mut self, name: Name) -> Flow {
        if let Some(value) = self.env.lookup(name) {
            return Ok(value);
        }
        if self.state.functions.read().contains(name) {
            return Ok(BoxedValue::function(FunctionValue::Overloads(name)));
        }
        Err(undefined_variable(&self.name_str(name)).into())
    }

    pub(super) fn eval_decl(&mut self, name: Name, kind: DeclKind, init: Option<ExprId>) -> Flow {
        let value = match (kind, init) {
            (DeclKind::Reference, Some(init)) => self
                .eval(init)?
                .alias()
                .map_err(|err| self.name_write_error(err, init, None))?,
            (_, Some(init)) => self.eval(init)?.duplicate(),
            (_, None) => BoxedValue::undefined(),
        };
        match kind {
            DeclKind::Global => self.env.define_global(name, value.clone())?,
            DeclKind::Var | DeclKind::Reference => self.env.define(name, value.clone())?,
        }
        Ok(value)
    }

    pub(super) fn eval_assign(&mut self, target: ExprId, value: ExprId) -> Flow {
        let source = value;
        let value = self.eval(value)?;
        let place = self.eval_place(target)?;
        place
            .assign(&value)
            .map_err(|err| self.name_write_error(err, target, Some(source)))?;
        Ok(place)
    }

    pub(super) fn eval_compound_assign(
        &mut self,
        op: BinaryOp,
        target: ExprId,
        value: ExprId,
        span: Span,
    ) -> Flow {
        let place = self.eval_place(target)?;
        let rhs = self.eval(value)?;
        let result = self.binary_values(op, &place, &rhs, span)?;
        place
            .assign(&result)
            .map_err(|err| self.name_write_error(err, target, None))?;
        Ok(place)
    }

    /// Fill in the variable names a failed write was raised without: the
    /// const target, or the undefined source.
    fn name_write_error(
        &self,
        err: EvalError,
        target: ExprId,
        source: Option<ExprId>,
    ) -> EvalError {
        let ident = |id: ExprId| match self.arena.get_expr(id).kind {
            ExprKind::Ident(name) => Some(self.name_str(name)),
            _ => None,
        };
        let err = match ident(target) {
            Some(name) => err.with_const_target(&name),
            None => err,
        };
        match source.and_then(ident) {
            Some(name) => err.with_undefined_name(&name),
            None => err,
        }
    }

    /// Evaluate an assignment target to the handle that gets written.
    ///
    /// Unlike a read, a missing map key or object attribute is created.
    fn eval_place(&mut self, target: ExprId) -> Flow {
        let kind = self.arena.get_expr(target).kind.clone();
        match kind {
            ExprKind::Ident(name) => self
                .env
                .lookup(name)
                .ok_or_else(|| undefined_variable(&self.name_str(name)).into()),
            ExprKind::Index { receiver, index } => {
                let container = self.eval(receiver)?;
                let key = self.eval(index)?;
                let span = self.arena.span(target);
                self.element(&container, &key, true, span)
            }
            ExprKind::Member { receiver, name } => {
                let object = self.eval(receiver)?;
                Ok(self.attr_place(&object, name)?)
            }
            _ => self.eval(target),
        }
    }

    pub(super) fn eval_member(&mut self, receiver: ExprId, name: Name, span: Span) -> Flow {
        let target = self.eval(receiver)?;
        if let Some(attr) = object_attr(&target, &self.name_str(name)) {
            return Ok(attr);
        }
        Ok(self.call_named(name, vec![target], Some(span))?)
    }

    pub(super) fn eval_index(&mut self, receiver: ExprId, index: ExprId, span: Span) -> Flow {
        let container = self.eval(receiver)?;
        let key = self.eval(index)?;
        self.element(&container, &key, false, span)
    }

    /// Element `key` of `container`.
    ///
    /// Vectors take a numeric index, maps a string key, strings yield a
    /// `char`. Other values dispatch to the `[]` function.
    fn element(
        &mut self,
        container: &BoxedValue,
        key: &BoxedValue,
        create: bool,
        span: Span,
    ) -> Flow {
        let index = key.as_number();
        let key_text = key.as_string();
        let key_type = key.type_name_hint();

        let found: Option<Result<Option<BoxedValue>, EvalError>> =
            container.with_payload(|payload| match payload {
                Some(Payload::Vector(items)) => Some(
                    vector_index(index, items.len(), &key_type)
                        .map(|i| items.get(i).cloned()),
                ),
                Some(Payload::Map(entries)) => Some(match &key_text {
                    Some(k) => match entries.get(k) {
                        Some(value) => Ok(Some(value.clone())),
                        None if create => Ok(None),
                        None => Err(key_not_found(k)),
                    },
                    None => Err(type_mismatch("string key", &key_type)),
                }),
                Some(Payload::Str(text)) => Some(
                    vector_index(index, text.chars().count(), &key_type).map(|i| {
                        text.chars()
                            .nth(i)
                            .map(|c| BoxedValue::new(Payload::Char(c)))
                    }),
                ),
                _ => None,
            });

        let element = match found {
            Some(Ok(Some(element))) => element,
            // Missing map key in an assignment target.
            Some(Ok(None)) => match key_text {
                Some(k) => container
                    .with_payload_mut(|payload| match payload {
                        Payload::Map(entries) => entries
                            .entry(k)
                            .or_insert_with(BoxedValue::undefined)
                            .clone(),
                        _ => BoxedValue::undefined(),
                    })?,
                None => return Err(type_mismatch("string key", &key_type).into()),
            },
            Some(Err(err)) => return Err(err.into()),
            None => {
                return Ok(self.call_named(
                    self.names.index,
                    vec![container.clone(), key.clone()],
                    Some(span),
                )?);
            }
        };
        Ok(if container.is_const() {
            element.alias_const()
        } else {
            element
        })
    }

    /// Attribute `name` of a script object, created undefined if missing.
    fn attr_place(&mut self, object: &BoxedValue, name: Name) -> Result<BoxedValue, EvalError> {
        let attr = self.name_str(name);
        if let Some(value) = object_attr(object, &attr) {
            return Ok(value);
        }
        let created = object.with_payload_mut(|payload| match payload {
            Payload::Object(instance) => Some(
                instance
                    .attrs
                    .entry(attr.to_string())
                    .or_insert_with(BoxedValue::undefined)
                    .clone(),
            ),
            _ => None,
        })?;
        created.ok_or_else(|| type_mismatch("object", &object.type_name_hint()))
    }
}

/// Attribute `name` of a script object, const if the object is.
pub(super) fn object_attr(object: &BoxedValue, name: &str) -> Option<BoxedValue> {
    let attr = object.with_payload(|payload| match payload {
        Some(Payload::Object(instance)) => instance.attrs.get(name).cloned(),
        _ => None,
    })?;
    Some(if object.is_const() {
        attr.alias_const()
    } else {
        attr
    })
}

fn vector_index(index: Option<Number>, len: usize, key_type: &str) -> Result<usize, EvalError> {
    let Some(index) = index else {
        return Err(type_mismatch("numeric index", key_type));
    };
    let wide = index.get_as::<i64>();
    usize::try_from(wide)
        .ok()
        .filter(|&i| i < len)
        .ok_or_else(|| index_out_of_bounds(wide, len))
}
