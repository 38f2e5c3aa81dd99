//! Type identity and the type registry.
//!
//! Every boxed value has a [`TypeTag`] that can be computed without a
//! registry. The [`TypeRegistry`] maps script-visible type names to tags,
//! records which host types may not be viewed as const, owns script class
//! metadata, and holds user-registered conversions.

use crate::errors::{name_conflict, EvalError};
use crate::number::NumberKind;
use crate::value::BoxedValue;
use bitflags::bitflags;
use rustc_hash::FxHashMap;
use std::any::TypeId;
use std::sync::Arc;

/// Index of a script class in the registry.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ClassId(u32);

impl ClassId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Runtime type identity, compared by value.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeTag {
    Void,
    Bool,
    Char,
    String,
    Vector,
    Map,
    Function,
    Exception,
    Number(NumberKind),
    /// Instance of a script class.
    Class(ClassId),
    /// Registered host type.
    Native(TypeId),
}

impl TypeTag {
    /// Name of a builtin type; `None` for classes and host types, whose
    /// names live in the registry.
    pub fn builtin_name(self) -> Option<&'static str> {
        Some(match self {
            TypeTag::Void => "void",
            TypeTag::Bool => "bool",
            TypeTag::Char => "char",
            TypeTag::String => "string",
            TypeTag::Vector => "Vector",
            TypeTag::Map => "Map",
            TypeTag::Function => "Function",
            TypeTag::Exception => "exception",
            TypeTag::Number(kind) => kind.type_name(),
            TypeTag::Class(_) | TypeTag::Native(_) => return None,
        })
    }

    #[inline]
    pub fn number_kind(self) -> Option<NumberKind> {
        match self {
            TypeTag::Number(kind) => Some(kind),
            _ => None,
        }
    }
}

bitflags! {
    /// Qualifiers of a value's type.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct TypeFlags: u8 {
        const CONST = 1 << 0;
        const UNDEFINED = 1 << 1;
    }
}

/// Type tag plus qualifiers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    pub tag: TypeTag,
    pub flags: TypeFlags,
}

impl TypeInfo {
    pub fn new(tag: TypeTag, flags: TypeFlags) -> Self {
        TypeInfo { tag, flags }
    }

    #[inline]
    pub fn is_const(&self) -> bool {
        self.flags.contains(TypeFlags::CONST)
    }

    #[inline]
    pub fn is_undef(&self) -> bool {
        self.flags.contains(TypeFlags::UNDEFINED)
    }
}

/// Metadata of a registered host type.
#[derive(Clone, Debug)]
pub struct NativeMeta {
    pub name: String,
    /// Values of this type cannot be re-boxed as const references.
    pub mutable_only: bool,
}

/// Metadata of a script class.
#[derive(Clone, Debug)]
pub struct ClassMeta {
    pub name: String,
    /// Declared attributes, in declaration order.
    pub attrs: Vec<String>,
}

/// User-registered conversion between two types.
pub type Conversion = Arc<dyn Fn(&BoxedValue) -> Result<BoxedValue, EvalError> + Send + Sync>;

/// Type name → metadata, per engine.
pub struct TypeRegistry {
    by_name: FxHashMap<String, TypeTag>,
    natives: FxHashMap<TypeId, NativeMeta>,
    classes: Vec<ClassMeta>,
    conversions: FxHashMap<(TypeTag, TypeTag), Conversion>,
}

impl TypeRegistry {
    /// Registry with all builtin types registered.
    pub fn new() -> Self {
        let mut registry = TypeRegistry {
            by_name: FxHashMap::default(),
            natives: FxHashMap::default(),
            classes: Vec::new(),
            conversions: FxHashMap::default(),
        };
        let builtins = [
            TypeTag::Void,
            TypeTag::Bool,
            TypeTag::Char,
            TypeTag::String,
            TypeTag::Vector,
            TypeTag::Map,
            TypeTag::Function,
            TypeTag::Exception,
        ];
        for tag in builtins
            .into_iter()
            .chain(NumberKind::ALL.into_iter().map(TypeTag::Number))
        {
            if let Some(name) = tag.builtin_name() {
                registry.by_name.insert(name.to_string(), tag);
            }
        }
        registry
    }

    /// Look up a type by its script-visible name.
    #[inline]
    pub fn lookup(&self, name: &str) -> Option<TypeTag> {
        self.by_name.get(name).copied()
    }

    /// Script-visible name of a tag.
    pub fn name_of(&self, tag: TypeTag) -> String {
        if let Some(name) = tag.builtin_name() {
            return name.to_string();
        }
        match tag {
            TypeTag::Class(id) => self
                .classes
                .get(id.index())
                .map_or_else(|| "<unknown class>".to_string(), |c| c.name.clone()),
            TypeTag::Native(id) => self
                .natives
                .get(&id)
                .map_or_else(|| "<unregistered type>".to_string(), |n| n.name.clone()),
            _ => String::new(),
        }
    }

    /// Register host type `T` under `name`.
    ///
    /// Re-registering the same type under the same name is a no-op; any
    /// other collision fails with `NameConflict`.
    pub fn register_native<T: 'static>(
        &mut self,
        name: &str,
        mutable_only: bool,
    ) -> Result<TypeTag, EvalError> {
        let tag = TypeTag::Native(TypeId::of::<T>());
        if let Some(existing) = self.natives.get(&TypeId::of::<T>()) {
            if existing.name != name {
                return Err(name_conflict(
                    name,
                    &format!("a second name for host type `{}`", existing.name),
                ));
            }
        }
        self.claim_name(name, tag)?;
        self.natives.insert(
            TypeId::of::<T>(),
            NativeMeta {
                name: name.to_string(),
                mutable_only,
            },
        );
        Ok(tag)
    }

    /// Register a script class, or return the existing class of that name.
    pub fn register_class(&mut self, name: &str) -> Result<ClassId, EvalError> {
        if let Some(tag) = self.lookup(name) {
            return match tag {
                TypeTag::Class(id) => Ok(id),
                other => Err(name_conflict(name, &format!("type `{}`", self.name_of(other)))),
            };
        }
        let id = ClassId(u32::try_from(self.classes.len()).map_err(|_| {
            EvalError::new("too many script classes")
        })?);
        self.classes.push(ClassMeta {
            name: name.to_string(),
            attrs: Vec::new(),
        });
        self.by_name.insert(name.to_string(), TypeTag::Class(id));
        Ok(id)
    }

    /// Declare an attribute on a class. Duplicate declarations are ignored.
    pub fn add_class_attr(&mut self, class: ClassId, attr: &str) {
        if let Some(meta) = self.classes.get_mut(class.index()) {
            if !meta.attrs.iter().any(|a| a == attr) {
                meta.attrs.push(attr.to_string());
            }
        }
    }

    pub fn class(&self, id: ClassId) -> Option<&ClassMeta> {
        self.classes.get(id.index())
    }

    pub fn native(&self, id: TypeId) -> Option<&NativeMeta> {
        self.natives.get(&id)
    }

    /// Whether values of this type refuse const views.
    pub fn is_mutable_only(&self, tag: TypeTag) -> bool {
        match tag {
            TypeTag::Native(id) => self.natives.get(&id).is_some_and(|n| n.mutable_only),
            _ => false,
        }
    }

    /// Register a conversion from `from` to `to`, replacing any previous one.
    pub fn add_conversion(&mut self, from: TypeTag, to: TypeTag, conversion: Conversion) {
        self.conversions.insert((from, to), conversion);
    }

    pub fn conversion(&self, from: TypeTag, to: TypeTag) -> Option<Conversion> {
        self.conversions.get(&(from, to)).cloned()
    }

    fn claim_name(&mut self, name: &str, tag: TypeTag) -> Result<(), EvalError> {
        match self.by_name.get(name) {
            Some(existing) if *existing == tag => Ok(()),
            Some(existing) => Err(name_conflict(
                name,
                &format!("type `{}`", self.name_of(*existing)),
            )),
            None => {
                self.by_name.insert(name.to_string(), tag);
                Ok(())
            }
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.by_name.len())
            .field("classes", &self.classes.len())
            .field("conversions", &self.conversions.len())
            .finish_non_exhaustive()
    }
}
