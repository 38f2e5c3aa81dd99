//! Host objects stored inside boxed values.

use std::any::Any;
use std::fmt;

/// A host value that scripts can hold, copy and pass back to native
/// functions.
///
/// Implemented for every `Clone + Send + Sync + 'static` type.
pub trait NativeObject: Any + Send + Sync {
    fn clone_box(&self) -> Box<dyn NativeObject>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Rust type name, for diagnostics only.
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Clone + Send + Sync> NativeObject for T {
    fn clone_box(&self) -> Box<dyn NativeObject> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Owned, clonable host object.
pub struct NativeBox(Box<dyn NativeObject>);

impl NativeBox {
    pub fn new<T: Any + Clone + Send + Sync>(value: T) -> Self {
        NativeBox(Box::new(value))
    }

    /// `TypeId` of the contained value (not of the box).
    #[inline]
    pub fn type_id(&self) -> std::any::TypeId {
        self.0.as_any().type_id()
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref()
    }

    #[inline]
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.0.as_any_mut().downcast_mut()
    }
}

impl Clone for NativeBox {
    fn clone(&self) -> Self {
        NativeBox(self.0.clone_box())
    }
}

impl fmt::Debug for NativeBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeBox({})", self.type_name())
    }
}
