//! Runtime type descriptors.
//!
//! Every map, converter and member captures a [`TypeDescriptor`] when it is
//! registered. Resolution compares descriptors by [`TypeId`] and consults the
//! primitive/wrapper table and the declared subtype relation.

mod hierarchy;
mod primitive;
mod registry;

pub use hierarchy::{Extends, TypeHierarchy};
pub use registry::TypeRegistry;
pub(crate) use registry::SourceView;

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Name used in messages for types that were never registered.
pub const UNREGISTERED: &str = "<unregistered type>";

/// Identity and capabilities of a type, captured once at registration.
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
    construct: Option<fn() -> Box<dyn Any>>,
    duplicate: Option<fn(&dyn Any) -> Option<Box<dyn Any>>>,
    replace: Option<fn(&mut dyn Any, Box<dyn Any>) -> bool>,
}

impl TypeDescriptor {
    /// Descriptor with no construction or copy capability.
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            construct: None,
            duplicate: None,
            replace: Some(replace_value::<T>),
        }
    }

    /// Descriptor that can create a default `T`.
    pub fn constructible<T: Any + Default>() -> Self {
        Self {
            construct: Some(construct_default::<T>),
            ..Self::of::<T>()
        }
    }

    /// Descriptor that can create and duplicate `T`. Member value types use this.
    pub fn value<T: Any + Default + Clone>() -> Self {
        Self {
            duplicate: Some(duplicate_value::<T>),
            ..Self::constructible::<T>()
        }
    }

    pub(crate) fn unknown(id: TypeId) -> Self {
        Self {
            id,
            name: UNREGISTERED,
            construct: None,
            duplicate: None,
            replace: None,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// `true` for numeric primitives, `bool` and `char` (not their `Option` wrappers).
    pub fn is_primitive(&self) -> bool {
        primitive::lookup(self.id).map_or(false, |pair| pair.primitive == self.id)
    }

    /// `true` when both describe the same type or a primitive and its wrapper.
    pub fn equals_or_wrapper(&self, other: &TypeDescriptor) -> bool {
        primitive::equals_or_wrapper(self.id, other.id)
    }

    pub fn is_constructible(&self) -> bool {
        self.construct.is_some()
    }

    /// A fresh default value, if the type was registered as constructible.
    pub fn construct(&self) -> Option<Box<dyn Any>> {
        self.construct.map(|construct| construct())
    }

    /// A copy of `value`, if the type supports it and `value` has this type.
    pub fn duplicate(&self, value: &dyn Any) -> Option<Box<dyn Any>> {
        self.duplicate.and_then(|duplicate| duplicate(value))
    }

    /// Moves `value` into `slot`. Returns `false` if either has another type.
    pub fn replace(&self, slot: &mut dyn Any, value: Box<dyn Any>) -> bool {
        self.replace.map_or(false, |replace| replace(slot, value))
    }

    /// Keeps the capabilities of both descriptors of the same type.
    pub(crate) fn merge(self, other: TypeDescriptor) -> Self {
        Self {
            name: if self.name == UNREGISTERED { other.name } else { self.name },
            construct: self.construct.or(other.construct),
            duplicate: self.duplicate.or(other.duplicate),
            replace: self.replace.or(other.replace),
            ..self
        }
    }
}

fn construct_default<T: Any + Default>() -> Box<dyn Any> {
    Box::new(T::default())
}

fn duplicate_value<T: Any + Clone>(value: &dyn Any) -> Option<Box<dyn Any>> {
    value
        .downcast_ref::<T>()
        .map(|value| Box::new(value.clone()) as Box<dyn Any>)
}

fn replace_value<T: Any>(slot: &mut dyn Any, value: Box<dyn Any>) -> bool {
    match (slot.downcast_mut::<T>(), value.downcast::<T>()) {
        (Some(slot), Ok(value)) => {
            *slot = *value;
            true
        }
        _ => false,
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
