//! Mapping executors and their resolution.
//!
//! A [`MappingExecutor`] is anything registered for a declared
//! source/destination pair: a [`crate::map::MapDefinition`] or a [`Converter`].

mod converter;
mod selector;

pub use converter::{BoxedConverter, Converter};
pub use selector::{resolve, MatchMode, Resolution, Tier};

use std::any::Any;

use crate::error::{MappingError, MappingResult, Result};
use crate::mapper::Mapper;
use crate::types::{TypeDescriptor, UNREGISTERED};

/// A registered way to go from a declared source type to a declared
/// destination type.
///
/// The mapper views the actual source and destination as the declared types
/// before calling [`execute`](Self::execute) or [`produce`](Self::produce), so
/// implementations can downcast to them directly.
pub trait MappingExecutor: Send + Sync {
    fn source_type(&self) -> &TypeDescriptor;

    fn destination_type(&self) -> &TypeDescriptor;

    fn has_destination_builder(&self) -> bool;

    /// Populates an existing destination.
    fn execute(&self, caller: &Mapper, source: &dyn Any, destination: &mut dyn Any) -> Result<()>;

    /// Creates a destination when the executor knows how to, either through its
    /// builder or by converting. `None` asks the caller to construct one and
    /// call [`execute`](Self::execute).
    fn produce(&self, caller: &Mapper, source: &dyn Any) -> Result<Option<Box<dyn Any>>>;
}

pub(crate) fn downcast_ref<'a, T: Any>(value: &'a dyn Any, declared: &TypeDescriptor) -> MappingResult<&'a T> {
    value
        .downcast_ref::<T>()
        .ok_or(MappingError::TypeMismatch {
            expected: declared.name(),
            actual: UNREGISTERED,
        })
}

pub(crate) fn downcast_mut<'a, T: Any>(
    value: &'a mut dyn Any,
    declared: &TypeDescriptor,
) -> MappingResult<&'a mut T> {
    value
        .downcast_mut::<T>()
        .ok_or(MappingError::TypeMismatch {
            expected: declared.name(),
            actual: UNREGISTERED,
        })
}
