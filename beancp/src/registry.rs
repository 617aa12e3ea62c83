//! Registered maps, converters and conventions, and the [`MappingInfo`] view
//! conventions use to inspect them.

use std::any::TypeId;
use std::sync::Arc;

use crate::convention::{BindingSide, ConventionExecutor};
use crate::executor::{resolve, MappingExecutor, MatchMode, Resolution};
use crate::types::{TypeDescriptor, TypeRegistry};

/// Read-only queries about what a mapper can do.
pub trait MappingInfo {
    /// A converter can produce `destination` from `source`.
    fn is_converter_available(&self, source: &TypeDescriptor, destination: &TypeDescriptor) -> bool;

    /// A map, or a map-any convention, can populate `destination` from `source`.
    fn is_map_available(&self, source: &TypeDescriptor, destination: &TypeDescriptor) -> bool;

    /// `sub` was declared, directly or not, a subtype of `base`.
    fn is_subtype(&self, sub: &TypeDescriptor, base: &TypeDescriptor) -> bool;

    /// Members declared for `ty`; empty when it has no [`crate::Bean`] metadata.
    fn members(&self, ty: &TypeDescriptor) -> &[Arc<dyn BindingSide>];
}

/// Registration lists, in registration order.
#[derive(Clone, Default)]
pub(crate) struct Registrations {
    pub(crate) types: TypeRegistry,
    pub(crate) maps: Vec<Arc<dyn MappingExecutor>>,
    pub(crate) converters: Vec<Arc<dyn MappingExecutor>>,
    pub(crate) conventions: Vec<ConventionExecutor>,
}

impl Registrations {
    pub(crate) fn find_map(&self, source: TypeId, destination: TypeId) -> Option<Resolution<'_>> {
        resolve(&self.types, source, destination, &self.maps, MatchMode::Any)
    }

    pub(crate) fn find_converter(&self, source: TypeId, destination: TypeId) -> Option<Resolution<'_>> {
        resolve(
            &self.types,
            source,
            destination,
            &self.converters,
            MatchMode::StrictDestination,
        )
    }
}

impl MappingInfo for Registrations {
    fn is_converter_available(&self, source: &TypeDescriptor, destination: &TypeDescriptor) -> bool {
        self.find_converter(source.id(), destination.id()).is_some()
    }

    fn is_map_available(&self, source: &TypeDescriptor, destination: &TypeDescriptor) -> bool {
        self.find_map(source.id(), destination.id()).is_some()
            || self
                .conventions
                .iter()
                .any(|convention| convention.can_map(self, source, destination))
    }

    fn is_subtype(&self, sub: &TypeDescriptor, base: &TypeDescriptor) -> bool {
        self.types.hierarchy().is_subtype(sub.id(), base.id())
    }

    fn members(&self, ty: &TypeDescriptor) -> &[Arc<dyn BindingSide>] {
        self.types.members(ty.id())
    }
}
