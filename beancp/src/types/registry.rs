use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use super::hierarchy::{Extends, TypeHierarchy};
use super::primitive;
use super::{TypeDescriptor, UNREGISTERED};
use crate::convention::BindingSide;
use crate::error::{MappingError, MappingResult, Result};

/// A source value viewed as the type an executor declares.
pub(crate) enum SourceView<'a> {
    Borrowed(&'a dyn Any),
    Owned(Box<dyn Any>),
}

impl SourceView<'_> {
    pub(crate) fn get(&self) -> &dyn Any {
        match self {
            SourceView::Borrowed(value) => *value,
            SourceView::Owned(value) => &**value,
        }
    }
}

/// Everything the mapper knows about types: descriptors seen at registration,
/// declared subtypes and bean members.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    known: HashMap<TypeId, TypeDescriptor>,
    hierarchy: TypeHierarchy,
    members: HashMap<TypeId, Arc<[Arc<dyn BindingSide>]>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remember(&mut self, ty: TypeDescriptor) {
        self.known
            .entry(ty.id())
            .and_modify(|known| *known = known.merge(ty))
            .or_insert(ty);
    }

    /// Descriptor for `id`, or a bare one naming it as unregistered.
    pub fn describe(&self, id: TypeId) -> TypeDescriptor {
        self.known
            .get(&id)
            .copied()
            .unwrap_or_else(|| TypeDescriptor::unknown(id))
    }

    pub fn name_of(&self, id: TypeId) -> &'static str {
        match self.known.get(&id) {
            Some(ty) => ty.name(),
            None => primitive::lookup(id)
                .filter(|pair| pair.primitive == id)
                .map_or(UNREGISTERED, |pair| pair.name),
        }
    }

    pub fn hierarchy(&self) -> &TypeHierarchy {
        &self.hierarchy
    }

    pub fn declare_subtype<S: Extends<B>, B: Any>(&mut self) -> bool {
        self.remember(TypeDescriptor::of::<S>());
        self.remember(TypeDescriptor::of::<B>());
        self.hierarchy.declare::<S, B>()
    }

    pub fn set_members(&mut self, ty: TypeDescriptor, members: Vec<Arc<dyn BindingSide>>) {
        for member in &members {
            self.remember(*member.value_type());
        }
        self.remember(ty);
        self.members.insert(ty.id(), members.into());
    }

    /// Members registered for `id`; empty when the type has no metadata.
    pub fn members(&self, id: TypeId) -> &[Arc<dyn BindingSide>] {
        self.members
            .get(&id)
            .map(|members| &members[..])
            .unwrap_or(&[])
    }

    /// `actual` can be used where `declared` is expected.
    pub fn is_assignable(&self, actual: TypeId, declared: TypeId) -> bool {
        primitive::equals_or_wrapper(actual, declared) || self.hierarchy.is_subtype(actual, declared)
    }

    /// `true` for an empty `Option` of a primitive.
    pub fn is_null(&self, value: &dyn Any) -> bool {
        let id = value.type_id();
        primitive::lookup(id).map_or(false, |pair| {
            pair.wrapper == id && pair.convert(value, pair.primitive).is_none()
        })
    }

    pub(crate) fn view_source<'a>(
        &self,
        value: &'a dyn Any,
        declared: &TypeDescriptor,
    ) -> MappingResult<SourceView<'a>> {
        let actual = value.type_id();
        if actual == declared.id() {
            return Ok(SourceView::Borrowed(value));
        }
        if let Some(pair) = primitive::pair_between(actual, declared.id()) {
            return pair
                .convert(value, declared.id())
                .map(SourceView::Owned)
                .ok_or(MappingError::NullParameter("source"));
        }
        self.hierarchy
            .upcast(value, declared.id())
            .map(SourceView::Borrowed)
            .ok_or_else(|| self.mismatch(actual, declared))
    }

    /// Runs `f` on `destination` viewed as `declared`. Primitive/wrapper
    /// destinations are converted to a temporary and written back afterwards.
    pub(crate) fn with_destination<R>(
        &self,
        destination: &mut dyn Any,
        declared: &TypeDescriptor,
        f: impl FnOnce(&mut dyn Any) -> Result<R>,
    ) -> Result<R> {
        let actual = (*destination).type_id();
        if actual == declared.id() {
            return f(destination);
        }
        if let Some(pair) = primitive::pair_between(actual, declared.id()) {
            let mut temporary = pair
                .convert(&*destination, declared.id())
                .unwrap_or_else(|| pair.zero());
            let result = f(&mut *temporary)?;
            pair.assign(destination, &*temporary);
            return Ok(result);
        }
        match self.hierarchy.upcast_mut(destination, declared.id()) {
            Some(base) => f(base),
            None => Err(self.mismatch(actual, declared).into()),
        }
    }

    /// Checks a produced destination against the requested type.
    pub(crate) fn adapt_produced(
        &self,
        value: Box<dyn Any>,
        requested: &TypeDescriptor,
    ) -> MappingResult<Box<dyn Any>> {
        let actual = (*value).type_id();
        if actual == requested.id() {
            return Ok(value);
        }
        primitive::pair_between(actual, requested.id())
            .and_then(|pair| pair.convert(&*value, requested.id()))
            .ok_or(MappingError::IncompatibleDestination {
                requested: requested.name(),
                actual: self.name_of(actual),
            })
    }

    fn mismatch(&self, actual: TypeId, declared: &TypeDescriptor) -> MappingError {
        MappingError::TypeMismatch {
            expected: declared.name(),
            actual: self.name_of(actual),
        }
    }
}
