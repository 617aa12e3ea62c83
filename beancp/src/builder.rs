//! [`MapperBuilder`] collects maps, converters, conventions and type metadata,
//! then freezes them into a [`Mapper`].
//!
//! Registration errors are returned immediately; a builder that returned an
//! error is consumed, so a mapper is never built from a partial configuration.

use std::any::Any;
use std::sync::Arc;

use crate::convention::{Bean, BindingSide, ConventionExecutor, MapConvention};
use crate::error::{ConfigurationError, Result};
use crate::executor::{BoxedConverter, Converter, MappingExecutor};
use crate::map::{MapConfig, MapDefinition};
use crate::mapper::Mapper;
use crate::registry::{MappingInfo, Registrations};
use crate::types::{Extends, TypeDescriptor};

/// Builds a [`Mapper`].
///
/// ```rust,ignore
/// let mapper = MapperBuilder::new()
///     .add_bean::<Customer>()
///     .add_bean::<CustomerDto>()
///     .add_converters(commons::number_converters())?
///     .add_map::<Customer, CustomerDto>(|m| {
///         m.use_convention(NameBasedMapConvention::new())?
///             .bind_constant("v2".to_string(), |d, v| d.schema = v)?;
///         Ok(())
///     })?
///     .build();
/// ```
#[derive(Clone, Default)]
pub struct MapperBuilder {
    registrations: Registrations,
}

impl MapperBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a map from `S` to `D` configured by `setup`.
    ///
    /// `setup` runs once, now. Maps, converters and beans registered before
    /// this call are visible to conventions used inside it.
    pub fn add_map<S: Any, D: Any>(
        mut self,
        setup: impl FnOnce(&mut MapConfig<'_, S, D>) -> Result<()>,
    ) -> Result<Self> {
        let mut definition = MapDefinition::<S, D>::new();
        ensure_unique(
            &self.registrations.maps,
            definition.source_type(),
            definition.destination_type(),
        )?;
        definition.configure(&self.registrations, setup)?;

        log::debug!(
            "Registered map {} -> {}: {:?}",
            definition.source_type(),
            definition.destination_type(),
            definition.statements()
        );
        self.remember(&definition);
        self.registrations.maps.push(Arc::new(definition));
        Ok(self)
    }

    pub fn add_converter<S: Any, D: Any>(self, converter: Converter<S, D>) -> Result<Self> {
        self.add_boxed_converter(converter.into())
    }

    /// Registers converters of different types, in order. Stops at the first
    /// duplicate.
    pub fn add_converters(self, converters: impl IntoIterator<Item = BoxedConverter>) -> Result<Self> {
        converters
            .into_iter()
            .try_fold(self, |builder, converter| builder.add_boxed_converter(converter))
    }

    fn add_boxed_converter(mut self, converter: BoxedConverter) -> Result<Self> {
        let executor = converter.0;
        ensure_unique(
            &self.registrations.converters,
            executor.source_type(),
            executor.destination_type(),
        )?;
        log::debug!(
            "Registered converter {} -> {}",
            executor.source_type(),
            executor.destination_type()
        );
        self.remember(executor.as_ref());
        self.registrations.converters.push(executor);
        Ok(self)
    }

    /// Registers a convention used for any pair no map or converter handles.
    /// Conventions are tried in registration order.
    pub fn add_map_any_by_convention(mut self, convention: impl MapConvention + 'static) -> Self {
        self.registrations
            .conventions
            .push(ConventionExecutor::new(convention));
        log::debug!(
            "Registered map-any convention #{}",
            self.registrations.conventions.len()
        );
        self
    }

    /// Makes the members of `T` visible to conventions.
    pub fn add_bean<T: Bean>(mut self) -> Self {
        let members: Vec<Arc<dyn BindingSide>> = T::members()
            .into_iter()
            .map(|member| Arc::new(member) as Arc<dyn BindingSide>)
            .collect();
        log::debug!(
            "Registered bean {} with {} members",
            std::any::type_name::<T>(),
            members.len()
        );
        self.registrations
            .types
            .set_members(TypeDescriptor::of::<T>(), members);
        self
    }

    /// Declares `S` a subtype of `B`: executors declared for `B` accept `S`.
    pub fn declare_subtype<S: Extends<B>, B: Any>(mut self) -> Self {
        if self.registrations.types.declare_subtype::<S, B>() {
            log::debug!(
                "Declared {} as a subtype of {}",
                std::any::type_name::<S>(),
                std::any::type_name::<B>()
            );
        }
        self
    }

    pub fn build(self) -> Mapper {
        log::debug!(
            "Mapper built with {} maps, {} converters and {} conventions",
            self.registrations.maps.len(),
            self.registrations.converters.len(),
            self.registrations.conventions.len()
        );
        Mapper::new(self.registrations)
    }

    fn remember(&mut self, executor: &dyn MappingExecutor) {
        self.registrations.types.remember(*executor.source_type());
        self.registrations.types.remember(*executor.destination_type());
    }
}

impl MappingInfo for MapperBuilder {
    fn is_converter_available(&self, source: &TypeDescriptor, destination: &TypeDescriptor) -> bool {
        self.registrations.is_converter_available(source, destination)
    }

    fn is_map_available(&self, source: &TypeDescriptor, destination: &TypeDescriptor) -> bool {
        self.registrations.is_map_available(source, destination)
    }

    fn is_subtype(&self, sub: &TypeDescriptor, base: &TypeDescriptor) -> bool {
        self.registrations.is_subtype(sub, base)
    }

    fn members(&self, ty: &TypeDescriptor) -> &[Arc<dyn BindingSide>] {
        self.registrations.members(ty)
    }
}

fn ensure_unique(
    executors: &[Arc<dyn MappingExecutor>],
    source: &TypeDescriptor,
    destination: &TypeDescriptor,
) -> Result<()> {
    let taken = executors.iter().any(|executor| {
        executor.source_type() == source && executor.destination_type() == destination
    });
    if taken {
        return Err(ConfigurationError::DuplicateMapping {
            source_type: source.name(),
            destination_type: destination.name(),
        }
        .into());
    }
    Ok(())
}
