use std::any::Any;
use std::sync::Arc;

use super::{downcast_mut, downcast_ref, MappingExecutor};
use crate::error::{MappingError, Result};
use crate::mapper::Mapper;
use crate::types::TypeDescriptor;

type Produce<S, D> = Arc<dyn Fn(&Mapper, &S) -> Result<D> + Send + Sync>;
type Populate<S, D> = Arc<dyn Fn(&Mapper, &S, &mut D) -> Result<()> + Send + Sync>;
type Builder<D> = Arc<dyn Fn() -> D + Send + Sync>;

enum Conversion<S, D> {
    Produce(Produce<S, D>),
    Populate(Populate<S, D>),
}

/// A single transform from `S` to `D`.
///
/// Converters are looked up before maps when a new destination is requested,
/// and only match when their declared destination is exactly the requested
/// type (or its wrapper).
///
/// A `None` primitive wrapper only reaches converters declared on the wrapper
/// itself, e.g. `Converter<Option<i32>, String>`. Converters declared on the
/// primitive fail with [`MappingError::NullParameter`](crate::MappingError::NullParameter).
///
/// ```rust,ignore
/// let to_text = Converter::new(|value: &i32| value.to_string());
/// let scaled = Converter::with_mapper(|mapper, line: &Line| Ok(Scaled { inner: mapper.map_new(&line.inner)? }));
/// ```
pub struct Converter<S, D> {
    source_type: TypeDescriptor,
    destination_type: TypeDescriptor,
    conversion: Conversion<S, D>,
    builder: Option<Builder<D>>,
}

impl<S: Any, D: Any> Converter<S, D> {
    pub fn new(convert: impl Fn(&S) -> D + Send + Sync + 'static) -> Self {
        Self::with_mapper(move |_, source| Ok(convert(source)))
    }

    /// A converter that may map nested values through the calling mapper.
    pub fn with_mapper(convert: impl Fn(&Mapper, &S) -> Result<D> + Send + Sync + 'static) -> Self {
        Self::from_conversion(Conversion::Produce(Arc::new(convert)))
    }

    /// A converter filling a destination created by its builder (see
    /// [`construct_destination_using`](Self::construct_destination_using)),
    /// by `D::default()`, or passed in by the caller.
    pub fn populating(
        populate: impl Fn(&Mapper, &S, &mut D) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self::from_conversion(Conversion::Populate(Arc::new(populate)))
    }

    fn from_conversion(conversion: Conversion<S, D>) -> Self {
        Self {
            source_type: TypeDescriptor::of::<S>(),
            destination_type: TypeDescriptor::of::<D>(),
            conversion,
            builder: None,
        }
    }

    /// Builder for new destinations of a populating converter. Producing
    /// converters create their value themselves and ignore it.
    pub fn construct_destination_using(mut self, builder: impl Fn() -> D + Send + Sync + 'static) -> Self {
        self.builder = Some(Arc::new(builder));
        self
    }

    /// Declares that `D` has a default value, used when no builder is set.
    pub fn with_default_destination(mut self) -> Self
    where
        D: Default,
    {
        self.destination_type = TypeDescriptor::constructible::<D>();
        self
    }

    pub fn convert(&self, caller: &Mapper, source: &S) -> Result<D> {
        match &self.conversion {
            Conversion::Produce(produce) => produce(caller, source),
            Conversion::Populate(populate) => {
                let mut destination = self.new_destination()?;
                populate(caller, source, &mut destination)?;
                Ok(destination)
            }
        }
    }

    fn new_destination(&self) -> Result<D> {
        if let Some(builder) = &self.builder {
            return Ok(builder());
        }
        self.destination_type
            .construct()
            .and_then(|value| value.downcast::<D>().ok())
            .map(|value| *value)
            .ok_or_else(|| MappingError::NotConstructible(self.destination_type.name()).into())
    }
}

impl<S: Any, D: Any> MappingExecutor for Converter<S, D> {
    fn source_type(&self) -> &TypeDescriptor {
        &self.source_type
    }

    fn destination_type(&self) -> &TypeDescriptor {
        &self.destination_type
    }

    fn has_destination_builder(&self) -> bool {
        self.builder.is_some()
    }

    fn execute(&self, caller: &Mapper, source: &dyn Any, destination: &mut dyn Any) -> Result<()> {
        let source = downcast_ref::<S>(source, &self.source_type)?;
        let destination = downcast_mut::<D>(destination, &self.destination_type)?;
        match &self.conversion {
            Conversion::Produce(produce) => *destination = produce(caller, source)?,
            Conversion::Populate(populate) => populate(caller, source, destination)?,
        }
        Ok(())
    }

    fn produce(&self, caller: &Mapper, source: &dyn Any) -> Result<Option<Box<dyn Any>>> {
        let source = downcast_ref::<S>(source, &self.source_type)?;
        match &self.conversion {
            Conversion::Populate(_) if self.builder.is_none() => Ok(None),
            _ => Ok(Some(Box::new(self.convert(caller, source)?) as Box<dyn Any>)),
        }
    }
}

/// A type-erased converter, for registering converters of different types
/// together.
#[derive(Clone)]
pub struct BoxedConverter(pub(crate) Arc<dyn MappingExecutor>);

impl BoxedConverter {
    pub fn source_type(&self) -> &TypeDescriptor {
        self.0.source_type()
    }

    pub fn destination_type(&self) -> &TypeDescriptor {
        self.0.destination_type()
    }
}

impl<S: Any, D: Any> From<Converter<S, D>> for BoxedConverter {
    fn from(converter: Converter<S, D>) -> Self {
        BoxedConverter(Arc::new(converter))
    }
}
