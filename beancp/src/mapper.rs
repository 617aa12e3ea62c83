//! The [`Mapper`] facade.
//!
//! A mapper is immutable once built and can be shared between threads. Every
//! call resolves the executor from the runtime types of its arguments:
//!
//! - [`Mapper::map`] populates an existing destination, looking up maps, then
//!   converters, then map-any conventions.
//! - [`Mapper::map_new`] creates the destination, looking up converters first,
//!   then maps, then map-any conventions.
//!
//! Nested mapping (`map_inner`, converters built with
//! [`Converter::with_mapper`](crate::Converter::with_mapper), conventions)
//! calls back into the same mapper.

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::convention::BindingSide;
use crate::error::{MappingError, Result};
use crate::executor::Resolution;
use crate::registry::{MappingInfo, Registrations};
use crate::types::{TypeDescriptor, TypeRegistry};

/// Maps values using the maps, converters and conventions registered on a
/// [`crate::MapperBuilder`].
#[derive(Clone)]
pub struct Mapper {
    registrations: Registrations,
}

impl Mapper {
    pub(crate) fn new(registrations: Registrations) -> Self {
        Self { registrations }
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.registrations.types
    }

    /// Populates `destination` from `source`.
    ///
    /// Fails with [`MappingError::NotFound`] when nothing can map the pair.
    pub fn map(&self, source: &dyn Any, destination: &mut dyn Any) -> Result<()> {
        let destination_id = (*destination).type_id();
        if self.map_if_available(source, destination)? {
            return Ok(());
        }
        Err(self.not_found(source.type_id(), &self.types().describe(destination_id)))
    }

    /// Like [`map`](Self::map), but returns `false` and leaves `destination`
    /// untouched when nothing can map the pair.
    pub fn map_if_available(&self, source: &dyn Any, destination: &mut dyn Any) -> Result<bool> {
        let source_id = source.type_id();
        let destination_id = (*destination).type_id();

        let resolution = self
            .registrations
            .find_map(source_id, destination_id)
            .or_else(|| self.registrations.find_converter(source_id, destination_id));
        if let Some(resolution) = resolution {
            self.execute(resolution, source, destination)?;
            return Ok(true);
        }

        self.check_source(source)?;
        for convention in &self.registrations.conventions {
            if convention.try_map(self, source, &mut *destination)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Creates a `D` from `source`.
    pub fn map_new<D: Any + Default>(&self, source: &dyn Any) -> Result<D> {
        let requested = TypeDescriptor::constructible::<D>();
        let value = self.map_to(source, &requested)?;
        Self::unbox(value, &requested)
    }

    /// Like [`map_new`](Self::map_new), returning `None` when nothing can map
    /// the pair.
    pub fn map_new_if_available<D: Any + Default>(&self, source: &dyn Any) -> Result<Option<D>> {
        let requested = TypeDescriptor::constructible::<D>();
        match self.map_to_if_available(source, &requested)? {
            Some(value) => Self::unbox(value, &requested).map(Some),
            None => Ok(None),
        }
    }

    /// Creates a `D` from `source` for destinations without a default value.
    /// The resolved map must construct it with `construct_destination_using`,
    /// or the converter must create it.
    pub fn map_new_with<D: Any>(&self, source: &dyn Any) -> Result<D> {
        let requested = TypeDescriptor::of::<D>();
        let value = self.map_to(source, &requested)?;
        Self::unbox(value, &requested)
    }

    /// Creates a value of the `requested` type from `source`, type-erased.
    ///
    /// Bindings use this for member values. A new destination comes from the
    /// executor when it has a builder, otherwise from the requested type's
    /// default value.
    pub fn map_to(&self, source: &dyn Any, requested: &TypeDescriptor) -> Result<Box<dyn Any>> {
        match self.map_to_if_available(source, requested)? {
            Some(value) => Ok(value),
            None => Err(self.not_found(source.type_id(), requested)),
        }
    }

    pub fn map_to_if_available(
        &self,
        source: &dyn Any,
        requested: &TypeDescriptor,
    ) -> Result<Option<Box<dyn Any>>> {
        let source_id = source.type_id();

        let resolution = self
            .registrations
            .find_converter(source_id, requested.id())
            .or_else(|| self.registrations.find_map(source_id, requested.id()));
        if let Some(resolution) = resolution {
            return self.produce(resolution, source, requested).map(Some);
        }
        self.check_source(source)?;
        self.produce_by_convention(source, requested)
    }

    fn execute(&self, resolution: Resolution<'_>, source: &dyn Any, destination: &mut dyn Any) -> Result<()> {
        let executor = resolution.executor;
        log::trace!(
            "Mapping with {} -> {} ({:?} match)",
            executor.source_type(),
            executor.destination_type(),
            resolution.tier
        );
        let types = self.types();
        let source = types.view_source(source, executor.source_type())?;
        types.with_destination(destination, executor.destination_type(), |declared| {
            executor.execute(self, source.get(), declared)
        })
    }

    fn produce(
        &self,
        resolution: Resolution<'_>,
        source: &dyn Any,
        requested: &TypeDescriptor,
    ) -> Result<Box<dyn Any>> {
        let executor = resolution.executor;
        log::trace!(
            "Producing {} with {} -> {} ({:?} match)",
            requested,
            executor.source_type(),
            executor.destination_type(),
            resolution.tier
        );
        let types = self.types();
        let source = types.view_source(source, executor.source_type())?;
        if let Some(produced) = executor.produce(self, source.get())? {
            return Ok(types.adapt_produced(produced, requested)?);
        }

        let mut destination = self.construct(requested)?;
        types.with_destination(&mut *destination, executor.destination_type(), |declared| {
            executor.execute(self, source.get(), declared)
        })?;
        Ok(destination)
    }

    fn produce_by_convention(
        &self,
        source: &dyn Any,
        requested: &TypeDescriptor,
    ) -> Result<Option<Box<dyn Any>>> {
        let conventions = &self.registrations.conventions;
        if conventions.is_empty() {
            return Ok(None);
        }
        let Ok(mut destination) = self.construct(requested) else {
            let source_type = self.types().describe(source.type_id());
            if conventions
                .iter()
                .any(|convention| convention.can_map(self, &source_type, requested))
            {
                return Err(MappingError::NotConstructible(requested.name()).into());
            }
            return Ok(None);
        };
        for convention in conventions {
            if convention.try_map(self, source, &mut *destination)? {
                return Ok(Some(destination));
            }
        }
        Ok(None)
    }

    fn construct(&self, requested: &TypeDescriptor) -> Result<Box<dyn Any>> {
        requested
            .construct()
            .or_else(|| self.types().describe(requested.id()).construct())
            .ok_or_else(|| MappingError::NotConstructible(requested.name()).into())
    }

    // Executors declared on the wrapper itself receive `None`; the others get
    // `NullParameter` from `view_source`.
    fn check_source(&self, source: &dyn Any) -> Result<()> {
        if self.types().is_null(source) {
            return Err(MappingError::NullParameter("source").into());
        }
        Ok(())
    }

    fn not_found(&self, source: TypeId, destination: &TypeDescriptor) -> crate::Error {
        MappingError::NotFound {
            source_type: self.types().name_of(source).to_string(),
            destination_type: destination.name().to_string(),
        }
        .into()
    }

    fn unbox<D: Any>(value: Box<dyn Any>, requested: &TypeDescriptor) -> Result<D> {
        value.downcast::<D>().map(|value| *value).map_err(|_| {
            MappingError::TypeMismatch {
                expected: requested.name(),
                actual: crate::types::UNREGISTERED,
            }
            .into()
        })
    }
}

impl MappingInfo for Mapper {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::{Converter, Extends, MapperBuilder};

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Source {
        x: String,
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct InheritedFromSource {
        base: Source,
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Destination {
        x: String,
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct InheritedFromDestination {
        base: Destination,
        extra: u32,
    }

    impl Extends<Source> for InheritedFromSource {
        fn base(&self) -> &Source {
            &self.base
        }
        fn base_mut(&mut self) -> &mut Source {
            &mut self.base
        }
    }

    impl Extends<Destination> for InheritedFromDestination {
        fn base(&self) -> &Destination {
            &self.base
        }
        fn base_mut(&mut self) -> &mut Destination {
            &mut self.base
        }
    }

    fn inherited(x: &str) -> InheritedFromSource {
        InheritedFromSource {
            base: Source { x: x.into() },
        }
    }

    fn subtypes() -> MapperBuilder {
        MapperBuilder::new()
            .declare_subtype::<InheritedFromSource, Source>()
            .declare_subtype::<InheritedFromDestination, Destination>()
    }

    // Each map appends its tag; registered from the least specific ("4") to
    // the exact one ("1").
    fn with_maps(builder: MapperBuilder, tags: &[u8]) -> MapperBuilder {
        tags.iter().fold(builder, |builder, tag| {
            let result = match tag {
                4 => builder.add_map::<Source, Destination>(|m| {
                    m.bind(|s| format!("{}4", s.x), |d, v| d.x = v)?;
                    Ok(())
                }),
                3 => builder.add_map::<InheritedFromSource, Destination>(|m| {
                    m.bind(|s| format!("{}3", s.base.x), |d, v| d.x = v)?;
                    Ok(())
                }),
                2 => builder.add_map::<Source, InheritedFromDestination>(|m| {
                    m.bind(|s| format!("{}2", s.x), |d, v| d.base.x = v)?;
                    Ok(())
                }),
                1 => builder.add_map::<InheritedFromSource, InheritedFromDestination>(|m| {
                    m.bind(|s| format!("{}1", s.base.x), |d, v| d.base.x = v)?;
                    Ok(())
                }),
                _ => unreachable!(),
            };
            result.unwrap()
        })
    }

    #[test]
    fn test_exact_map_preferred() {
        let mapper = with_maps(subtypes(), &[4, 3, 2, 1]).build();
        let destination: InheritedFromDestination = mapper.map_new(&inherited("xval")).unwrap();
        assert_eq!(destination.base.x, "xval1");

        let destination: Destination = mapper.map_new(&Source { x: "xval".into() }).unwrap();
        assert_eq!(destination.x, "xval4");
    }

    #[test]
    fn test_fallback_tiers() {
        let mapper = with_maps(subtypes(), &[4, 3, 2]).build();
        let destination: InheritedFromDestination = mapper.map_new(&inherited("xval")).unwrap();
        assert_eq!(destination.base.x, "xval2");

        let mapper = with_maps(subtypes(), &[4, 3]).build();
        let destination: InheritedFromDestination = mapper.map_new(&inherited("xval")).unwrap();
        assert_eq!(destination.base.x, "xval3");

        let mapper = with_maps(subtypes(), &[4]).build();
        let destination: InheritedFromDestination = mapper.map_new(&inherited("xval")).unwrap();
        assert_eq!(destination.base.x, "xval4");
    }

    #[test]
    fn test_map_into_subtype_keeps_extra_state() {
        let mapper = with_maps(subtypes(), &[4]).build();
        let mut destination = InheritedFromDestination {
            extra: 7,
            ..Default::default()
        };
        mapper.map(&inherited("xval"), &mut destination).unwrap();
        assert_eq!(destination.base.x, "xval4");
        assert_eq!(destination.extra, 7);
    }

    #[test]
    fn test_not_found() {
        let mapper = with_maps(subtypes(), &[4]).build();

        let err = mapper.map_new::<Source>(&Destination::default()).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("No suitable mapping found from"));

        assert!(mapper
            .map_new_if_available::<Source>(&Destination::default())
            .unwrap()
            .is_none());

        let mut untouched = Source { x: "keep".into() };
        assert!(!mapper
            .map_if_available(&Destination { x: "new".into() }, &mut untouched)
            .unwrap());
        assert_eq!(untouched.x, "keep");

        let mut destination = Destination::default();
        assert!(mapper
            .map_if_available(&Source { x: "a".into() }, &mut destination)
            .unwrap());
        assert_eq!(destination.x, "a4");
    }

    #[test]
    fn test_builder_with_incompatible_type() {
        let mapper = subtypes()
            .add_map::<Source, Destination>(|m| {
                m.construct_destination_using(Destination::default)?
                    .bind(|s| s.x.clone(), |d, v| d.x = v)?;
                Ok(())
            })
            .unwrap()
            .build();

        let err = mapper
            .map_new::<InheritedFromDestination>(&Source::default())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Mapping(MappingError::IncompatibleDestination { .. })
        ));

        let destination: Destination = mapper.map_new(&Source { x: "ok".into() }).unwrap();
        assert_eq!(destination.x, "ok");
    }

    #[test]
    fn test_converter_requires_exact_destination() {
        let mapper = subtypes()
            .add_converter(Converter::new(|s: &Source| Destination {
                x: s.x.to_uppercase(),
            }))
            .unwrap()
            .build();

        let destination: Destination = mapper.map_new(&inherited("abc")).unwrap();
        assert_eq!(destination.x, "ABC");

        let err = mapper
            .map_new::<InheritedFromDestination>(&Source::default())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_converter_into_existing_destination() {
        let mapper = MapperBuilder::new()
            .add_converter(Converter::new(|value: &i32| value.to_string()))
            .unwrap()
            .build();
        let mut text = String::from("old");
        mapper.map(&42_i32, &mut text).unwrap();
        assert_eq!(text, "42");
    }

    #[test]
    fn test_primitive_and_wrapper_are_interchangeable() {
        let mapper = MapperBuilder::new()
            .add_converter(Converter::new(|value: &i32| value.to_string()))
            .unwrap()
            .add_converter(Converter::with_mapper(|_, text: &String| {
                text.parse::<i64>().map_err(|err| Error::failed(err.to_string()))
            }))
            .unwrap()
            .build();

        assert_eq!(mapper.map_new::<String>(&Some(5_i32)).unwrap(), "5");
        assert_eq!(
            mapper.map_new::<Option<i64>>(&"12".to_string()).unwrap(),
            Some(12)
        );

        let err = mapper.map_new::<String>(&None::<i32>).unwrap_err();
        assert!(matches!(err, Error::Mapping(MappingError::NullParameter("source"))));

        let err = mapper.map_new::<i64>(&"twelve".to_string()).unwrap_err();
        assert!(matches!(err, Error::Mapping(MappingError::Failed(_))));
    }

    #[test]
    fn test_wrapper_converter_receives_none() {
        let mapper = MapperBuilder::new()
            .add_converter(Converter::new(|value: &Option<i32>| match value {
                Some(value) => value.to_string(),
                None => "n/a".to_string(),
            }))
            .unwrap()
            .add_converter(Converter::new(|value: &i32| i64::from(*value)))
            .unwrap()
            .build();

        assert_eq!(mapper.map_new::<String>(&None::<i32>).unwrap(), "n/a");
        assert_eq!(mapper.map_new::<String>(&3_i32).unwrap(), "3");

        let err = mapper.map_new::<i64>(&None::<i32>).unwrap_err();
        assert!(matches!(err, Error::Mapping(MappingError::NullParameter("source"))));

        let err = mapper.map_new::<Destination>(&None::<i32>).unwrap_err();
        assert!(matches!(err, Error::Mapping(MappingError::NullParameter("source"))));
    }

    #[test]
    fn test_map_new_with_builder_only_destination() {
        #[derive(Debug, PartialEq)]
        struct Receipt {
            number: u32,
            text: String,
        }

        let mapper = MapperBuilder::new()
            .add_map::<Source, Receipt>(|m| {
                m.construct_destination_using(|| Receipt {
                    number: 1,
                    text: String::new(),
                })?
                .bind(|s| s.x.clone(), |d, v| d.text = v)?;
                Ok(())
            })
            .unwrap()
            .build();

        let receipt: Receipt = mapper.map_new_with(&Source { x: "paid".into() }).unwrap();
        assert_eq!(
            receipt,
            Receipt {
                number: 1,
                text: "paid".into(),
            }
        );

        let err = mapper.map_new_with::<Receipt>(&Destination::default()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_converter_recursion() {
        #[derive(Debug, Default, PartialEq)]
        struct Pair {
            left: Destination,
            right: Destination,
        }

        let mapper = with_maps(MapperBuilder::new(), &[4])
            .add_converter(Converter::with_mapper(|mapper, sources: &(Source, Source)| {
                Ok(Pair {
                    left: mapper.map_new(&sources.0)?,
                    right: mapper.map_new(&sources.1)?,
                })
            }))
            .unwrap()
            .build();

        let pair: Pair = mapper
            .map_new(&(Source { x: "l".into() }, Source { x: "r".into() }))
            .unwrap();
        assert_eq!(pair.left.x, "l4");
        assert_eq!(pair.right.x, "r4");
    }

    #[test]
    fn test_mapping_info() {
        let mapper = with_maps(subtypes(), &[4])
            .add_converter(Converter::new(|value: &i32| value.to_string()))
            .unwrap()
            .build();

        let source = TypeDescriptor::of::<InheritedFromSource>();
        let destination = TypeDescriptor::of::<Destination>();
        assert!(mapper.is_map_available(&source, &destination));
        assert!(!mapper.is_map_available(&destination, &source));
        assert!(mapper.is_converter_available(
            &TypeDescriptor::of::<Option<i32>>(),
            &TypeDescriptor::of::<String>()
        ));
        assert!(!mapper.is_converter_available(&source, &destination));
        assert!(mapper.members(&source).is_empty());
    }

    #[test]
    fn test_concurrent_calls_do_not_interfere() {
        let mapper = with_maps(subtypes(), &[4, 1]).build();

        std::thread::scope(|scope| {
            for worker in 0..4 {
                let mapper = &mapper;
                scope.spawn(move || {
                    for round in 0..200 {
                        let x = format!("w{worker}r{round}");
                        let destination: InheritedFromDestination = mapper.map_new(&inherited(&x)).unwrap();
                        assert_eq!(destination.base.x, format!("{x}1"));

                        let mut plain = Destination::default();
                        mapper.map(&Source { x: x.clone() }, &mut plain).unwrap();
                        assert_eq!(plain.x, format!("{x}4"));
                    }
                });
            }
        });
    }
}
