//! Best-match selection among registered executors.

use std::any::TypeId;
use std::sync::Arc;

use super::MappingExecutor;
use crate::types::TypeRegistry;

/// Which tiers a lookup may fall back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// All four tiers. Used for maps.
    Any,
    /// Only [`Tier::Exact`] and [`Tier::ExactDestination`]. Used for
    /// converters, which create the destination and must not create an
    /// unrelated type.
    StrictDestination,
}

/// Specificity of a match, most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    /// Both declared types equal the requested ones.
    Exact,
    /// The declared destination equals the requested one.
    ExactDestination,
    /// The declared source equals the requested one.
    ExactSource,
    /// Any assignable executor.
    FirstRegistered,
}

impl Tier {
    fn accepts(self, exact_source: bool, exact_destination: bool) -> bool {
        match self {
            Tier::Exact => exact_source && exact_destination,
            Tier::ExactDestination => exact_destination,
            Tier::ExactSource => exact_source,
            Tier::FirstRegistered => true,
        }
    }
}

impl MatchMode {
    fn tiers(self) -> &'static [Tier] {
        match self {
            MatchMode::Any => &[
                Tier::Exact,
                Tier::ExactDestination,
                Tier::ExactSource,
                Tier::FirstRegistered,
            ],
            MatchMode::StrictDestination => &[Tier::Exact, Tier::ExactDestination],
        }
    }
}

/// The selected executor and the tier it matched in.
#[derive(Clone, Copy)]
pub struct Resolution<'a> {
    pub executor: &'a Arc<dyn MappingExecutor>,
    pub tier: Tier,
}

/// Picks the executor best matching `source` and `destination`.
///
/// Candidates are executors whose declared types accept the requested ones
/// (equal, primitive/wrapper equivalent, or a declared base). Within a tier
/// the first registered candidate wins.
pub fn resolve<'a>(
    types: &TypeRegistry,
    source: TypeId,
    destination: TypeId,
    executors: &'a [Arc<dyn MappingExecutor>],
    mode: MatchMode,
) -> Option<Resolution<'a>> {
    let candidates: Vec<(&'a Arc<dyn MappingExecutor>, bool, bool)> = executors
        .iter()
        .filter(|executor| {
            types.is_assignable(source, executor.source_type().id())
                && types.is_assignable(destination, executor.destination_type().id())
        })
        .map(|executor| {
            let exact_source = executor.source_type().equals_or_wrapper(&types.describe(source));
            let exact_destination = executor
                .destination_type()
                .equals_or_wrapper(&types.describe(destination));
            (executor, exact_source, exact_destination)
        })
        .collect();

    mode.tiers().iter().find_map(|&tier| {
        candidates
            .iter()
            .find(|&&(_, exact_source, exact_destination)| tier.accepts(exact_source, exact_destination))
            .map(|&(executor, _, _)| Resolution { executor, tier })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::types::{Extends, TypeDescriptor};
    use crate::Mapper;
    use std::any::Any;

    #[derive(Default)]
    struct Source;
    #[derive(Default)]
    struct InheritedFromSource(Source);
    #[derive(Default)]
    struct Destination;
    #[derive(Default)]
    struct InheritedFromDestination(Destination);

    impl Extends<Source> for InheritedFromSource {
        fn base(&self) -> &Source {
            &self.0
        }
        fn base_mut(&mut self) -> &mut Source {
            &mut self.0
        }
    }

    impl Extends<Destination> for InheritedFromDestination {
        fn base(&self) -> &Destination {
            &self.0
        }
        fn base_mut(&mut self) -> &mut Destination {
            &mut self.0
        }
    }

    struct Fixed {
        source: TypeDescriptor,
        destination: TypeDescriptor,
    }

    impl MappingExecutor for Fixed {
        fn source_type(&self) -> &TypeDescriptor {
            &self.source
        }
        fn destination_type(&self) -> &TypeDescriptor {
            &self.destination
        }
        fn has_destination_builder(&self) -> bool {
            false
        }
        fn execute(&self, _: &Mapper, _: &dyn Any, _: &mut dyn Any) -> Result<()> {
            Ok(())
        }
        fn produce(&self, _: &Mapper, _: &dyn Any) -> Result<Option<Box<dyn Any>>> {
            Ok(None)
        }
    }

    fn fixed<S: Any, D: Any>() -> Arc<dyn MappingExecutor> {
        Arc::new(Fixed {
            source: TypeDescriptor::of::<S>(),
            destination: TypeDescriptor::of::<D>(),
        })
    }

    fn types() -> TypeRegistry {
        let mut types = TypeRegistry::new();
        types.declare_subtype::<InheritedFromSource, Source>();
        types.declare_subtype::<InheritedFromDestination, Destination>();
        types
    }

    // Registered least specific first, so order alone cannot explain the picks.
    // Labels follow the order: "4" is the base/base map, "1" the exact one.
    fn executors() -> Vec<Arc<dyn MappingExecutor>> {
        vec![
            fixed::<Source, Destination>(),
            fixed::<InheritedFromSource, Destination>(),
            fixed::<Source, InheritedFromDestination>(),
            fixed::<InheritedFromSource, InheritedFromDestination>(),
        ]
    }

    fn pick<S: Any, D: Any>(
        executors: &[Arc<dyn MappingExecutor>],
        mode: MatchMode,
    ) -> Option<(&'static str, Tier)> {
        let types = types();
        resolve(&types, TypeId::of::<S>(), TypeId::of::<D>(), executors, mode).map(|resolution| {
            let tag = executors
                .iter()
                .position(|executor| Arc::ptr_eq(executor, resolution.executor))
                .map(|index| ["4", "3", "2", "1"][index])
                .unwrap_or("?");
            (tag, resolution.tier)
        })
    }

    #[test]
    fn test_exact_match_wins() {
        let executors = executors();
        assert_eq!(
            pick::<InheritedFromSource, InheritedFromDestination>(&executors, MatchMode::Any),
            Some(("1", Tier::Exact))
        );
        assert_eq!(
            pick::<Source, Destination>(&executors, MatchMode::Any),
            Some(("4", Tier::Exact))
        );
    }

    #[test]
    fn test_exact_destination_before_exact_source() {
        let executors = vec![
            fixed::<Source, Destination>(),
            fixed::<InheritedFromSource, Destination>(),
            fixed::<Source, InheritedFromDestination>(),
        ];
        let types = types();
        let resolution = resolve(
            &types,
            TypeId::of::<InheritedFromSource>(),
            TypeId::of::<InheritedFromDestination>(),
            &executors,
            MatchMode::Any,
        )
        .unwrap();
        assert_eq!(resolution.tier, Tier::ExactDestination);
        assert!(Arc::ptr_eq(resolution.executor, &executors[2]));
    }

    #[test]
    fn test_exact_source_then_first_registered() {
        let executors = vec![
            fixed::<Source, Destination>(),
            fixed::<InheritedFromSource, Destination>(),
        ];
        let types = types();
        let resolution = resolve(
            &types,
            TypeId::of::<InheritedFromSource>(),
            TypeId::of::<InheritedFromDestination>(),
            &executors,
            MatchMode::Any,
        )
        .unwrap();
        assert_eq!(resolution.tier, Tier::ExactSource);
        assert!(Arc::ptr_eq(resolution.executor, &executors[1]));

        let executors = vec![fixed::<Source, Destination>()];
        let resolution = resolve(
            &types,
            TypeId::of::<InheritedFromSource>(),
            TypeId::of::<InheritedFromDestination>(),
            &executors,
            MatchMode::Any,
        )
        .unwrap();
        assert_eq!(resolution.tier, Tier::FirstRegistered);
    }

    #[test]
    fn test_strict_destination_skips_loose_tiers() {
        let executors = vec![fixed::<InheritedFromSource, Destination>()];
        let types = types();
        assert!(resolve(
            &types,
            TypeId::of::<InheritedFromSource>(),
            TypeId::of::<InheritedFromDestination>(),
            &executors,
            MatchMode::StrictDestination,
        )
        .is_none());
        assert!(resolve(
            &types,
            TypeId::of::<InheritedFromSource>(),
            TypeId::of::<InheritedFromDestination>(),
            &executors,
            MatchMode::Any,
        )
        .is_some());
    }

    #[test]
    fn test_wrapper_counts_as_exact() {
        let executors = vec![fixed::<i32, String>()];
        let types = types();
        let resolution = resolve(
            &types,
            TypeId::of::<Option<i32>>(),
            TypeId::of::<String>(),
            &executors,
            MatchMode::StrictDestination,
        )
        .unwrap();
        assert_eq!(resolution.tier, Tier::Exact);
    }

    #[test]
    fn test_no_candidate() {
        let executors = executors();
        assert_eq!(pick::<Destination, Source>(&executors, MatchMode::Any), None);
        assert_eq!(pick::<String, Destination>(&executors, MatchMode::Any), None);
    }
}
