use std::any::Any;
use std::sync::Arc;

use super::option::{should_be_mapped, substitute, BindingOption};
use super::step::{Action, ExecutionContext, Statement, Step};
use crate::convention::{ConventionExecutor, MapConvention};
use crate::error::{ConfigurationError, Result};
use crate::mapper::Mapper;
use crate::registry::MappingInfo;
use crate::types::TypeDescriptor;

/// Getter of an existing nested destination value, for in-place mapping.
pub type ExistingGetter<D, DI> = fn(&mut D) -> Option<&mut DI>;

fn action<S, D, F>(f: F) -> Action<S, D>
where
    F: Fn(&mut ExecutionContext<'_, S, D>) -> Result<()> + Send + Sync + 'static,
{
    Box::new(f)
}

/// Records the statements of one map.
///
/// Statements must be called in this order, each group being optional:
///
/// 1. [`construct_destination_using`](Self::construct_destination_using) (once)
/// 2. [`before_map`](Self::before_map)
/// 3. [`use_convention`](Self::use_convention) (once)
/// 4. [`bind`](Self::bind), [`bind_constant`](Self::bind_constant), [`map_inner`](Self::map_inner), in any mix
/// 5. [`after_map`](Self::after_map)
///
/// Calling a statement out of order fails the registration.
///
/// ```rust,ignore
/// builder.add_map::<Person, PersonDto>(|m| {
///     m.bind(|p| p.name.clone(), |d, v| d.full_name = v)?
///         .bind_constant("v1".to_string(), |d, v| d.version = v)?
///         .map_inner(|p| p.address.as_ref(), |d, v| d.address = v)?;
///     Ok(())
/// })?;
/// ```
pub struct MapConfig<'a, S, D> {
    info: &'a dyn MappingInfo,
    source_type: TypeDescriptor,
    destination_type: TypeDescriptor,
    steps: Vec<Step<S, D>>,
}

impl<'a, S: Any, D: Any> MapConfig<'a, S, D> {
    pub(crate) fn new(
        info: &'a dyn MappingInfo,
        source_type: TypeDescriptor,
        destination_type: TypeDescriptor,
    ) -> Self {
        Self {
            info,
            source_type,
            destination_type,
            steps: Vec::new(),
        }
    }

    pub(crate) fn into_steps(self) -> Vec<Step<S, D>> {
        self.steps
    }

    fn record(&self, statement: Statement) -> Result<()> {
        if statement.is_unique() && self.steps.iter().any(|step| step.statement() == statement) {
            return Err(ConfigurationError::DuplicateStatement(statement).into());
        }
        if let Some(previous) = self.steps.last().map(Step::statement) {
            if statement.rank() < previous.rank() {
                return Err(ConfigurationError::StatementOrder {
                    statement,
                    previous,
                }
                .into());
            }
        }
        Ok(())
    }

    fn push(&mut self, step: Step<S, D>) -> Result<&mut Self> {
        self.record(step.statement())?;
        self.steps.push(step);
        Ok(self)
    }

    /// Creates new destinations with `builder` instead of `D::default()`.
    pub fn construct_destination_using(
        &mut self,
        builder: impl Fn() -> D + Send + Sync + 'static,
    ) -> Result<&mut Self> {
        self.push(Step::ConstructDestination(Arc::new(builder)))
    }

    /// Runs `hook` before any binding.
    pub fn before_map(
        &mut self,
        hook: impl Fn(&Mapper, &S, &mut D) -> Result<()> + Send + Sync + 'static,
    ) -> Result<&mut Self> {
        self.push(Step::BeforeMap(Box::new(hook)))
    }

    /// Derives bindings from `convention`. They are computed now, against `S`
    /// and `D`, and reused on every call.
    pub fn use_convention(&mut self, convention: impl MapConvention + 'static) -> Result<&mut Self> {
        self.record(Statement::UseConvention)?;
        let mut executor = ConventionExecutor::new(convention);
        executor.build(self.info, &self.source_type, &self.destination_type)?;
        self.push(Step::UseConvention(executor))
    }

    /// Copies `from(source)` into the destination through `to`.
    pub fn bind<T: 'static>(
        &mut self,
        from: impl Fn(&S) -> T + Send + Sync + 'static,
        to: impl Fn(&mut D, T) + Send + Sync + 'static,
    ) -> Result<&mut Self> {
        self.bind_with(from, to, Vec::new())
    }

    /// [`bind`](Self::bind) with options. When a `map_when` condition fails
    /// nothing else is evaluated. Otherwise the first null substitution
    /// replaces a `None` value, and `to` is called, even with `None`.
    pub fn bind_with<T: 'static>(
        &mut self,
        from: impl Fn(&S) -> T + Send + Sync + 'static,
        to: impl Fn(&mut D, T) + Send + Sync + 'static,
        options: Vec<BindingOption<S, D, T>>,
    ) -> Result<&mut Self> {
        self.push(Step::Bind(action(move |cx| {
            if !should_be_mapped(&options, cx.source, &*cx.destination) {
                return Ok(());
            }
            let value = substitute(&options, from(cx.source));
            to(&mut *cx.destination, value);
            Ok(())
        })))
    }

    /// Assigns a clone of `value` through `to`.
    pub fn bind_constant<T>(
        &mut self,
        value: T,
        to: impl Fn(&mut D, T) + Send + Sync + 'static,
    ) -> Result<&mut Self>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.bind_constant_with(value, to, Vec::new())
    }

    /// [`bind_constant`](Self::bind_constant) gated by `map_when` options.
    /// Null substitution options are rejected.
    pub fn bind_constant_with<T>(
        &mut self,
        value: T,
        to: impl Fn(&mut D, T) + Send + Sync + 'static,
        options: Vec<BindingOption<S, D, T>>,
    ) -> Result<&mut Self>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.record(Statement::BindConstant)?;
        if options.iter().any(BindingOption::is_null_substitution) {
            return Err(ConfigurationError::NullSubstitutionOnConstant.into());
        }
        self.push(Step::BindConstant(action(move |cx| {
            if should_be_mapped(&options, cx.source, &*cx.destination) {
                to(&mut *cx.destination, value.clone());
            }
            Ok(())
        })))
    }

    /// Maps a nested value through the calling mapper into a new `DI` and
    /// assigns it with `to`. A `None` source assigns `None`.
    pub fn map_inner<SI, DI>(
        &mut self,
        from: impl Fn(&S) -> Option<&SI> + Send + Sync + 'static,
        to: impl Fn(&mut D, Option<DI>) + Send + Sync + 'static,
    ) -> Result<&mut Self>
    where
        SI: Any,
        DI: Any + Default,
    {
        self.map_inner_with(from, to, None, Vec::new())
    }

    /// [`map_inner`](Self::map_inner) with an optional getter of the current
    /// nested destination. When it yields a value, the source is mapped into
    /// it in place and `to` is not called.
    pub fn map_inner_with<SI, DI>(
        &mut self,
        from: impl Fn(&S) -> Option<&SI> + Send + Sync + 'static,
        to: impl Fn(&mut D, Option<DI>) + Send + Sync + 'static,
        existing: Option<ExistingGetter<D, DI>>,
        options: Vec<BindingOption<S, D, Option<DI>>>,
    ) -> Result<&mut Self>
    where
        SI: Any,
        DI: Any + Default,
    {
        self.push(Step::MapInner(action(move |cx| {
            if !should_be_mapped(&options, cx.source, &*cx.destination) {
                return Ok(());
            }
            let Some(inner) = from(cx.source) else {
                to(&mut *cx.destination, substitute(&options, None));
                return Ok(());
            };
            if let Some(current) = existing.and_then(|get| get(&mut *cx.destination)) {
                return cx.caller.map(inner, current);
            }
            let created = cx.caller.map_new::<DI>(inner)?;
            to(&mut *cx.destination, Some(created));
            Ok(())
        })))
    }

    /// Runs `hook` after every binding.
    pub fn after_map(
        &mut self,
        hook: impl Fn(&Mapper, &S, &mut D) -> Result<()> + Send + Sync + 'static,
    ) -> Result<&mut Self> {
        self.push(Step::AfterMap(Box::new(hook)))
    }
}
