//! Declarative maps between two types.
//!
//! A [`MapDefinition`] goes through two phases. While configuring, the
//! registration closure calls [`MapConfig`] statements, which are validated
//! against the statement order and recorded as steps. Once configured the
//! definition only interprets those steps, with one execution context per call,
//! so concurrent and nested calls never share state.
//!
//! ```text
//!   add_map(closure) ──► MapConfig ──► [Step, Step, ...] ──► execute(caller, source, destination)
//!                         (checks order)                       (walks the steps in order)
//! ```

mod config;
mod option;
mod step;

pub use config::{ExistingGetter, MapConfig};
pub use option::BindingOption;
pub use step::Statement;

use std::any::Any;

use step::{Builder, ExecutionContext, Step};

use crate::error::{ConfigurationError, Result};
use crate::executor::{downcast_mut, downcast_ref, MappingExecutor};
use crate::mapper::Mapper;
use crate::registry::MappingInfo;
use crate::types::TypeDescriptor;

/// Lifecycle of a [`MapDefinition`]. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Configuration,
    Execution,
}

/// A map from `S` to `D` made of recorded statements.
pub struct MapDefinition<S, D> {
    source_type: TypeDescriptor,
    destination_type: TypeDescriptor,
    phase: Phase,
    steps: Vec<Step<S, D>>,
}

impl<S: Any, D: Any> MapDefinition<S, D> {
    pub fn new() -> Self {
        Self {
            source_type: TypeDescriptor::of::<S>(),
            destination_type: TypeDescriptor::of::<D>(),
            phase: Phase::Configuration,
            steps: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Recorded statements, in execution order.
    pub fn statements(&self) -> Vec<Statement> {
        self.steps.iter().map(Step::statement).collect()
    }

    /// Runs `setup` once to record the steps, then switches to execution.
    ///
    /// `info` answers the questions conventions ask while precomputing their
    /// bindings (see [`MapConfig::use_convention`]).
    pub fn configure(
        &mut self,
        info: &dyn MappingInfo,
        setup: impl FnOnce(&mut MapConfig<'_, S, D>) -> Result<()>,
    ) -> Result<()> {
        if self.phase == Phase::Execution {
            return Err(ConfigurationError::AlreadyConfigured {
                source_type: self.source_type.name(),
                destination_type: self.destination_type.name(),
            }
            .into());
        }
        let mut config = MapConfig::new(info, self.source_type, self.destination_type);
        setup(&mut config)?;
        self.steps = config.into_steps();
        self.phase = Phase::Execution;
        Ok(())
    }

    fn ensure_configured(&self) -> Result<()> {
        match self.phase {
            Phase::Execution => Ok(()),
            Phase::Configuration => Err(ConfigurationError::NotConfigured {
                source_type: self.source_type.name(),
                destination_type: self.destination_type.name(),
            }
            .into()),
        }
    }

    fn builder(&self) -> Option<&Builder<D>> {
        self.steps.iter().find_map(|step| match step {
            Step::ConstructDestination(builder) => Some(builder),
            _ => None,
        })
    }

    fn run(&self, caller: &Mapper, source: &S, destination: &mut D) -> Result<()> {
        let mut cx = ExecutionContext {
            caller,
            source,
            destination,
        };
        self.steps.iter().try_for_each(|step| step.run(&mut cx))
    }
}

impl<S: Any, D: Any> Default for MapDefinition<S, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Any, D: Any> MappingExecutor for MapDefinition<S, D> {
    fn source_type(&self) -> &TypeDescriptor {
        &self.source_type
    }

    fn destination_type(&self) -> &TypeDescriptor {
        &self.destination_type
    }

    fn has_destination_builder(&self) -> bool {
        self.builder().is_some()
    }

    fn execute(&self, caller: &Mapper, source: &dyn Any, destination: &mut dyn Any) -> Result<()> {
        self.ensure_configured()?;
        let source = downcast_ref::<S>(source, &self.source_type)?;
        let destination = downcast_mut::<D>(destination, &self.destination_type)?;
        self.run(caller, source, destination)
    }

    fn produce(&self, caller: &Mapper, source: &dyn Any) -> Result<Option<Box<dyn Any>>> {
        self.ensure_configured()?;
        let Some(builder) = self.builder() else {
            return Ok(None);
        };
        let source = downcast_ref::<S>(source, &self.source_type)?;
        let mut destination = builder();
        self.run(caller, source, &mut destination)?;
        Ok(Some(Box::new(destination) as Box<dyn Any>))
    }
}
