//! Conventions derive bindings between two types from their members instead
//! of explicit `bind` calls.
//!
//! - [`MapConvention`] - strategy producing the bindings for a type pair
//! - [`ConventionExecutor`] - runs a convention, precomputed or on the fly
//! - [`NameBasedMapConvention`] - matches members by name, with flattening
//! - [`Member`], [`Bean`] - member metadata conventions work on

mod binding;
mod member;
mod name_based;

pub use binding::{Binding, ValueConversion};
pub use member::{Bean, BindingSide, Member};
pub use name_based::{NameBasedConfig, NameBasedMapConvention};

use std::any::Any;
use std::borrow::Cow;
use std::sync::Arc;

use crate::error::{MappingError, Result};
use crate::mapper::Mapper;
use crate::registry::MappingInfo;
use crate::types::TypeDescriptor;

/// Strategy deriving bindings for a source/destination pair.
///
/// Implementations are shared between threads and may be called both while
/// the mapper is being built and while it maps. Acquiring locks inside
/// [`MapConvention::bindings`] is not permitted.
pub trait MapConvention: Send + Sync {
    /// Bindings copying `source` members into `destination` members. An empty
    /// list means the convention cannot map the pair.
    fn bindings(
        &self,
        info: &dyn MappingInfo,
        source: &TypeDescriptor,
        destination: &TypeDescriptor,
    ) -> Result<Vec<Binding>>;
}

/// Runs a [`MapConvention`].
///
/// When [`ConventionExecutor::build`] was called the bindings computed for
/// that pair are reused on every call; otherwise they are computed per call
/// from the actual source and destination types.
#[derive(Clone)]
pub struct ConventionExecutor {
    convention: Arc<dyn MapConvention>,
    bindings: Option<Arc<[Binding]>>,
}

impl ConventionExecutor {
    pub fn new(convention: impl MapConvention + 'static) -> Self {
        Self::from_arc(Arc::new(convention))
    }

    pub fn from_arc(convention: Arc<dyn MapConvention>) -> Self {
        Self {
            convention,
            bindings: None,
        }
    }

    /// Precomputes the bindings for a fixed pair.
    pub fn build(
        &mut self,
        info: &dyn MappingInfo,
        source: &TypeDescriptor,
        destination: &TypeDescriptor,
    ) -> Result<()> {
        let bindings = self.convention.bindings(info, source, destination)?;
        log::debug!(
            "Convention plan for {} -> {}: {:?}",
            source,
            destination,
            bindings
        );
        self.bindings = Some(bindings.into());
        Ok(())
    }

    pub fn is_built(&self) -> bool {
        self.bindings.is_some()
    }

    /// Maps `source` into `destination`, failing when the convention has no
    /// binding for the pair.
    pub fn map(&self, mapper: &Mapper, source: &dyn Any, destination: &mut dyn Any) -> Result<()> {
        if self.try_map(mapper, source, destination)? {
            return Ok(());
        }
        let types = mapper.types();
        Err(MappingError::NoBindings {
            source_type: types.name_of(source.type_id()).to_string(),
            destination_type: types.name_of((*destination).type_id()).to_string(),
        }
        .into())
    }

    /// Maps `source` into `destination` if the convention has bindings for the
    /// pair. Returns `false` without touching `destination` otherwise.
    pub fn try_map(&self, mapper: &Mapper, source: &dyn Any, destination: &mut dyn Any) -> Result<bool> {
        let bindings: Cow<'_, [Binding]> = match &self.bindings {
            Some(bindings) => Cow::Borrowed(&bindings[..]),
            None => {
                let types = mapper.types();
                let source_type = types.describe(source.type_id());
                let destination_type = types.describe((*destination).type_id());
                let bindings = self.convention.bindings(mapper, &source_type, &destination_type)?;
                log::trace!(
                    "Convention bindings computed for {} -> {}: {}",
                    source_type,
                    destination_type,
                    bindings.len()
                );
                Cow::Owned(bindings)
            }
        };
        if bindings.is_empty() {
            return Ok(false);
        }
        for binding in bindings.iter() {
            binding.execute(mapper, source, destination)?;
        }
        Ok(true)
    }

    /// `true` when the convention yields at least one binding for the pair.
    pub fn can_map(&self, info: &dyn MappingInfo, source: &TypeDescriptor, destination: &TypeDescriptor) -> bool {
        match self.convention.bindings(info, source, destination) {
            Ok(bindings) => !bindings.is_empty(),
            Err(err) => {
                log::debug!("Convention cannot map {} -> {}: {}", source, destination, err);
                false
            }
        }
    }
}
