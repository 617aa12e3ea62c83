//! # beancp - object to object mapping
//!
//! beancp copies data between layered models (entities, DTOs, views) from
//! declarative maps, small converter functions and name-based conventions.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐     ┌───────────────┐     ┌───────────────┐     ┌───────────────┐
//! │ MapperBuilder │────▶│  Registrations│────▶│    Mapper     │────▶│  destination  │
//! │ maps, convs,  │     │ (frozen, Arc) │     │ resolve tier, │     │  (in place or │
//! │ conventions   │     │               │     │ run executor  │     │   created)    │
//! └───────────────┘     └───────────────┘     └───────────────┘     └───────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use beancp::{commons, MapperBuilder};
//!
//! let mapper = MapperBuilder::new()
//!     .add_converters(commons::number_converters())?
//!     .add_map::<Person, PersonDto>(|m| {
//!         m.bind(|p| p.name.clone(), |d, v| d.full_name = v)?
//!             .map_inner(|p| p.address.as_ref(), |d, v| d.address = v)?;
//!         Ok(())
//!     })?
//!     .add_map::<Address, AddressDto>(|m| {
//!         m.bind(|a| a.city.clone(), |d, v| d.city = v)?;
//!         Ok(())
//!     })?
//!     .build();
//!
//! let dto: PersonDto = mapper.map_new(&person)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Configuration and mapping errors
//! - [`types`] - Type descriptors, primitive wrappers and declared subtypes
//! - [`executor`] - Executor contract, resolution tiers and converters
//! - [`map`] - Declarative maps and their statements
//! - [`convention`] - Conventions, members and bindings
//! - [`registry`] - Registration store and [`MappingInfo`]
//! - [`builder`] - [`MapperBuilder`]
//! - [`mapper`] - [`Mapper`]
//! - [`commons`] - Ready-made converters

// Core modules
pub mod error;
pub mod types;

// Executors
pub mod executor;
pub mod map;

// Conventions
pub mod convention;

// Registration and mapping
pub mod builder;
pub mod mapper;
pub mod registry;

// Converter sets
pub mod commons;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ConfigurationError, Error, MappingError, MappingResult, Result};

// =============================================================================
// Re-exports - Mapper
// =============================================================================

pub use builder::MapperBuilder;
pub use mapper::Mapper;
pub use registry::MappingInfo;

// =============================================================================
// Re-exports - Maps and converters
// =============================================================================

pub use executor::{BoxedConverter, Converter, MappingExecutor};
pub use map::{BindingOption, MapConfig, Statement};

// =============================================================================
// Re-exports - Conventions
// =============================================================================

pub use convention::{
    Bean,
    Binding,
    BindingSide,
    MapConvention,
    Member,
    NameBasedConfig,
    NameBasedMapConvention,
};

// =============================================================================
// Re-exports - Types
// =============================================================================

pub use types::{Extends, TypeDescriptor};
