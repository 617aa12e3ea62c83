//! Error types for mapper configuration and mapping execution.
//!
//! - [`ConfigurationError`] - raised while a [`crate::MapperBuilder`] registers maps,
//!   converters and conventions. A mapper is never built when one of these occurs.
//! - [`MappingError`] - raised by a [`crate::Mapper`] while mapping a value.
//! - [`Error`] - wraps both, so `?` works across the two phases.

use thiserror::Error;

use crate::map::Statement;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors detected while registering mappings.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A map statement was called after a statement that must follow it.
    #[error(
        "Invalid statement order: {statement} cannot follow {previous}. Statements must be called in order: \
         construct_destination_using, before_map, use_convention, bind/bind_constant/map_inner, after_map"
    )]
    StatementOrder {
        statement: Statement,
        previous: Statement,
    },

    /// A statement allowed once per map was repeated.
    #[error("{0} cannot be called more than once")]
    DuplicateStatement(Statement),

    /// `bind_constant` received a null substitution option.
    #[error("Null substitution option not allowed for bind_constant")]
    NullSubstitutionOnConstant,

    /// A map or converter for the same declared pair was already registered.
    #[error("Mapping from {source_type} to {destination_type} already defined")]
    DuplicateMapping {
        source_type: &'static str,
        destination_type: &'static str,
    },

    /// The map definition was configured twice.
    #[error("Map from {source_type} to {destination_type} is already configured")]
    AlreadyConfigured {
        source_type: &'static str,
        destination_type: &'static str,
    },

    /// The map definition was executed before being configured.
    #[error("Map from {source_type} to {destination_type} is not configured")]
    NotConfigured {
        source_type: &'static str,
        destination_type: &'static str,
    },

    /// A convention required every destination member to be bound.
    #[error("Not all destination members of {destination_type} are mapped: {members:?}")]
    UnmappedDestinationMembers {
        destination_type: &'static str,
        members: Vec<String>,
    },

    /// A convention required every source member to be used.
    #[error("Not all source members of {source_type} are mapped: {members:?}")]
    UnmappedSourceMembers {
        source_type: &'static str,
        members: Vec<String>,
    },

    /// A member pattern could not be compiled.
    #[error("Invalid member pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Convention configuration could not be parsed.
    #[error("Invalid convention configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    /// A binding was created without any source member.
    #[error("Binding to '{0}' has an empty source path")]
    EmptySourcePath(String),
}

// =============================================================================
// Mapping Errors
// =============================================================================

/// Errors raised while mapping values.
#[derive(Debug, Error)]
pub enum MappingError {
    /// No map, converter or convention can handle the pair.
    #[error("No suitable mapping found from {source_type} to {destination_type}")]
    NotFound {
        source_type: String,
        destination_type: String,
    },

    /// A convention produced no binding for the pair.
    #[error("I don't know how to map {source_type} to {destination_type}")]
    NoBindings {
        source_type: String,
        destination_type: String,
    },

    /// A required argument was null.
    #[error("Parameter '{0}' must not be null")]
    NullParameter(&'static str),

    /// A binding needs to read a member that has no getter.
    #[error("Getter not available for member '{0}'")]
    GetterUnavailable(String),

    /// A binding needs to write a member that has no setter.
    #[error("Setter not available for member '{0}'")]
    SetterUnavailable(String),

    /// Null was assigned to a member that cannot hold it.
    #[error("Cannot assign null to non-optional member '{0}'")]
    NullAssignment(String),

    /// The destination builder produced a value of another type.
    #[error("Destination builder returned {actual}, which cannot be used as {requested}")]
    IncompatibleDestination {
        requested: &'static str,
        actual: &'static str,
    },

    /// No builder and no default constructor for a new destination.
    #[error("Cannot construct {0}: no destination builder or default value available")]
    NotConstructible(&'static str),

    /// A value did not have the type an executor or member declares.
    #[error("Value of type {actual} cannot be used as {expected}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// Failure reported by user code (hooks, converters).
    #[error("{0}")]
    Failed(String),
}

// =============================================================================
// Top-level Error
// =============================================================================

/// Any error produced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Registration failed.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Mapping failed.
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),
}

impl Error {
    /// Shortcut for user hooks and converters reporting a failure.
    pub fn failed(message: impl Into<String>) -> Self {
        MappingError::Failed(message.into()).into()
    }

    /// `true` when no mapping was found for a pair.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Mapping(MappingError::NotFound { .. } | MappingError::NoBindings { .. })
        )
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for configuration and mapping operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for operations that can only fail during mapping.
pub type MappingResult<T> = std::result::Result<T, MappingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let err: Error = MappingError::NullParameter("source").into();
        assert!(err.to_string().contains("source"));
        assert!(!err.is_not_found());

        let err: Error = ConfigurationError::NullSubstitutionOnConstant.into();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("bind_constant"));
    }

    #[test]
    fn test_statement_order_format() {
        let err = ConfigurationError::StatementOrder {
            statement: Statement::BeforeMap,
            previous: Statement::Bind,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Invalid statement order"));
        assert!(msg.contains("before_map cannot follow bind"));
    }

    #[test]
    fn test_not_found_format() {
        let err: Error = MappingError::NotFound {
            source_type: "Source".into(),
            destination_type: "Destination".into(),
        }
        .into();
        assert!(err.is_not_found());
        assert!(err
            .to_string()
            .contains("No suitable mapping found from Source to Destination"));
    }
}
