use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::member::BindingSide;
use crate::error::{ConfigurationError, MappingError, Result};
use crate::mapper::Mapper;

/// How a bound value reaches the destination member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueConversion {
    /// Same type on both sides; the value is duplicated.
    Copy,
    /// A converter creates the destination value.
    Convert,
    /// A map populates the existing destination value, or a new one.
    Map,
    /// The source value is a declared subtype; its base is duplicated.
    Cast,
}

/// Copies a value from a path of source members to a destination member.
///
/// A path of more than one member flattens a nested source, e.g.
/// `customer.name` bound to `customer_name`.
#[derive(Clone)]
pub struct Binding {
    source_path: Vec<Arc<dyn BindingSide>>,
    destination: Arc<dyn BindingSide>,
    conversion: ValueConversion,
}

impl Binding {
    pub fn new(
        source_path: Vec<Arc<dyn BindingSide>>,
        destination: Arc<dyn BindingSide>,
    ) -> Result<Self> {
        if source_path.is_empty() {
            return Err(ConfigurationError::EmptySourcePath(destination.name().to_string()).into());
        }
        Ok(Self {
            source_path,
            destination,
            conversion: ValueConversion::Copy,
        })
    }

    pub fn with_conversion(mut self, conversion: ValueConversion) -> Self {
        self.conversion = conversion;
        self
    }

    pub fn source_path(&self) -> &[Arc<dyn BindingSide>] {
        &self.source_path
    }

    pub fn destination(&self) -> &Arc<dyn BindingSide> {
        &self.destination
    }

    pub fn conversion(&self) -> ValueConversion {
        self.conversion
    }

    /// Reads the source path; `None` when any member on the way is null.
    pub fn get_value<'a>(&self, source: &'a dyn Any) -> Result<Option<&'a dyn Any>> {
        let mut current = source;
        for side in &self.source_path {
            if !side.is_getter_available() {
                return Err(MappingError::GetterUnavailable(side.name().to_string()).into());
            }
            match side.get_value(current)? {
                Some(value) => current = value,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    pub fn execute(&self, mapper: &Mapper, source: &dyn Any, destination: &mut dyn Any) -> Result<()> {
        if !self.destination.is_setter_available() {
            return Err(MappingError::SetterUnavailable(self.destination.name().to_string()).into());
        }
        let Some(value) = self.get_value(source)? else {
            self.destination.set_value(destination, None)?;
            return Ok(());
        };

        let converted = match self.conversion {
            ValueConversion::Copy => self.source_type_of_last().duplicate(value).ok_or_else(|| {
                MappingError::TypeMismatch {
                    expected: self.source_type_of_last().name(),
                    actual: mapper.types().name_of(value.type_id()),
                }
            })?,
            ValueConversion::Convert => mapper.map_to(value, self.destination.value_type())?,
            ValueConversion::Map => {
                if let Some(existing) = self.destination.get_value_mut(destination)? {
                    return mapper.map(value, existing);
                }
                mapper.map_to(value, self.destination.value_type())?
            }
            ValueConversion::Cast => {
                let target = self.destination.value_type();
                mapper
                    .types()
                    .hierarchy()
                    .upcast(value, target.id())
                    .and_then(|base| target.duplicate(base))
                    .ok_or_else(|| MappingError::TypeMismatch {
                        expected: target.name(),
                        actual: mapper.types().name_of(value.type_id()),
                    })?
            }
        };
        self.destination.set_value(destination, Some(converted))?;
        Ok(())
    }

    fn source_type_of_last(&self) -> &crate::types::TypeDescriptor {
        // Non-empty, checked in `new`.
        self.source_path[self.source_path.len() - 1].value_type()
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path: Vec<&str> = self.source_path.iter().map(|side| side.name()).collect();
        write!(
            f,
            "{} -> {} ({:?})",
            path.join("."),
            self.destination.name(),
            self.conversion
        )
    }
}
