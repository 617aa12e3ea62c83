//! Name-based convention.
//!
//! Binds destination members to source members with the same name, compared
//! case-insensitively. With flattening enabled a destination member such as
//! `customer_name` also matches the path `customer.name`.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::binding::{Binding, ValueConversion};
use super::member::BindingSide;
use super::MapConvention;
use crate::error::{ConfigurationError, Error, Result};
use crate::registry::MappingInfo;
use crate::types::TypeDescriptor;

/// Serializable settings of a [`NameBasedMapConvention`].
///
/// ```json
/// {
///   "include_destination_members": ["^name$", "^total"],
///   "flattening": true,
///   "fail_if_not_all_destination_members_mapped": true
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameBasedConfig {
    /// Only destination members matching one of these patterns are bound.
    pub include_destination_members: Vec<String>,

    /// Destination members matching one of these patterns are never bound.
    pub exclude_destination_members: Vec<String>,

    pub flattening: bool,

    pub fail_if_not_all_destination_members_mapped: bool,

    pub fail_if_not_all_source_members_mapped: bool,
}

impl NameBasedConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ConfigurationError::InvalidConfig(e).into())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigurationError::InvalidConfig(e).into())
    }
}

/// Convention matching members by name.
#[derive(Debug, Clone, Default)]
pub struct NameBasedMapConvention {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
    flattening: bool,
    fail_if_destination_unmapped: bool,
    fail_if_source_unmapped: bool,
}

impl NameBasedMapConvention {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &NameBasedConfig) -> Result<Self> {
        let mut convention = Self::new()
            .include_destination_members(&config.include_destination_members)?
            .exclude_destination_members(&config.exclude_destination_members)?;
        convention.flattening = config.flattening;
        convention.fail_if_destination_unmapped = config.fail_if_not_all_destination_members_mapped;
        convention.fail_if_source_unmapped = config.fail_if_not_all_source_members_mapped;
        Ok(convention)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_config(&NameBasedConfig::from_json(json)?)
    }

    /// Restricts binding to destination members matching any of `patterns`.
    pub fn include_destination_members<I, P>(mut self, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        self.include.extend(compile(patterns)?);
        Ok(self)
    }

    /// Skips destination members matching any of `patterns`.
    pub fn exclude_destination_members<I, P>(mut self, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        self.exclude.extend(compile(patterns)?);
        Ok(self)
    }

    pub fn enable_flattening(mut self) -> Self {
        self.flattening = true;
        self
    }

    pub fn disable_flattening(mut self) -> Self {
        self.flattening = false;
        self
    }

    pub fn fail_if_not_all_destination_members_mapped(mut self) -> Self {
        self.fail_if_destination_unmapped = true;
        self
    }

    pub fn fail_if_not_all_source_members_mapped(mut self) -> Self {
        self.fail_if_source_unmapped = true;
        self
    }

    fn expected_to_bind(&self, name: &str) -> bool {
        (self.include.is_empty() || self.include.iter().any(|pattern| pattern.is_match(name)))
            && !self.exclude.iter().any(|pattern| pattern.is_match(name))
    }

    fn source_path(
        &self,
        info: &dyn MappingInfo,
        members: &[Arc<dyn BindingSide>],
        name: &str,
    ) -> Option<Vec<Arc<dyn BindingSide>>> {
        if let Some(member) = members
            .iter()
            .find(|member| member.name().eq_ignore_ascii_case(name))
        {
            return Some(vec![member.clone()]);
        }
        if !self.flattening {
            return None;
        }

        // Longest prefix; the first declared wins among equal lengths.
        let mut prefix: Option<&Arc<dyn BindingSide>> = None;
        for member in members {
            let len = member.name().len();
            let matches = len < name.len()
                && name
                    .get(..len)
                    .map_or(false, |head| head.eq_ignore_ascii_case(member.name()));
            if matches && prefix.map_or(true, |best| len > best.name().len()) {
                prefix = Some(member);
            }
        }
        let prefix = prefix?;
        let rest = name[prefix.name().len()..].trim_start_matches('_');
        if rest.is_empty() {
            return None;
        }

        let nested = info.members(prefix.value_type());
        let mut path = vec![prefix.clone()];
        path.extend(self.source_path(info, nested, rest)?);
        Some(path)
    }

    fn binding_if_available(
        &self,
        info: &dyn MappingInfo,
        source: &TypeDescriptor,
        destination: &TypeDescriptor,
        path: Vec<Arc<dyn BindingSide>>,
        member: &Arc<dyn BindingSide>,
    ) -> Result<Option<Binding>> {
        let Some(last) = path.last() else {
            return Ok(None);
        };
        let from = *last.value_type();
        let to = *member.value_type();

        let conversion = if from == to {
            ValueConversion::Copy
        } else if from == *source && to == *destination {
            ValueConversion::Map
        } else if info.is_converter_available(&from, &to) {
            ValueConversion::Convert
        } else if info.is_map_available(&from, &to) {
            ValueConversion::Map
        } else if info.is_subtype(&from, &to) {
            ValueConversion::Cast
        } else {
            log::trace!("No way to bind {} ({} -> {})", member.name(), from, to);
            return Ok(None);
        };
        Ok(Some(Binding::new(path, member.clone())?.with_conversion(conversion)))
    }
}

impl MapConvention for NameBasedMapConvention {
    fn bindings(
        &self,
        info: &dyn MappingInfo,
        source: &TypeDescriptor,
        destination: &TypeDescriptor,
    ) -> Result<Vec<Binding>> {
        let source_members = info.members(source);
        let mut bindings = Vec::new();
        let mut unmapped = Vec::new();

        for member in info.members(destination) {
            if !member.is_setter_available() || !self.expected_to_bind(member.name()) {
                continue;
            }
            match self.source_path(info, source_members, member.name()) {
                Some(path) => {
                    if let Some(binding) =
                        self.binding_if_available(info, source, destination, path, member)?
                    {
                        bindings.push(binding);
                    }
                }
                None => unmapped.push(member.name().to_string()),
            }
        }

        if self.fail_if_destination_unmapped && !unmapped.is_empty() {
            return Err(ConfigurationError::UnmappedDestinationMembers {
                destination_type: destination.name(),
                members: unmapped,
            }
            .into());
        }

        if self.fail_if_source_unmapped {
            let unused: Vec<String> = source_members
                .iter()
                .filter(|member| member.is_getter_available())
                .filter(|member| {
                    !bindings
                        .iter()
                        .any(|binding: &Binding| binding.source_path()[0].name() == member.name())
                })
                .map(|member| member.name().to_string())
                .collect();
            if !unused.is_empty() {
                return Err(ConfigurationError::UnmappedSourceMembers {
                    source_type: source.name(),
                    members: unused,
                }
                .into());
            }
        }

        Ok(bindings)
    }
}

fn compile<I, P>(patterns: I) -> Result<Vec<Regex>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|pattern| {
            let pattern = pattern.as_ref();
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    Error::from(ConfigurationError::InvalidPattern {
                        pattern: pattern.to_string(),
                        reason: e.to_string(),
                    })
                })
        })
        .collect()
}
