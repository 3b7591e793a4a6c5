//! Identifier types for Platform.sh resources.
//!
//! Project and environment IDs are assigned by the remote API. They are
//! opaque strings, but they are always used as URL path segments, so they
//! are validated to be non-empty, free of `/` and free of surrounding
//! whitespace.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Separator between the project and environment parts of an import ID.
pub const KEY_SEPARATOR: char = '/';

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The identifier is empty.
    #[error("{kind} ID must not be empty")]
    Empty {
        /// Which identifier was being parsed.
        kind: &'static str,
    },

    /// The identifier contains the key separator.
    #[error("{kind} ID must not contain '/': {value:?}")]
    ContainsSeparator {
        /// Which identifier was being parsed.
        kind: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The identifier has leading or trailing whitespace.
    #[error("{kind} ID must not have surrounding whitespace: {value:?}")]
    SurroundingWhitespace {
        /// Which identifier was being parsed.
        kind: &'static str,
        /// The rejected value.
        value: String,
    },

    /// An import identifier is not of the form `projectID/environmentID`.
    #[error("import ID must have the form 'project_id/environment_id', got {0:?}")]
    InvalidImportId(String),
}

fn validate(kind: &'static str, value: &str) -> Result<(), IdError> {
    if value.is_empty() {
        return Err(IdError::Empty { kind });
    }
    if value.contains(KEY_SEPARATOR) {
        return Err(IdError::ContainsSeparator {
            kind,
            value: value.to_string(),
        });
    }
    if value.trim() != value {
        return Err(IdError::SurroundingWhitespace {
            kind,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// A Platform.sh project identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectId(String);

impl ProjectId {
    /// Parse a `ProjectId`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is empty, contains `/` or has
    /// surrounding whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        validate("project", &value)?;
        Ok(Self(value))
    }

    /// Return the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProjectId({})", self.0)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ProjectId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ProjectId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProjectId> for String {
    fn from(id: ProjectId) -> Self {
        id.0
    }
}

/// A Platform.sh environment identifier (the branch machine name).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EnvironmentId(String);

impl EnvironmentId {
    /// Parse an `EnvironmentId`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is empty, contains `/` or has
    /// surrounding whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        validate("environment", &value)?;
        Ok(Self(value))
    }

    /// Return the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EnvironmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnvironmentId({})", self.0)
    }
}

impl fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EnvironmentId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for EnvironmentId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EnvironmentId> for String {
    fn from(id: EnvironmentId) -> Self {
        id.0
    }
}

/// The durable key of a managed environment.
///
/// Every read, update and delete after creation is addressed by this pair.
/// Its string form, `project_id/environment_id`, is also the only accepted
/// import identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvironmentKey {
    /// The owning project.
    pub project_id: ProjectId,
    /// The environment within the project.
    pub environment_id: EnvironmentId,
}

impl EnvironmentKey {
    /// Create a key from its parts.
    #[must_use]
    pub const fn new(project_id: ProjectId, environment_id: EnvironmentId) -> Self {
        Self {
            project_id,
            environment_id,
        }
    }

    /// Parse an import identifier of the form `project_id/environment_id`.
    ///
    /// # Errors
    ///
    /// Returns `IdError::InvalidImportId` if the value does not contain
    /// exactly one separator, or a part-specific error if either part is
    /// not a valid identifier.
    pub fn parse_import_id(value: &str) -> Result<Self, IdError> {
        let mut parts = value.split(KEY_SEPARATOR);
        let (Some(project), Some(environment), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(IdError::InvalidImportId(value.to_string()));
        };

        Ok(Self {
            project_id: ProjectId::new(project)?,
            environment_id: EnvironmentId::new(environment)?,
        })
    }
}

impl fmt::Display for EnvironmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{KEY_SEPARATOR}{}",
            self.project_id, self.environment_id
        )
    }
}

impl FromStr for EnvironmentKey {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_import_id(s)
    }
}
