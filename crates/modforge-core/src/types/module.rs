//! Module identity.
//!
//! A module is named by its author and its short name. The forge writes it
//! as `author/name` in URLs and dependency lists and as `author-name` in
//! manifests and archive file names; both spellings parse.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The `(author, name)` namespace of a module
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleIdentity {
    author: String,
    name: String,
}

/// Error returned when a module name cannot be split into author and name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid module name '{input}': expected 'author/name' or 'author-name'")]
pub struct IdentityError {
    pub input: String,
}

impl ModuleIdentity {
    /// Create a module identity from its parts
    pub fn new(author: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            name: name.into(),
        }
    }

    /// Parse `author/name` or `author-name`, splitting at the first separator
    pub fn parse(input: &str) -> Result<Self, IdentityError> {
        let split = input.split_once('/').or_else(|| input.split_once('-'));
        match split {
            Some((author, name)) if is_valid_segment(author) && is_valid_segment(name) => {
                Ok(Self::new(author, name))
            },
            _ => Err(IdentityError {
                input: input.to_string(),
            }),
        }
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `author/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.author, self.name)
    }

    /// `author-name`, the form used in manifests and archive names
    pub fn dashed_name(&self) -> String {
        format!("{}-{}", self.author, self.name)
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
}

impl fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.author, self.name)
    }
}

impl FromStr for ModuleIdentity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ModuleIdentity {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ModuleIdentity> for String {
    fn from(identity: ModuleIdentity) -> Self {
        identity.full_name()
    }
}
