//! Release metadata types.
//!
//! A `Release` is what one tagged snapshot's manifest says about a module.
//! Versions and requirements are opaque strings: nothing here orders or
//! evaluates them.

use serde::{Deserialize, Serialize};

use super::ModuleIdentity;

/// Metadata of one release of a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub identity: ModuleIdentity,
    pub version: String,
    pub description: String,
    pub dependencies: Vec<DependencyRef>,
}

/// A dependency edge declared by a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRef {
    pub identity: ModuleIdentity,
    pub version_requirement: String,
}

impl Release {
    /// Create a release with no description and no dependencies
    pub fn new(identity: ModuleIdentity, version: impl Into<String>) -> Self {
        Self {
            identity,
            version: version.into(),
            description: String::new(),
            dependencies: Vec::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append a dependency
    pub fn with_dependency(mut self, dependency: DependencyRef) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// `author-name-version`, the archive's top-level directory
    pub fn archive_stem(&self) -> String {
        format!("{}-{}", self.identity.dashed_name(), self.version)
    }

    /// `author-name-version.tar.gz`
    pub fn archive_file_name(&self) -> String {
        format!("{}.tar.gz", self.archive_stem())
    }
}

impl DependencyRef {
    pub fn new(identity: ModuleIdentity, version_requirement: impl Into<String>) -> Self {
        Self {
            identity,
            version_requirement: version_requirement.into(),
        }
    }
}
