//! Forge API documents
//!
//! These are the JSON shapes a module forge serves and that `ProxyBackend`
//! reads back from an upstream forge.

use indexmap::IndexMap;
use modforge_core::types::{DependencyRef, IdentityError, ModuleIdentity, Release};
use serde::{Deserialize, Serialize};

/// `GET /api/v1/releases.json?module=author/name`
///
/// Keys are `author/name`, root module first, then its dependencies in
/// discovery order.
pub type ReleasesResponse = IndexMap<String, Vec<ReleaseEntry>>;

/// One release inside a releases document
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReleaseEntry {
    /// Download path, `/modules/author-name-version.tar.gz`
    pub file: String,
    pub version: String,
    /// `[name, requirement]` pairs
    #[serde(default)]
    pub dependencies: Vec<(String, String)>,
}

impl ReleaseEntry {
    /// Rebuild the release this entry describes
    pub fn to_release(&self, identity: &ModuleIdentity) -> Result<Release, IdentityError> {
        let mut release = Release::new(identity.clone(), self.version.clone());
        for (name, requirement) in &self.dependencies {
            release = release.with_dependency(DependencyRef::new(ModuleIdentity::parse(name)?, requirement.clone()));
        }
        Ok(release)
    }
}

impl From<&Release> for ReleaseEntry {
    fn from(release: &Release) -> Self {
        Self {
            file: format!("/modules/{}", release.archive_file_name()),
            version: release.version.clone(),
            dependencies: release
                .dependencies
                .iter()
                .map(|dep| (dep.identity.full_name(), dep.version_requirement.clone()))
                .collect(),
        }
    }
}

/// `GET /author/name.json`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModuleSummary {
    pub author: String,
    pub full_name: String,
    pub name: String,
    pub desc: String,
    pub releases: Vec<VersionEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VersionEntry {
    pub version: String,
}

impl ModuleSummary {
    /// Summarize the releases of one module; `None` when there are none
    ///
    /// The description comes from the last release listed.
    pub fn from_releases(identity: &ModuleIdentity, releases: &[Release]) -> Option<Self> {
        let latest = releases.last()?;
        Some(Self {
            author: identity.author().to_string(),
            full_name: identity.full_name(),
            name: identity.name().to_string(),
            desc: latest.description.clone(),
            releases: releases
                .iter()
                .map(|release| VersionEntry {
                    version: release.version.clone(),
                })
                .collect(),
        })
    }
}

/// The `metadata.json` manifest shipped inside every module archive
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModuleMetadata {
    /// `author-name`
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<MetadataDependency>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MetadataDependency {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_requirement: Option<String>,
}

impl ModuleMetadata {
    /// Description if present, otherwise summary, otherwise empty
    pub fn description_text(&self) -> String {
        self.description
            .clone()
            .or_else(|| self.summary.clone())
            .unwrap_or_default()
    }
}

impl From<&Release> for ModuleMetadata {
    fn from(release: &Release) -> Self {
        let description = (!release.description.is_empty()).then(|| release.description.clone());
        Self {
            name: release.identity.dashed_name(),
            version: release.version.clone(),
            author: Some(release.identity.author().to_string()),
            summary: description.clone(),
            description,
            dependencies: release
                .dependencies
                .iter()
                .map(|dep| MetadataDependency {
                    name: dep.identity.full_name(),
                    version_requirement: Some(dep.version_requirement.clone()),
                })
                .collect(),
        }
    }
}
