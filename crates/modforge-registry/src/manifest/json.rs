//! `metadata.json` manifests

use modforge_core::types::{DependencyRef, ModuleIdentity, Release};

use super::ManifestError;
use crate::api::ModuleMetadata;

/// Parse a `metadata.json` document
pub fn parse_metadata_json(content: &[u8]) -> Result<Release, ManifestError> {
    let metadata: ModuleMetadata = serde_json::from_slice(content)?;
    if metadata.version.trim().is_empty() {
        return Err(ManifestError::MissingField("version"));
    }

    let mut release = Release::new(ModuleIdentity::parse(&metadata.name)?, metadata.version.clone())
        .with_description(metadata.description_text());
    for dependency in &metadata.dependencies {
        release = release.with_dependency(DependencyRef::new(
            ModuleIdentity::parse(&dependency.name)?,
            dependency.version_requirement.clone().unwrap_or_default(),
        ));
    }
    Ok(release)
}
