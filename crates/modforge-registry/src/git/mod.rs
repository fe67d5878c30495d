//! Backend serving one module from the release tags of a git repository

mod tags;

pub use tags::{TagPattern, DEFAULT_TAG_PATTERN};

use async_trait::async_trait;
use modforge_cache::{Archiver, TaggedFile, TarGzArchiver, VersionSource};
use modforge_core::error::ForgeError;
use modforge_core::types::{ArchiveHandle, ModuleIdentity, Release};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::ModuleMetadata;
use crate::backend::ForgeBackend;
use crate::manifest::{parse_manifest, MANIFEST_FILES};
use crate::RegistryResult;

/// One module, one repository: every tag matching the pattern is a release
#[derive(Debug, Clone)]
pub struct GitBackend {
    identity: ModuleIdentity,
    source: VersionSource,
    tags: TagPattern,
    archiver: Arc<dyn Archiver>,
}

impl GitBackend {
    pub fn new(identity: ModuleIdentity, source: VersionSource, tags: TagPattern) -> Self {
        Self {
            identity,
            source,
            tags,
            archiver: Arc::new(TarGzArchiver::new()),
        }
    }

    /// Use a different archive format
    pub fn with_archiver(mut self, archiver: Arc<dyn Archiver>) -> Self {
        self.archiver = archiver;
        self
    }

    pub fn identity(&self) -> &ModuleIdentity {
        &self.identity
    }

    pub fn source(&self) -> &VersionSource {
        &self.source
    }

    fn owns(&self, identity: &ModuleIdentity) -> bool {
        &self.identity == identity
    }

    /// Parse the manifest found at `tag`, or a bare release when the tag has none
    fn release_from(&self, file: &TaggedFile, version: &str) -> RegistryResult<Option<Release>> {
        let Some((file_name, content)) = &file.found else {
            return Ok(None);
        };
        let parsed = parse_manifest(file_name, content).map_err(|e| ForgeError::ManifestParse {
            module: self.identity.full_name(),
            release: file.tag.clone(),
            message: format!("{}: {}", file_name, e),
        })?;
        Ok(Some(self.normalize(parsed, &file.tag, version)))
    }

    /// The backend's identity and the tag's version win over what the manifest says
    fn normalize(&self, mut release: Release, tag: &str, version: &str) -> Release {
        if release.identity != self.identity || release.version != version {
            warn!(
                module = %self.identity,
                tag,
                manifest_name = %release.identity,
                manifest_version = %release.version,
                "manifest disagrees with repository, using repository values"
            );
        }
        release.identity = self.identity.clone();
        release.version = version.to_string();
        release
    }
}

#[async_trait]
impl ForgeBackend for GitBackend {
    fn describe(&self) -> String {
        format!("git {} from {}", self.identity, self.source.source_url())
    }

    async fn get_module(&self, identity: &ModuleIdentity, version: &str) -> RegistryResult<Option<ArchiveHandle>> {
        if !self.owns(identity) {
            return Ok(None);
        }

        let tags = &self.tags;
        let files = self
            .source
            .read_each_tag(&MANIFEST_FILES, |all| {
                tags.releases(all)
                    .into_iter()
                    .filter(|(_, v)| v == version)
                    .map(|(tag, _)| tag.to_string())
                    .collect()
            })
            .await?;
        let Some(file) = files.into_iter().next() else {
            debug!(module = %identity, version, "no tag for version");
            return Ok(None);
        };
        let tag = file.tag.clone();

        let release = self
            .release_from(&file, version)?
            .unwrap_or_else(|| Release::new(self.identity.clone(), version));
        let metadata = serde_json::to_vec_pretty(&ModuleMetadata::from(&release))
            .map_err(|e| ForgeError::ManifestParse {
                module: identity.full_name(),
                release: tag.clone(),
                message: e.to_string(),
            })?;

        let stem = release.archive_stem();
        let archiver = Arc::clone(&self.archiver);
        match self
            .source
            .materialize(&tag, move |dir| archiver.archive(dir, &stem, &metadata))
            .await
        {
            Ok(archive) => Ok(Some(archive)),
            // Tag deleted upstream since the listing
            Err(ForgeError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_metadata(&self, identity: &ModuleIdentity) -> RegistryResult<Vec<Release>> {
        if !self.owns(identity) {
            return Ok(Vec::new());
        }

        let tags = &self.tags;
        let files = self
            .source
            .read_each_tag(&MANIFEST_FILES, |all| {
                tags.releases(all).into_iter().map(|(tag, _)| tag.to_string()).collect()
            })
            .await?;

        let mut releases = Vec::with_capacity(files.len());
        for file in &files {
            let Some(version) = self.tags.version_of(&file.tag) else {
                continue;
            };
            match self.release_from(file, &version) {
                Ok(Some(release)) => releases.push(release),
                Ok(None) => warn!(module = %identity, tag = %file.tag, "no manifest at tag, skipping release"),
                Err(e) => {
                    warn!(module = %identity, tag = %file.tag, error = %e, "unreadable manifest, skipping release");
                },
            }
        }
        Ok(releases)
    }

    async fn get_all_metadata(&self) -> RegistryResult<Vec<Release>> {
        let identity = self.identity.clone();
        self.get_metadata(&identity).await
    }

    async fn clear_cache(&self, identity: Option<&ModuleIdentity>) -> RegistryResult<()> {
        match identity {
            Some(identity) if !self.owns(identity) => Ok(()),
            _ => self.source.clear().await,
        }
    }
}

#[cfg(test)]
mod tests;
