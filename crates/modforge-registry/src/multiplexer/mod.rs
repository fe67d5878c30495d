//! Ordered composition of backends
//!
//! The first backend added has the highest precedence. Archive lookups stop
//! at the first backend that has the release; metadata lookups concatenate
//! every backend's answer in backend order without deduplicating.

use async_trait::async_trait;
use modforge_core::types::{ArchiveHandle, ModuleIdentity, Release};
use std::sync::Arc;
use tracing::debug;

use crate::backend::ForgeBackend;
use crate::RegistryResult;

/// A list of backends queried in precedence order
#[derive(Debug, Clone, Default)]
pub struct ForgeMultiplexer {
    backends: Vec<Arc<dyn ForgeBackend>>,
}

impl ForgeMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a backend with lower precedence than every existing one
    pub fn add_backend(&mut self, backend: Arc<dyn ForgeBackend>) {
        self.backends.push(backend);
    }

    pub fn with_backend(mut self, backend: Arc<dyn ForgeBackend>) -> Self {
        self.add_backend(backend);
        self
    }

    pub fn backends(&self) -> &[Arc<dyn ForgeBackend>] {
        &self.backends
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl FromIterator<Arc<dyn ForgeBackend>> for ForgeMultiplexer {
    fn from_iter<I: IntoIterator<Item = Arc<dyn ForgeBackend>>>(iter: I) -> Self {
        Self {
            backends: iter.into_iter().collect(),
        }
    }
}

#[async_trait]
impl ForgeBackend for ForgeMultiplexer {
    fn describe(&self) -> String {
        let parts: Vec<String> = self.backends.iter().map(|backend| backend.describe()).collect();
        format!("[{}]", parts.join(", "))
    }

    async fn get_module(&self, identity: &ModuleIdentity, version: &str) -> RegistryResult<Option<ArchiveHandle>> {
        for backend in &self.backends {
            if let Some(archive) = backend.get_module(identity, version).await? {
                debug!(module = %identity, version, backend = %backend.describe(), "archive found");
                return Ok(Some(archive));
            }
        }
        Ok(None)
    }

    async fn get_metadata(&self, identity: &ModuleIdentity) -> RegistryResult<Vec<Release>> {
        let mut releases = Vec::new();
        for backend in &self.backends {
            releases.extend(backend.get_metadata(identity).await?);
        }
        Ok(releases)
    }

    async fn get_all_metadata(&self) -> RegistryResult<Vec<Release>> {
        let mut releases = Vec::new();
        for backend in &self.backends {
            releases.extend(backend.get_all_metadata().await?);
        }
        Ok(releases)
    }

    async fn clear_cache(&self, identity: Option<&ModuleIdentity>) -> RegistryResult<()> {
        for backend in &self.backends {
            backend.clear_cache(identity).await?;
        }
        Ok(())
    }
}
