//! In-memory backend for tests

use async_trait::async_trait;
use modforge_core::error::ForgeError;
use modforge_core::types::{ArchiveHandle, DependencyRef, ModuleIdentity, Release};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::ForgeBackend;
use crate::RegistryResult;

/// Backend serving a fixed list of releases
///
/// Archives are synthesized from the release name, so two `StaticBackend`s
/// can be told apart by their `label`.
#[derive(Debug, Default)]
pub struct StaticBackend {
    label: String,
    releases: Vec<Release>,
    failing: AtomicBool,
    metadata_calls: AtomicUsize,
    module_calls: AtomicUsize,
    clears: AtomicUsize,
}

impl StaticBackend {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Add a release of `module` (`author/name`) depending on `deps`
    pub fn with_release(mut self, module: &str, version: &str, deps: &[&str]) -> Self {
        let identity = parse(module);
        let mut release = Release::new(identity, version).with_description(format!("{} module", module));
        for dep in deps {
            release = release.with_dependency(DependencyRef::new(parse(dep), ">= 0.0.0"));
        }
        self.releases.push(release);
        self
    }

    /// Make every call fail with `SourceUnavailable`
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    pub fn module_calls(&self) -> usize {
        self.module_calls.load(Ordering::SeqCst)
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    /// Archive bytes this backend serves for a release
    pub fn archive_bytes(&self, release: &Release) -> Vec<u8> {
        format!("{}:{}", self.label, release.archive_stem()).into_bytes()
    }

    fn check_available(&self) -> RegistryResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(ForgeError::source_unavailable(self.label.clone(), "backend is failing"))
        } else {
            Ok(())
        }
    }
}

fn parse(module: &str) -> ModuleIdentity {
    ModuleIdentity::parse(module).unwrap_or_else(|_| panic!("bad module name in test: {}", module))
}

#[async_trait]
impl ForgeBackend for StaticBackend {
    fn describe(&self) -> String {
        format!("static {}", self.label)
    }

    async fn get_module(&self, identity: &ModuleIdentity, version: &str) -> RegistryResult<Option<ArchiveHandle>> {
        self.module_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self
            .releases
            .iter()
            .find(|release| &release.identity == identity && release.version == version)
            .map(|release| ArchiveHandle::new(release.archive_file_name(), self.archive_bytes(release))))
    }

    async fn get_metadata(&self, identity: &ModuleIdentity) -> RegistryResult<Vec<Release>> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self
            .releases
            .iter()
            .filter(|release| &release.identity == identity)
            .cloned()
            .collect())
    }

    async fn get_all_metadata(&self) -> RegistryResult<Vec<Release>> {
        self.check_available()?;
        Ok(self.releases.clone())
    }

    async fn clear_cache(&self, _identity: Option<&ModuleIdentity>) -> RegistryResult<()> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
