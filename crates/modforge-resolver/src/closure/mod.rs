//! Breadth-first release closure
//!
//! Starting from one module, collect every release of it and of every module
//! any of those releases depends on, transitively. Each module is queried
//! once. A module with no releases anywhere fails the whole traversal, so a
//! caller never sees a partial closure.

use indexmap::IndexMap;
use modforge_core::error::ForgeError;
use modforge_core::types::{ModuleIdentity, Release};
use modforge_registry::ForgeBackend;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

use crate::ResolverResult;

/// Releases per module, root first, then dependencies in discovery order
pub type ReleaseClosure = IndexMap<ModuleIdentity, Vec<Release>>;

/// Collects release closures from a backend, usually the multiplexer
#[derive(Debug, Clone, Copy)]
pub struct ReleaseAggregator<'a> {
    backend: &'a dyn ForgeBackend,
}

impl<'a> ReleaseAggregator<'a> {
    pub fn new(backend: &'a dyn ForgeBackend) -> Self {
        Self { backend }
    }

    /// Releases of `root` and of everything reachable from it through dependencies
    pub async fn resolve_closure(&self, root: &ModuleIdentity) -> ResolverResult<ReleaseClosure> {
        let mut closure = ReleaseClosure::new();
        let mut queued = HashSet::new();
        let mut queue = VecDeque::new();

        queued.insert(root.clone());
        queue.push_back(root.clone());

        while let Some(identity) = queue.pop_front() {
            let releases = self.backend.get_metadata(&identity).await?;
            if releases.is_empty() {
                return Err(ForgeError::ModuleNotFound { module: identity });
            }
            debug!(module = %identity, releases = releases.len(), "collected releases");

            for release in &releases {
                for dependency in &release.dependencies {
                    if queued.insert(dependency.identity.clone()) {
                        queue.push_back(dependency.identity.clone());
                    }
                }
            }
            closure.insert(identity, releases);
        }

        Ok(closure)
    }
}
