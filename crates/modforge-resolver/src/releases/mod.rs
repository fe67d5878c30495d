//! Rendering closures and release lists as forge documents

use modforge_core::error::ForgeError;
use modforge_core::types::ModuleIdentity;
use modforge_registry::api::{ModuleSummary, ReleaseEntry, ReleasesResponse};
use modforge_registry::ForgeBackend;

use crate::closure::{ReleaseAggregator, ReleaseClosure};
use crate::ResolverResult;

/// The releases document for a closure, keys in closure order
pub fn releases_response(closure: &ReleaseClosure) -> ReleasesResponse {
    closure
        .iter()
        .map(|(identity, releases)| (identity.full_name(), releases.iter().map(ReleaseEntry::from).collect()))
        .collect()
}

/// The module document for `identity`, failing when no backend has it
pub async fn module_summary(backend: &dyn ForgeBackend, identity: &ModuleIdentity) -> ResolverResult<ModuleSummary> {
    let releases = backend.get_metadata(identity).await?;
    ModuleSummary::from_releases(identity, &releases).ok_or_else(|| ForgeError::ModuleNotFound {
        module: identity.clone(),
    })
}

impl ReleaseAggregator<'_> {
    /// Resolve the closure of `root` and render it as a releases document
    pub async fn releases_document(&self, root: &ModuleIdentity) -> ResolverResult<ReleasesResponse> {
        let closure = self.resolve_closure(root).await?;
        Ok(releases_response(&closure))
    }
}
