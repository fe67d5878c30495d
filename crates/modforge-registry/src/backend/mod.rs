//! The module backend contract
//!
//! Every module source answers the same questions: which releases of a
//! module exist, and what is the archive of one of them. A backend that does
//! not own a module answers `None` or an empty list; errors are reserved for
//! sources that own the module but cannot be read.

use async_trait::async_trait;
use modforge_core::types::{ArchiveHandle, ModuleIdentity, Release};
use std::fmt;

use crate::RegistryResult;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

/// A source of module releases and archives
#[async_trait]
pub trait ForgeBackend: Send + Sync + fmt::Debug {
    /// Short human-readable description, e.g. `git puppetlabs/apache`
    fn describe(&self) -> String;

    /// Archive of `identity` at `version`, or `None` when this backend has no such release
    async fn get_module(&self, identity: &ModuleIdentity, version: &str) -> RegistryResult<Option<ArchiveHandle>>;

    /// Every release of `identity` this backend knows, in the backend's own order
    async fn get_metadata(&self, identity: &ModuleIdentity) -> RegistryResult<Vec<Release>>;

    /// Every release of every module this backend can enumerate
    async fn get_all_metadata(&self) -> RegistryResult<Vec<Release>>;

    /// Drop cached state for `identity`, or for everything when `None`
    async fn clear_cache(&self, _identity: Option<&ModuleIdentity>) -> RegistryResult<()> {
        Ok(())
    }
}
