//! Module backends for modforge
//!
//! This crate defines the `ForgeBackend` contract every module source
//! implements, the three sources modforge ships (git repositories, local
//! archive directories and upstream forges over HTTP), the multiplexer that
//! layers them by precedence, and the JSON documents a forge serves.

pub mod api;
pub mod backend;
pub mod directory;
pub mod git;
pub mod manifest;
pub mod multiplexer;
pub mod proxy;

// Re-export main types
pub use api::{ModuleMetadata, ModuleSummary, ReleaseEntry, ReleasesResponse};
pub use backend::ForgeBackend;
pub use directory::DirectoryBackend;
pub use git::{GitBackend, TagPattern, DEFAULT_TAG_PATTERN};
pub use multiplexer::ForgeMultiplexer;
pub use proxy::{ProxyBackend, RetryConfig};

#[cfg(any(test, feature = "test-utils"))]
pub use backend::testing::StaticBackend;

use modforge_core::error::ForgeError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, ForgeError>;
