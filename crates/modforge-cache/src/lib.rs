//! Git mirror cache for modforge
//!
//! This crate keeps one local bare mirror per remote git source, refreshed at
//! most once per TTL window and serialized per source, and turns checked-out
//! module trees into deterministic `.tar.gz` archives.

pub mod git;
pub mod mirror;
pub mod tarball;

// Re-export main types
pub use git::{GitError, GitTransport, SystemGit};
pub use mirror::{TaggedFile, VersionSource, DEFAULT_TTL, FETCH_MARKER};
pub use tarball::{list_entries, read_archive_file, Archiver, TarGzArchiver, METADATA_FILE};

#[cfg(any(test, feature = "test-utils"))]
pub use git::testing::FakeGit;

use modforge_core::error::ForgeError;

/// Result type for cache operations
pub type CacheResult<T> = Result<T, ForgeError>;
