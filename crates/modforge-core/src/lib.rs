//! # modforge-core
//!
//! Core types and utilities shared across all modforge crates.
//!
//! This crate provides:
//! - `ModuleIdentity`, `Release` and `DependencyRef`, the release metadata model
//! - `ArchiveHandle`, the downloadable artifact for one release
//! - `ForgeError`, the unified error type for every backend and the cache
//! - Small hashing and path helpers
//!
//! ## Architecture
//!
//! - `types`: module, release and archive types
//! - `error`: error types and result aliases
//! - `utils`: utility functions and helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{ForgeError, ForgeResult};
pub use types::{ArchiveHandle, DependencyRef, IdentityError, ModuleIdentity, Release};
