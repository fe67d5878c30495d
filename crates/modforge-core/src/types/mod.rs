//! Core data types for modforge.
//!
//! - `ModuleIdentity`: the `(author, name)` namespace of a module
//! - `Release` and `DependencyRef`: metadata of one tagged release
//! - `ArchiveHandle`: the downloadable artifact of one release

pub mod archive;
pub mod module;
pub mod release;

// Re-export all public types
pub use archive::ArchiveHandle;
pub use module::{IdentityError, ModuleIdentity};
pub use release::{DependencyRef, Release};
