//! Release aggregation for modforge
//!
//! This crate walks module dependencies breadth-first to collect the release
//! metadata of a module and everything it depends on, and renders the result
//! as the forge's releases and module documents. It discovers; it does not
//! solve version constraints.

pub mod closure;
pub mod releases;

// Re-export main types
pub use closure::{ReleaseAggregator, ReleaseClosure};
pub use releases::{module_summary, releases_response};

use modforge_core::error::ForgeError;

/// Result type for resolver operations
pub type ResolverResult<T> = Result<T, ForgeError>;
