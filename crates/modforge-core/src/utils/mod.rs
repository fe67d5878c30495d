//! Utility functions and helpers.
//!
//! Common functionality used across multiple modforge crates.

pub mod hash;
pub mod path;

// Re-export commonly used utilities
pub use hash::{blake3_hash, short_digest};
pub use path::is_safe_path;
