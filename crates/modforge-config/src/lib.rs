//! Configuration parsing for modforge
//!
//! This crate handles parsing and validation of `modforge.toml`, locating it
//! from the working directory, and layering environment overrides on top.

pub mod merge;
pub mod toml;

// Re-export main types
pub use merge::{ConfigLayering, ConfigLoader, ConfigSource};
pub use toml::{BackendSpec, CacheSection, ModforgeToml, CONFIG_FILE_NAME};

use modforge_core::error::ForgeError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ForgeError>;
