//! Error types and result aliases for modforge operations.
//!
//! One error type covers the mirror cache, every backend and the release
//! aggregator. Backend "no match" is never an error: it is `None` or an
//! empty release list.

use thiserror::Error;

use crate::types::ModuleIdentity;

/// Unified error type for all modforge operations
#[derive(Error, Debug)]
pub enum ForgeError {
    // Config errors
    #[error("Failed to parse modforge.toml: {message}")]
    TomlParse { message: String },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // Metadata errors
    #[error("Failed to parse manifest of {module} at '{release}': {message}")]
    ManifestParse {
        module: String,
        release: String,
        message: String,
    },

    // Mirror errors
    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Source '{source_url}' is unavailable: {message}")]
    SourceUnavailable {
        source_url: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Aggregation errors
    #[error("Module {module} not found")]
    ModuleNotFound { module: ModuleIdentity },

    // Upstream errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for modforge operations
pub type ForgeResult<T> = Result<T, ForgeError>;

impl ForgeError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Create a source-unavailable error without an underlying cause
    pub fn source_unavailable(source_url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source_url: source_url.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a not-found error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Check if a caller retry may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ForgeError::SourceUnavailable { .. } | ForgeError::Network { .. } | ForgeError::Io { .. }
        )
    }

    /// Check if this error means "no such release or module"
    pub fn is_not_found(&self) -> bool {
        matches!(self, ForgeError::NotFound { .. } | ForgeError::ModuleNotFound { .. })
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            ForgeError::ModuleNotFound { .. } => {
                Some("Check the module name or add a backend that provides it")
            },
            ForgeError::SourceUnavailable { .. } => {
                Some("Check that the git source is reachable, then retry")
            },
            ForgeError::Network { .. } => Some("Check the upstream forge URL and try again"),
            ForgeError::ManifestParse { .. } => {
                Some("Fix the module's metadata.json or Modulefile at that release")
            },
            ForgeError::ConfigValidation { .. } | ForgeError::TomlParse { .. } => {
                Some("Run 'modforge check' to validate modforge.toml")
            },
            _ => None,
        }
    }
}
