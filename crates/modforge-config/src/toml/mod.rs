//! modforge.toml configuration parsing and serialization

use camino::{Utf8Path, Utf8PathBuf};
use modforge_core::error::ForgeError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ConfigResult;

/// File name looked up from the working directory upwards
pub const CONFIG_FILE_NAME: &str = "modforge.toml";

/// Mirror refresh window when none is configured
pub const DEFAULT_TTL_SECONDS: i64 = 60;

/// Complete modforge.toml configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModforgeToml {
    /// Mirror cache settings
    #[serde(default)]
    pub cache: CacheSection,

    /// Backends in precedence order
    #[serde(default, rename = "backend")]
    pub backends: Vec<BackendSpec>,
}

/// `[cache]` section
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CacheSection {
    /// Directory holding every git mirror
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<Utf8PathBuf>,

    /// Mirror refresh window; zero or negative refreshes on every access
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<i64>,
}

/// One `[[backend]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendSpec {
    /// A module served from the release tags of a git repository
    Git {
        author: String,
        name: String,
        source: String,
        /// Release tag pattern; the backend default applies when absent
        #[serde(skip_serializing_if = "Option::is_none")]
        tag_pattern: Option<String>,
    },

    /// A directory of `author-name-version.tar.gz` archives
    Directory { path: Utf8PathBuf },

    /// An upstream forge
    Proxy {
        url: String,
        /// Lifetime of cached upstream listings
        #[serde(skip_serializing_if = "Option::is_none")]
        cache_ttl_seconds: Option<u64>,
        /// Retry attempts for failed upstream requests
        #[serde(skip_serializing_if = "Option::is_none")]
        retries: Option<u32>,
    },
}

impl CacheSection {
    /// Refresh window, with negative values clamped to zero
    pub fn ttl(&self) -> Duration {
        let seconds = self.ttl_seconds.unwrap_or(DEFAULT_TTL_SECONDS);
        Duration::from_secs(seconds.max(0) as u64)
    }

    /// Configured root, or `~/.modforge/cache`
    pub fn root_or_default(&self) -> ConfigResult<Utf8PathBuf> {
        if let Some(root) = &self.root {
            return Ok(root.clone());
        }

        let home_dir = dirs::home_dir().ok_or_else(|| ForgeError::ConfigValidation {
            field: "cache.root".to_string(),
            reason: "Could not determine home directory".to_string(),
        })?;
        let home_dir = Utf8PathBuf::try_from(home_dir).map_err(|e| ForgeError::ConfigValidation {
            field: "cache.root".to_string(),
            reason: format!("Invalid home directory path: {}", e),
        })?;
        Ok(home_dir.join(".modforge").join("cache"))
    }
}

impl BackendSpec {
    /// Backend kind as written in `type = "..."`
    pub fn kind(&self) -> &'static str {
        match self {
            BackendSpec::Git { .. } => "git",
            BackendSpec::Directory { .. } => "directory",
            BackendSpec::Proxy { .. } => "proxy",
        }
    }
}

/// Parse TOML string to ModforgeToml configuration
pub fn parse_modforge_toml(content: &str) -> ConfigResult<ModforgeToml> {
    let config: ModforgeToml = toml::from_str(content).map_err(|e| ForgeError::TomlParse {
        message: e.to_string(),
    })?;

    validate_config(&config)?;

    Ok(config)
}

/// Serialize ModforgeToml to TOML string
pub fn serialize_modforge_toml(config: &ModforgeToml) -> ConfigResult<String> {
    toml::to_string_pretty(config).map_err(|e| ForgeError::TomlParse {
        message: format!("TOML serialization error: {}", e),
    })
}

/// Validate configuration completeness
pub fn validate_config(config: &ModforgeToml) -> ConfigResult<()> {
    if config.backends.is_empty() {
        return Err(ForgeError::ConfigValidation {
            field: "backend".to_string(),
            reason: "at least one [[backend]] is required".to_string(),
        });
    }

    for (index, backend) in config.backends.iter().enumerate() {
        validate_backend(index, backend)?;
    }

    Ok(())
}

/// Load and parse modforge.toml from file path
pub async fn load_from_file(path: &Utf8Path) -> ConfigResult<ModforgeToml> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ForgeError::io(format!("Failed to read {}", path), e))?;

    parse_modforge_toml(&content).map_err(|e| match e {
        ForgeError::TomlParse { message } => ForgeError::TomlParse {
            message: format!("In file {}: {}", path, message),
        },
        ForgeError::ConfigValidation { field, reason } => ForgeError::ConfigValidation {
            field,
            reason: format!("{} (in {})", reason, path),
        },
        other => other,
    })
}

fn validate_backend(index: usize, backend: &BackendSpec) -> ConfigResult<()> {
    let invalid = |field: &str, reason: String| ForgeError::ConfigValidation {
        field: format!("backend[{}].{}", index, field),
        reason,
    };

    match backend {
        BackendSpec::Git {
            author,
            name,
            source,
            tag_pattern,
        } => {
            for (field, value) in [("author", author), ("name", name), ("source", source)] {
                if value.trim().is_empty() {
                    return Err(invalid(field, "must not be empty".to_string()));
                }
            }
            if author.contains('/') || name.contains('/') {
                return Err(invalid("name", "author and name must not contain '/'".to_string()));
            }
            if let Some(pattern) = tag_pattern {
                regex::Regex::new(pattern).map_err(|e| invalid("tag_pattern", e.to_string()))?;
            }
        },
        BackendSpec::Directory { path } => {
            if path.as_str().is_empty() {
                return Err(invalid("path", "must not be empty".to_string()));
            }
        },
        BackendSpec::Proxy { url, .. } => {
            let parsed = url::Url::parse(url).map_err(|e| invalid("url", format!("'{}': {}", url, e)))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(invalid("url", format!("unsupported scheme '{}'", parsed.scheme())));
            }
        },
    }

    Ok(())
}
