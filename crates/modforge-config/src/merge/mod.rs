//! Configuration lookup and environment overrides

use camino::{Utf8Path, Utf8PathBuf};
use modforge_core::error::ForgeError;
use std::collections::HashMap;

use crate::toml::{ModforgeToml, CONFIG_FILE_NAME};
use crate::ConfigResult;

/// Overrides `[cache] root`
pub const ENV_CACHE_ROOT: &str = "MODFORGE_CACHE_ROOT";
/// Overrides `[cache] ttl_seconds`
pub const ENV_CACHE_TTL: &str = "MODFORGE_CACHE_TTL";

/// Main configuration loading interface
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
}

/// Where the loaded configuration came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Path given on the command line
    Explicit(Utf8PathBuf),
    /// modforge.toml found from the working directory
    Discovered(Utf8PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> &Utf8Path {
        match self {
            ConfigSource::Explicit(path) | ConfigSource::Discovered(path) => path,
        }
    }
}

/// Environment layer applied on top of the file
#[derive(Debug, Clone, Default)]
pub struct ConfigLayering {
    env_overrides: HashMap<String, String>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self { cwd }
    }

    /// Loader rooted at the process working directory
    pub fn from_current_dir() -> ConfigResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| ForgeError::io("Failed to read current directory".to_string(), e))?;
        let cwd = Utf8PathBuf::try_from(cwd).map_err(|e| ForgeError::ConfigValidation {
            field: "cwd".to_string(),
            reason: format!("Working directory is not valid UTF-8: {}", e),
        })?;
        Ok(Self::new(cwd))
    }

    /// Load `explicit` if given, otherwise the nearest modforge.toml
    pub async fn load(&self, explicit: Option<&Utf8Path>) -> ConfigResult<(ModforgeToml, ConfigSource)> {
        let source = match explicit {
            Some(path) => ConfigSource::Explicit(self.cwd.join(path)),
            None => {
                let path = self.resolve_config_path(CONFIG_FILE_NAME)?;
                if !path.exists() {
                    return Err(ForgeError::ConfigValidation {
                        field: "config".to_string(),
                        reason: format!(
                            "No {} found in current directory or parent directories",
                            CONFIG_FILE_NAME
                        ),
                    });
                }
                ConfigSource::Discovered(path)
            },
        };

        let config = crate::toml::load_from_file(source.path()).await?;
        Ok((config, source))
    }

    /// Find configuration file in project (walks up directory tree)
    pub fn resolve_config_path(&self, filename: &str) -> ConfigResult<Utf8PathBuf> {
        let mut current = self.cwd.as_path();

        loop {
            let config_path = current.join(filename);
            if config_path.exists() {
                return Ok(config_path);
            }

            // Move up one directory
            if let Some(parent) = current.parent() {
                current = parent;
            } else {
                // Reached filesystem root
                break;
            }
        }

        // Return path in current directory even if it doesn't exist
        Ok(self.cwd.join(filename))
    }
}

impl ConfigLayering {
    pub fn new(env_overrides: HashMap<String, String>) -> Self {
        Self { env_overrides }
    }

    /// Layer built from the process environment
    pub fn from_env() -> Self {
        Self::new(Self::collect_env_overrides())
    }

    /// Apply environment overrides to a loaded configuration
    pub fn apply(&self, mut config: ModforgeToml) -> ConfigResult<ModforgeToml> {
        for (key, value) in &self.env_overrides {
            match key.as_str() {
                ENV_CACHE_ROOT => {
                    config.cache.root = Some(Utf8PathBuf::from(value));
                },
                ENV_CACHE_TTL => {
                    let seconds = value.trim().parse::<i64>().map_err(|e| ForgeError::ConfigValidation {
                        field: ENV_CACHE_TTL.to_string(),
                        reason: format!("Invalid number of seconds '{}': {}", value, e),
                    })?;
                    config.cache.ttl_seconds = Some(seconds);
                },
                _ => {
                    // Unknown environment variable, ignore
                },
            }
        }

        Ok(config)
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars().filter(|(key, _)| key.starts_with("MODFORGE_")).collect()
    }
}
