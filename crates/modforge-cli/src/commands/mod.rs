//! Command implementations and dispatch logic.
//!
//! Every command runs against a `CommandContext` holding the loaded
//! configuration and the backends it describes, in precedence order.

use camino::{Utf8Path, Utf8PathBuf};
use modforge_cache::{GitTransport, SystemGit, VersionSource};
use modforge_config::toml::validate_config;
use modforge_config::{BackendSpec, ConfigLayering, ConfigLoader, ConfigSource, ModforgeToml};
use modforge_core::error::{ForgeError, ForgeResult};
use modforge_core::types::ModuleIdentity;
use modforge_registry::proxy::DEFAULT_METADATA_TTL;
use modforge_registry::{
    DirectoryBackend, ForgeBackend, ForgeMultiplexer, GitBackend, ProxyBackend, RetryConfig, TagPattern,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub mod check;
pub mod clear_cache;
pub mod download;
pub mod list;
pub mod metadata;
pub mod releases;

#[cfg(test)]
mod tests;

use crate::{output::OutputHandler, Commands};

/// Shared context for all commands
pub struct CommandContext {
    pub config: ModforgeToml,
    /// `None` when the configuration was built in memory
    pub source: Option<ConfigSource>,
    pub forge: ForgeMultiplexer,
    pub output: OutputHandler,
}

impl CommandContext {
    /// Load, layer and validate the configuration, then build its backends
    pub async fn load(explicit: Option<&Utf8Path>) -> ForgeResult<Self> {
        let loader = ConfigLoader::from_current_dir()?;
        let (config, source) = loader.load(explicit).await?;
        let config = ConfigLayering::from_env().apply(config)?;
        info!(config = %source.path(), "loaded configuration");

        let mut ctx = Self::from_config(config, OutputHandler::new())?;
        ctx.source = Some(source);
        Ok(ctx)
    }

    /// Build a context from an already loaded configuration
    pub fn from_config(config: ModforgeToml, output: OutputHandler) -> ForgeResult<Self> {
        validate_config(&config)?;
        let forge = build_forge(&config)?;
        Ok(Self {
            config,
            source: None,
            forge,
            output,
        })
    }
}

/// One `VersionSource` per git URL
///
/// Backends naming the same repository share its mirror directory, so they
/// must also share the handle that serializes access to it.
#[derive(Debug)]
pub(crate) struct MirrorPool {
    cache_root: Utf8PathBuf,
    ttl: Duration,
    transport: Arc<dyn GitTransport>,
    sources: HashMap<String, VersionSource>,
}

impl MirrorPool {
    pub(crate) fn new(cache_root: Utf8PathBuf, ttl: Duration, transport: Arc<dyn GitTransport>) -> Self {
        Self {
            cache_root,
            ttl,
            transport,
            sources: HashMap::new(),
        }
    }

    /// The source for `url`, created on first request
    pub(crate) fn source(&mut self, url: &str) -> VersionSource {
        let Self {
            cache_root,
            ttl,
            transport,
            sources,
        } = self;
        sources
            .entry(url.to_string())
            .or_insert_with(|| {
                VersionSource::under_cache_root(cache_root.as_std_path(), url, *ttl, Arc::clone(transport))
            })
            .clone()
    }
}

/// Turn each `[[backend]]` entry into a backend, keeping file order
pub fn build_forge(config: &ModforgeToml) -> ForgeResult<ForgeMultiplexer> {
    build_forge_with(config, Arc::new(SystemGit::new()))
}

/// `build_forge` over a specific git transport
pub(crate) fn build_forge_with(config: &ModforgeToml, transport: Arc<dyn GitTransport>) -> ForgeResult<ForgeMultiplexer> {
    let mut mirrors = MirrorPool::new(config.cache.root_or_default()?, config.cache.ttl(), transport);

    let mut forge = ForgeMultiplexer::new();
    for spec in &config.backends {
        let backend: Arc<dyn ForgeBackend> = match spec {
            BackendSpec::Git {
                author,
                name,
                source,
                tag_pattern,
            } => {
                let identity = ModuleIdentity::new(author.as_str(), name.as_str());
                let mirror = mirrors.source(source);
                let tags = match tag_pattern {
                    Some(pattern) => TagPattern::new(pattern)?,
                    None => TagPattern::default(),
                };
                Arc::new(GitBackend::new(identity, mirror, tags))
            },
            BackendSpec::Directory { path } => Arc::new(DirectoryBackend::new(path.as_std_path())?),
            BackendSpec::Proxy {
                url,
                cache_ttl_seconds,
                retries,
            } => {
                let mut retry = RetryConfig::default();
                if let Some(retries) = retries {
                    retry.max_retries = *retries;
                }
                let cache_ttl = cache_ttl_seconds.map(Duration::from_secs).unwrap_or(DEFAULT_METADATA_TTL);
                Arc::new(ProxyBackend::with_config(url, retry, cache_ttl)?)
            },
        };
        debug!(backend = %backend.describe(), "configured backend");
        forge.add_backend(backend);
    }

    Ok(forge)
}

/// Parse an `author/name` argument
pub fn parse_module(input: &str) -> ForgeResult<ModuleIdentity> {
    ModuleIdentity::parse(input).map_err(|e| ForgeError::ConfigValidation {
        field: "module".to_string(),
        reason: e.to_string(),
    })
}

/// Pretty JSON for documents printed to stdout
pub(crate) fn render_json<T: Serialize + ?Sized>(value: &T) -> ForgeResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ForgeError::io("Failed to render JSON document".to_string(), e.into()))
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> ForgeResult<()> {
    match command {
        Commands::Releases { module } => {
            info!("Resolving releases of {}", module);
            releases::execute(&module, ctx).await
        },
        Commands::Metadata { module } => {
            info!("Fetching metadata of {}", module);
            metadata::execute(&module, ctx).await
        },
        Commands::List => {
            info!("Listing every release");
            list::execute(ctx).await
        },
        Commands::Download {
            module,
            version,
            output,
        } => {
            info!("Downloading {} {}", module, version);
            download::execute(&module, &version, output.as_deref(), ctx).await
        },
        Commands::ClearCache { module } => {
            info!("Clearing cache (module: {:?})", module);
            clear_cache::execute(module.as_deref(), ctx).await
        },
        Commands::Check => {
            info!("Checking configuration");
            check::execute(ctx).await
        },
    }
}
