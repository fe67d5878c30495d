//! Backend forwarding to an upstream forge over HTTP

mod cache;
mod retry;

pub use cache::{ReleaseCache, DEFAULT_METADATA_TTL};
pub use retry::RetryConfig;

use async_trait::async_trait;
use modforge_core::error::ForgeError;
use modforge_core::types::{ArchiveHandle, ModuleIdentity, Release};
use reqwest::{Client, ClientBuilder, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::api::{ReleaseEntry, ReleasesResponse};
use crate::backend::ForgeBackend;
use crate::RegistryResult;
use retry::with_retry;

/// Releases endpoint, relative to the forge's base URL
const RELEASES_PATH: &str = "api/v1/releases.json";

/// An upstream forge speaking the releases API
#[derive(Debug)]
pub struct ProxyBackend {
    /// Underlying HTTP client with connection pooling
    client: Client,
    /// Forge base URL, always ending in `/`
    base_url: Url,
    retry_config: RetryConfig,
    cache: ReleaseCache,
}

impl ProxyBackend {
    /// Proxy `url` with default retry and cache settings
    pub fn new(url: &str) -> RegistryResult<Self> {
        Self::with_config(url, RetryConfig::default(), DEFAULT_METADATA_TTL)
    }

    /// Proxy `url` with custom retry policy and listing cache lifetime
    pub fn with_config(url: &str, retry_config: RetryConfig, cache_ttl: Duration) -> RegistryResult<Self> {
        let mut base_url = Url::parse(url).map_err(|e| ForgeError::ConfigValidation {
            field: "url".to_string(),
            reason: format!("'{}' is not a valid URL: {}", url, e),
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = ClientBuilder::new()
            // Connection pooling configuration
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            // Request timeout
            .timeout(Duration::from_secs(30))
            .gzip(true)
            .user_agent(concat!("modforge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ForgeError::network(format!("Failed to create HTTP client: {}", e), e))?;

        Ok(Self {
            client,
            base_url,
            retry_config,
            cache: ReleaseCache::new(cache_ttl),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Releases of `identity`, from the cache or the upstream
    async fn release_entries(&self, identity: &ModuleIdentity) -> RegistryResult<Vec<ReleaseEntry>> {
        if let Some(entries) = self.cache.get(identity) {
            debug!(module = %identity, "upstream listing cache hit");
            return Ok(entries);
        }

        let entries = self.fetch_releases(identity).await?;
        self.cache.insert(identity.clone(), entries.clone());
        Ok(entries)
    }

    /// Fetch the releases document for `identity` with retry logic
    async fn fetch_releases(&self, identity: &ModuleIdentity) -> RegistryResult<Vec<ReleaseEntry>> {
        let mut url = self.endpoint(RELEASES_PATH)?;
        url.query_pairs_mut().append_pair("module", &identity.full_name());
        info!(module = %identity, %url, "querying upstream forge");

        with_retry(&self.retry_config, || async {
            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| ForgeError::network(format!("Failed to query {}: {}", url, e), e))?;

            match response.status() {
                StatusCode::OK => {
                    let mut document = response.json::<ReleasesResponse>().await.map_err(|e| {
                        ForgeError::network(format!("Failed to parse releases from {}: {}", url, e), e)
                    })?;
                    Ok(document.shift_remove(&identity.full_name()).unwrap_or_default())
                },
                StatusCode::NOT_FOUND | StatusCode::GONE => Ok(Vec::new()),
                status => Err(ForgeError::Network {
                    message: format!("Upstream forge returned status {} for {}", status, identity),
                    source: None,
                }),
            }
        })
        .await
    }

    /// Download a release archive; `None` when the upstream no longer has it
    async fn download(&self, file: &str) -> RegistryResult<Option<Vec<u8>>> {
        let url = match Url::parse(file) {
            Ok(absolute) => absolute,
            Err(_) => self.endpoint(file.trim_start_matches('/'))?,
        };
        info!(%url, "downloading from upstream forge");

        with_retry(&self.retry_config, || async {
            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| ForgeError::network(format!("Failed to download {}: {}", url, e), e))?;

            match response.status() {
                status if status.is_success() => {
                    let bytes = response
                        .bytes()
                        .await
                        .map_err(|e| ForgeError::network(format!("Failed to read {}: {}", url, e), e))?;
                    Ok(Some(bytes.to_vec()))
                },
                StatusCode::NOT_FOUND | StatusCode::GONE => Ok(None),
                status => Err(ForgeError::Network {
                    message: format!("Failed to download {}: status {}", url, status),
                    source: None,
                }),
            }
        })
        .await
    }

    fn endpoint(&self, relative: &str) -> RegistryResult<Url> {
        self.base_url.join(relative).map_err(|e| ForgeError::ConfigValidation {
            field: "url".to_string(),
            reason: format!("cannot build upstream URL for '{}': {}", relative, e),
        })
    }
}

#[async_trait]
impl ForgeBackend for ProxyBackend {
    fn describe(&self) -> String {
        format!("proxy {}", self.base_url)
    }

    async fn get_module(&self, identity: &ModuleIdentity, version: &str) -> RegistryResult<Option<ArchiveHandle>> {
        let entries = self.release_entries(identity).await?;
        let Some(entry) = entries.iter().find(|entry| entry.version == version) else {
            return Ok(None);
        };

        let file_name = format!("{}-{}.tar.gz", identity.dashed_name(), version);
        Ok(self
            .download(&entry.file)
            .await?
            .map(|bytes| ArchiveHandle::new(file_name, bytes)))
    }

    async fn get_metadata(&self, identity: &ModuleIdentity) -> RegistryResult<Vec<Release>> {
        let entries = self.release_entries(identity).await?;
        Ok(entries
            .iter()
            .filter_map(|entry| match entry.to_release(identity) {
                Ok(release) => Some(release),
                Err(e) => {
                    warn!(module = %identity, version = %entry.version, error = %e, "skipping upstream release");
                    None
                },
            })
            .collect())
    }

    /// An upstream forge cannot be enumerated
    async fn get_all_metadata(&self) -> RegistryResult<Vec<Release>> {
        Ok(Vec::new())
    }

    async fn clear_cache(&self, identity: Option<&ModuleIdentity>) -> RegistryResult<()> {
        match identity {
            Some(identity) => self.cache.remove(identity),
            None => self.cache.clear(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
