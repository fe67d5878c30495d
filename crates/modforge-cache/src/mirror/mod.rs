//! Staleness-bounded bare mirror of one remote git repository
//!
//! A `VersionSource` clones its remote lazily on first access and afterwards
//! fetches tags at most once per TTL window. The fetch clock is the
//! modification time of the marker file inside the mirror, so freshness
//! survives process restarts.
//!
//! Every operation that touches the mirror (clone, fetch, clear, tag listing,
//! file reads, checkouts) runs under one async mutex owned by the source.
//! Clones, fetches and clears run in a spawned task that owns the lock
//! guard, so a cancelled request never abandons a mirror mid-mutation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use modforge_core::error::ForgeError;
use modforge_core::utils::{is_safe_path, short_digest};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::git::{GitError, GitTransport};
use crate::CacheResult;

/// Default refresh window
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Marker file whose mtime records the last successful clone or fetch
pub const FETCH_MARKER: &str = "FETCH_HEAD";

const MIRROR_DIR: &str = "mirror.git";

/// One tag's file, as returned by [`VersionSource::read_each_tag`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedFile {
    pub tag: String,
    /// Path that was found and its content, `None` when no candidate exists
    pub found: Option<(String, Vec<u8>)>,
}

/// Local bare mirror of one remote repository, shared across requests
#[derive(Debug, Clone)]
pub struct VersionSource {
    inner: Arc<MirrorInner>,
}

#[derive(Debug)]
struct MirrorInner {
    source_url: String,
    cache_path: PathBuf,
    git_dir: PathBuf,
    ttl: Duration,
    transport: Arc<dyn GitTransport>,
    lock: Arc<Mutex<()>>,
}

impl VersionSource {
    /// Mirror `source_url` into `cache_path`
    pub fn new(
        source_url: impl Into<String>,
        cache_path: impl Into<PathBuf>,
        ttl: Duration,
        transport: Arc<dyn GitTransport>,
    ) -> Self {
        let cache_path = cache_path.into();
        let git_dir = cache_path.join(MIRROR_DIR);
        Self {
            inner: Arc::new(MirrorInner {
                source_url: source_url.into(),
                cache_path,
                git_dir,
                ttl,
                transport,
                lock: Arc::new(Mutex::new(())),
            }),
        }
    }

    /// Mirror `source_url` into a directory under `cache_root` named after the URL's digest
    pub fn under_cache_root(
        cache_root: &Path,
        source_url: impl Into<String>,
        ttl: Duration,
        transport: Arc<dyn GitTransport>,
    ) -> Self {
        let source_url = source_url.into();
        let cache_path = cache_root.join(short_digest(source_url.as_bytes(), 16));
        Self::new(source_url, cache_path, ttl, transport)
    }

    pub fn source_url(&self) -> &str {
        &self.inner.source_url
    }

    /// Directory owned by this source (mirror plus staging space)
    pub fn cache_path(&self) -> &Path {
        &self.inner.cache_path
    }

    /// The bare mirror itself
    pub fn mirror_path(&self) -> &Path {
        &self.inner.git_dir
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Whether both handles serialize on the same lock
    pub fn shares_mirror_with(&self, other: &VersionSource) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// All tags in the mirror, in git's listing order
    pub async fn list_tags(&self) -> CacheResult<Vec<String>> {
        let _guard = self.refreshed().await?;
        self.inner.tags().await
    }

    /// Content of `path` as it was at `tag`
    pub async fn read_file(&self, tag: &str, path: &str) -> CacheResult<Vec<u8>> {
        if !is_safe_path(Path::new(path)) {
            return Err(ForgeError::not_found(format!("{} at tag {}", path, tag)));
        }

        let _guard = self.refreshed().await?;
        self.inner.require_tag(tag).await?;

        self.inner
            .show(tag, path)
            .await?
            .ok_or_else(|| ForgeError::not_found(format!("{} at tag {}", path, tag)))
    }

    /// For each tag picked by `select`, the first of `paths` present at that tag
    ///
    /// The whole batch shares one refresh and one tag listing. `select` sees
    /// every tag in listing order and returns the tags to read, in the order
    /// the results come back; names that are not tags are dropped.
    pub async fn read_each_tag<F>(&self, paths: &[&str], select: F) -> CacheResult<Vec<TaggedFile>>
    where
        F: FnOnce(&[String]) -> Vec<String>,
    {
        let _guard = self.refreshed().await?;
        let tags = self.inner.tags().await?;

        let mut files = Vec::new();
        for tag in select(&tags) {
            if !tags.contains(&tag) {
                continue;
            }
            let mut found = None;
            for path in paths.iter().filter(|path| is_safe_path(Path::new(path))) {
                if let Some(content) = self.inner.show(&tag, path).await? {
                    found = Some((path.to_string(), content));
                    break;
                }
            }
            files.push(TaggedFile { tag, found });
        }
        Ok(files)
    }

    /// Check `tag` out into a private temporary directory and run `body` on it
    ///
    /// The directory is removed before this returns, whether `body` succeeds,
    /// fails, or the future is dropped.
    pub async fn materialize<T, F>(&self, tag: &str, body: F) -> CacheResult<T>
    where
        F: FnOnce(&Path) -> CacheResult<T>,
    {
        let checkout = {
            let _guard = self.refreshed().await?;
            self.inner.require_tag(tag).await?;

            let checkout = tempfile::Builder::new()
                .prefix("modforge-checkout-")
                .tempdir()
                .map_err(|e| ForgeError::io("Failed to create checkout directory".to_string(), e))?;
            let work_tree = format!("--work-tree={}", checkout.path().display());
            let args = self.inner.git_args(&[
                &work_tree,
                "checkout",
                "--force",
                "--quiet",
                &format!("refs/tags/{}", tag),
            ]);
            match self.inner.transport.run(&args, Some(checkout.path())).await {
                Ok(_) => {},
                Err(GitError::Failed { .. }) => {
                    return Err(ForgeError::not_found(format!("tag {}", tag)));
                },
                Err(e) => return Err(self.inner.unavailable("checkout", e)),
            }
            checkout
        };

        debug!(tag, dir = %checkout.path().display(), "materialized tag");
        let result = body(checkout.path());
        let removed = checkout
            .close()
            .map_err(|e| ForgeError::io("Failed to remove checkout directory".to_string(), e));
        let value = result?;
        removed?;
        Ok(value)
    }

    /// Delete the mirror; the next access clones it again
    pub async fn clear(&self) -> CacheResult<()> {
        let guard = self.inner.lock.clone().lock_owned().await;
        let inner = Arc::clone(&self.inner);
        self.run_exclusive(guard, async move { inner.remove_mirror().await })
            .await
            .map(|_guard| ())
    }

    /// Take the lock and bring the mirror up to date, returning the held lock
    async fn refreshed(&self) -> CacheResult<OwnedMutexGuard<()>> {
        let guard = self.inner.lock.clone().lock_owned().await;
        let inner = Arc::clone(&self.inner);
        self.run_exclusive(guard, async move { inner.ensure_fresh().await })
            .await
    }

    /// Run a mirror mutation to completion on its own task, even if the caller goes away
    async fn run_exclusive<F>(
        &self,
        guard: OwnedMutexGuard<()>,
        mutation: F,
    ) -> CacheResult<OwnedMutexGuard<()>>
    where
        F: std::future::Future<Output = CacheResult<()>> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let result = mutation.await;
            (guard, result)
        });
        let (guard, result) = task.await.map_err(|e| ForgeError::SourceUnavailable {
            source_url: self.inner.source_url.clone(),
            message: "mirror task did not complete".to_string(),
            source: Some(Box::new(e)),
        })?;
        result?;
        Ok(guard)
    }
}

impl MirrorInner {
    async fn ensure_fresh(&self) -> CacheResult<()> {
        if !self.mirror_exists().await {
            return self.create_mirror().await;
        }

        let last_fetch = self.last_fetch().await;
        if self.is_stale(last_fetch) {
            self.fetch_tags().await
        } else {
            debug!(source = %self.source_url, "mirror is fresh, skipping fetch");
            Ok(())
        }
    }

    async fn mirror_exists(&self) -> bool {
        tokio::fs::metadata(&self.git_dir)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }

    /// Clone into a staging directory and move it into place only on success
    async fn create_mirror(&self) -> CacheResult<()> {
        tokio::fs::create_dir_all(&self.cache_path)
            .await
            .map_err(|e| ForgeError::io("Failed to create mirror cache directory".to_string(), e))?;
        let staging = tempfile::Builder::new()
            .prefix(".clone-")
            .tempdir_in(&self.cache_path)
            .map_err(|e| ForgeError::io("Failed to create clone staging directory".to_string(), e))?;
        let target = staging.path().join(MIRROR_DIR);

        info!(source = %self.source_url, "cloning mirror");
        let args = vec![
            "clone".to_string(),
            "--bare".to_string(),
            "--quiet".to_string(),
            self.source_url.clone(),
            target.display().to_string(),
        ];
        self.transport
            .run(&args, None)
            .await
            .map_err(|e| self.unavailable("clone", e))?;

        if let Err(e) = tokio::fs::rename(&target, &self.git_dir).await {
            // Another process finished its clone of the same source first
            if !self.mirror_exists().await {
                return Err(ForgeError::io("Failed to move cloned mirror into place".to_string(), e));
            }
            debug!(source = %self.source_url, "mirror appeared during clone, keeping it");
        }
        self.touch_marker().await
    }

    async fn fetch_tags(&self) -> CacheResult<()> {
        info!(source = %self.source_url, "fetching tags");
        let args = self.git_args(&["fetch", "--tags", "--force", "--quiet"]);
        self.transport
            .run(&args, None)
            .await
            .map_err(|e| self.unavailable("fetch", e))?;
        self.touch_marker().await
    }

    async fn remove_mirror(&self) -> CacheResult<()> {
        match tokio::fs::remove_dir_all(&self.cache_path).await {
            Ok(()) => {
                info!(source = %self.source_url, "cleared mirror");
                Ok(())
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ForgeError::io("Failed to clear mirror".to_string(), e)),
        }
    }

    fn marker_path(&self) -> PathBuf {
        self.git_dir.join(FETCH_MARKER)
    }

    async fn touch_marker(&self) -> CacheResult<()> {
        let stamp = chrono::Utc::now().to_rfc3339();
        tokio::fs::write(self.marker_path(), stamp)
            .await
            .map_err(|e| ForgeError::io("Failed to record fetch time".to_string(), e))
    }

    /// Marker mtime, or the epoch when there is no marker
    async fn last_fetch(&self) -> SystemTime {
        tokio::fs::metadata(self.marker_path())
            .await
            .and_then(|meta| meta.modified())
            .unwrap_or(UNIX_EPOCH)
    }

    fn is_stale(&self, last_fetch: SystemTime) -> bool {
        if self.ttl.is_zero() {
            return true;
        }
        match last_fetch.elapsed() {
            Ok(elapsed) => elapsed > self.ttl,
            Err(_) => true, // Clock went backwards, consider stale
        }
    }

    async fn tags(&self) -> CacheResult<Vec<String>> {
        let output = self
            .transport
            .run(&self.git_args(&["tag"]), None)
            .await
            .map_err(|e| self.unavailable("tag", e))?;
        Ok(String::from_utf8_lossy(&output)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn require_tag(&self, tag: &str) -> CacheResult<()> {
        if self.tags().await?.iter().any(|t| t == tag) {
            Ok(())
        } else {
            Err(ForgeError::not_found(format!("tag {}", tag)))
        }
    }

    /// `git show` of one path at one tag, `None` when it does not exist there
    async fn show(&self, tag: &str, path: &str) -> CacheResult<Option<Vec<u8>>> {
        let args = self.git_args(&["show", &format!("refs/tags/{}:{}", tag, path)]);
        match self.transport.run(&args, None).await {
            Ok(content) => Ok(Some(content)),
            Err(GitError::Failed { .. }) => Ok(None),
            Err(e) => Err(self.unavailable("show", e)),
        }
    }

    fn git_args(&self, rest: &[&str]) -> Vec<String> {
        let mut args = Vec::with_capacity(rest.len() + 1);
        args.push(format!("--git-dir={}", self.git_dir.display()));
        args.extend(rest.iter().map(|s| s.to_string()));
        args
    }

    fn unavailable(&self, action: &str, error: GitError) -> ForgeError {
        ForgeError::SourceUnavailable {
            source_url: self.source_url.clone(),
            message: format!("git {} failed", action),
            source: Some(Box::new(error)),
        }
    }
}
