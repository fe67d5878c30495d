//! Upstream release listings with TTL

use dashmap::DashMap;
use modforge_core::types::ModuleIdentity;
use std::time::{Duration, SystemTime};

use crate::api::ReleaseEntry;

/// Default lifetime of a cached listing
pub const DEFAULT_METADATA_TTL: Duration = Duration::from_secs(300);

/// Cache entry with TTL
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Releases the upstream listed for the module
    pub releases: Vec<ReleaseEntry>,
    /// When the entry was stored
    pub stored_at: SystemTime,
}

impl CacheEntry {
    fn new(releases: Vec<ReleaseEntry>) -> Self {
        Self {
            releases,
            stored_at: SystemTime::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        match self.stored_at.elapsed() {
            Ok(elapsed) => elapsed < ttl,
            Err(_) => false, // Clock went backwards, consider stale
        }
    }
}

/// In-memory per-module cache of upstream release listings
#[derive(Debug)]
pub struct ReleaseCache {
    entries: DashMap<ModuleIdentity, CacheEntry>,
    ttl: Duration,
}

impl ReleaseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached listing if still fresh
    pub fn get(&self, identity: &ModuleIdentity) -> Option<Vec<ReleaseEntry>> {
        let fresh = {
            let entry = self.entries.get(identity)?;
            entry.is_fresh(self.ttl).then(|| entry.releases.clone())
        };
        if fresh.is_none() {
            // Remove stale entry
            self.entries.remove(identity);
        }
        fresh
    }

    pub fn insert(&self, identity: ModuleIdentity, releases: Vec<ReleaseEntry>) {
        self.entries.insert(identity, CacheEntry::new(releases));
    }

    pub fn remove(&self, identity: &ModuleIdentity) {
        self.entries.remove(identity);
    }

    /// Clear all cached entries
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ReleaseCache {
    fn default() -> Self {
        Self::new(DEFAULT_METADATA_TTL)
    }
}
