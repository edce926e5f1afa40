//! Context Cache
//!
//! Memoizes extracted `ProjectContext` values per project.
//!
//! An entry is served only while it is younger than the TTL **and** its
//! content hash equals the hash the caller computed from fresh raw data, so a
//! project edit is picked up on the next request even inside the TTL window.
//! Eviction is least-recently-inserted: lookups use `peek` and never refresh
//! recency.
//!
//! The cache is never a source of truth. The orchestrator reaches it through
//! the `ContextStore` trait, and `NoopContextStore` disables it entirely.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::model::ProjectContext;
use crate::core::clock::{Clock, SystemClock};

// ============================================================================
// Constants
// ============================================================================

/// Default maximum number of cached projects
pub const DEFAULT_CACHE_CAPACITY: usize = 50;

/// Default entry lifetime (5 minutes)
pub const DEFAULT_TTL_SECONDS: u64 = 300;

// ============================================================================
// CacheConfig
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries before the oldest insertion is evicted
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Entry lifetime in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
}

fn default_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

fn default_ttl() -> u64 {
    DEFAULT_TTL_SECONDS
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }
}

impl CacheConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    pub fn ttl(mut self, seconds: u64) -> Self {
        self.ttl_seconds = seconds;
        self
    }
}

// ============================================================================
// CacheEntry
// ============================================================================

#[derive(Debug, Clone)]
struct CacheEntry {
    context: Arc<ProjectContext>,
    content_hash: String,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_valid(&self, now: DateTime<Utc>, current_hash: &str) -> bool {
        now < self.expires_at && self.content_hash == current_hash
    }
}

// ============================================================================
// CacheStats
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Current number of entries
    pub size: usize,
    /// Entries removed to make room
    pub evictions: u64,
    /// Entries removed explicitly or for being stale
    pub invalidations: u64,
}


// ============================================================================
// ContextStore
// ============================================================================

/// Storage seam for extracted contexts
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Fresh context for the project, if one is cached under `current_hash`
    async fn get(&self, project_id: &str, current_hash: &str) -> Option<Arc<ProjectContext>>;

    async fn put(&self, project_id: &str, context: Arc<ProjectContext>, content_hash: String);

    /// Drop a project's entry; returns whether one existed
    async fn invalidate(&self, project_id: &str) -> bool;

    async fn stats(&self) -> CacheStats;
}

/// A store that never holds anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopContextStore;

#[async_trait]
impl ContextStore for NoopContextStore {
    async fn get(&self, _project_id: &str, _current_hash: &str) -> Option<Arc<ProjectContext>> {
        None
    }

    async fn put(&self, _project_id: &str, _context: Arc<ProjectContext>, _content_hash: String) {}

    async fn invalidate(&self, _project_id: &str) -> bool {
        false
    }

    async fn stats(&self) -> CacheStats {
        CacheStats::default()
    }
}

// ============================================================================
// ContextCache
// ============================================================================

/// TTL + content-hash LRU cache of project contexts
#[derive(Debug)]
pub struct ContextCache {
    entries: RwLock<LruCache<String, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    invalidations: AtomicU64,
}

impl ContextCache {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);
        let ttl_seconds = i64::try_from(config.ttl_seconds).unwrap_or(i64::MAX / 1_000);
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            ttl: Duration::try_seconds(ttl_seconds).unwrap_or(Duration::MAX),
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    /// Remove every entry
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        let removed = entries.len() as u64;
        entries.clear();
        self.invalidations.fetch_add(removed, Ordering::Relaxed);
    }
}

impl Default for ContextCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[async_trait]
impl ContextStore for ContextCache {
    async fn get(&self, project_id: &str, current_hash: &str) -> Option<Arc<ProjectContext>> {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;

        let lookup = entries
            .peek(project_id)
            .map(|entry| entry.is_valid(now, current_hash).then(|| Arc::clone(&entry.context)));

        let valid = match lookup {
            Some(Some(context)) => Some(context),
            Some(None) => {
                entries.pop(project_id);
                self.invalidations.fetch_add(1, Ordering::Relaxed);
                log::debug!("Dropped stale context cache entry for project {}", project_id);
                None
            }
            None => None,
        };

        match valid {
            Some(context) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(context)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    async fn put(&self, project_id: &str, context: Arc<ProjectContext>, content_hash: String) {
        let now = self.clock.now();
        let entry = CacheEntry {
            context,
            content_hash,
            created_at: now,
            expires_at: now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        let mut entries = self.entries.write().await;
        if let Some((evicted_key, _)) = entries.push(project_id.to_string(), entry) {
            if evicted_key != project_id {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                log::debug!("Evicted context cache entry for project {}", evicted_key);
            }
        }
    }

    async fn invalidate(&self, project_id: &str) -> bool {
        let removed = self.entries.write().await.pop(project_id).is_some();
        if removed {
            self.invalidations.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    async fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.entries.read().await.len(),
            evictions: self.evictions.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
