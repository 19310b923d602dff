//! Single-slot cache for the resolved grant table
//!
//! The table is cached whole under one configurable key; there is no
//! row-level invalidation. Callers invalidate by `del()` or by letting
//! the TTL lapse. Racing writers are harmless: resolution is pure, so
//! every write stores a set-equal table.

use crate::model::GrantTable;
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Slot key the table is stored under
    pub key: String,

    /// Time-to-live for the stored table; zero keeps it until deleted
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key: "rbac:grants".to_string(),
            ttl: Duration::ZERO,
        }
    }
}

impl CacheConfig {
    /// Override the slot key
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Override the TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Grant-table cache contract
///
/// Implementations are slot-bound: the key is fixed at construction,
/// the operations address only that slot.
#[async_trait]
pub trait GrantCache: Send + Sync {
    /// Fetch the cached table, if present and not expired
    async fn get(&self) -> Option<GrantTable>;

    /// Store a table with the given TTL (zero = unbounded)
    async fn set(&self, table: GrantTable, ttl: Duration);

    /// Drop the slot
    async fn del(&self);
}

/// Cached table with TTL
#[derive(Clone)]
struct CachedTable {
    table: GrantTable,
    cached_at: Instant,
    ttl: Duration,
}

impl CachedTable {
    fn new(table: GrantTable, ttl: Duration) -> Self {
        Self {
            table,
            cached_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        !self.ttl.is_zero() && self.cached_at.elapsed() > self.ttl
    }
}

/// In-memory grant cache backed by a keyed `DashMap`
///
/// Expiry is lazy: an expired entry is removed on the `get` that
/// observes it.
pub struct MemoryGrantCache {
    entries: DashMap<String, CachedTable>,
    config: CacheConfig,
}

impl MemoryGrantCache {
    /// Create a cache bound to the configured slot key
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
        }
    }
}

impl Default for MemoryGrantCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[async_trait]
impl GrantCache for MemoryGrantCache {
    async fn get(&self) -> Option<GrantTable> {
        if let Some(entry) = self.entries.get(&self.config.key) {
            if entry.is_expired() {
                drop(entry);
                self.entries.remove(&self.config.key);
                return None;
            }
            return Some(entry.table.clone());
        }
        None
    }

    async fn set(&self, table: GrantTable, ttl: Duration) {
        self.entries
            .insert(self.config.key.clone(), CachedTable::new(table, ttl));
    }

    async fn del(&self) {
        self.entries.remove(&self.config.key);
    }
}
