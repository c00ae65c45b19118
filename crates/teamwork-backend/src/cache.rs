//! Resolution cache
//!
//! Memoises resolved permission sets per (principal, object). Each entry
//! records the store revision it was computed at; a lookup at a different
//! revision is a miss and drops the entry.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use teamwork_org::{ContentRef, PrincipalKey};
use teamwork_rbac::PermissionSet;
use tracing::{debug, trace};

/// Cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Everything about the principal resolution depends on
    pub principal: PrincipalKey,
    /// The queried object
    pub object: ContentRef,
}

impl CacheKey {
    /// Create a cache key.
    pub fn new(principal: PrincipalKey, object: ContentRef) -> Self {
        Self { principal, object }
    }
}

#[derive(Debug)]
struct CacheEntry {
    revision: u64,
    permissions: PermissionSet,
}

/// Cache statistics.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to resolve
    pub misses: u64,
    /// Entries currently held
    pub entries: usize,
    /// Maximum entries held
    pub capacity: usize,
}

impl CacheStats {
    /// Fraction of lookups answered from the cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Concurrent permission cache.
#[derive(Debug)]
pub struct PermissionCache {
    entries: DashMap<CacheKey, CacheEntry>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PermissionCache {
    /// Create a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a resolution computed at `revision`.
    pub fn get(&self, key: &CacheKey, revision: u64) -> Option<PermissionSet> {
        if let Some(entry) = self.entries.get(key) {
            if entry.revision == revision {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.permissions.clone());
            }
            drop(entry);
            trace!(object = %key.object, "Dropping stale cache entry");
            self.entries
                .remove_if(key, |_, entry| entry.revision != revision);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store a resolution computed at `revision`.
    pub fn insert(&self, key: CacheKey, revision: u64, permissions: PermissionSet) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            self.evict(revision);
        }
        self.entries.insert(
            key,
            CacheEntry {
                revision,
                permissions,
            },
        );
    }

    /// Make room: drop entries from older revisions, or everything if all
    /// entries are current.
    fn evict(&self, revision: u64) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.revision == revision);
        if self.entries.len() >= self.capacity {
            self.entries.clear();
        }
        debug!(
            before,
            after = self.entries.len(),
            capacity = self.capacity,
            "Evicted permission cache entries"
        );
    }

    /// Drop every entry.
    pub fn invalidate(&self) {
        self.entries.clear();
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
            capacity: self.capacity,
        }
    }
}
