// src/registry/cache.rs

//! Bounded metadata cache
//!
//! Fetched package metadata is cached by `name` or `name@constraint` so that a
//! batch touching the same dependency many times does one registry lookup.
//! "Not found" results are cached too (negative entries) so that a missing
//! package is not re-queried for every root that declares it.
//!
//! Entries expire after a TTL, and when the cache is full the least recently
//! used entry is evicted. The map is mutex-guarded so one cache can be shared
//! by the resolver's worker threads; two threads missing on the same key may
//! both fetch, which only costs a duplicate lookup.

use super::metadata::PackageMetadata;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Result of a cache lookup
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// Metadata is cached
    Hit(Arc<PackageMetadata>),
    /// The package was recently looked up and not found
    Negative,
    /// Nothing cached (or the entry expired)
    Miss,
}

#[derive(Debug)]
struct CacheEntry {
    value: Option<Arc<PackageMetadata>>,
    inserted_at: Instant,
    /// Logical clock tick of the last access, for LRU eviction
    last_used: u64,
}

/// Metadata cache with capacity bound and TTL
#[derive(Debug)]
pub struct MetadataCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    capacity: usize,
    ttl: Duration,
    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl MetadataCache {
    /// Create a cache holding at most `capacity` entries for `ttl` each
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            ttl,
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Cache key for a lookup: `name` or `name@constraint`
    pub fn key(name: &str, constraint: Option<&str>) -> String {
        match constraint {
            Some(c) => format!("{}@{}", name, c),
            None => name.to_string(),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    pub fn get(&self, key: &str) -> CacheLookup {
        let mut entries = self.entries.lock();
        let expired = match entries.get_mut(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                entry.last_used = self.tick();
                self.hits.fetch_add(1, Ordering::Relaxed);
                return match entry.value {
                    Some(ref meta) => CacheLookup::Hit(Arc::clone(meta)),
                    None => CacheLookup::Negative,
                };
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        CacheLookup::Miss
    }

    /// Store metadata, or `None` to record a negative result
    pub fn insert(&self, key: String, value: Option<Arc<PackageMetadata>>) {
        let mut entries = self.entries.lock();

        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let ttl = self.ttl;
            let before = entries.len();
            entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
            let mut evicted = (before - entries.len()) as u64;

            if entries.len() >= self.capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.last_used)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    debug!("Evicting metadata cache entry {}", oldest);
                    entries.remove(&oldest);
                    evicted += 1;
                }
            }
            self.evictions.fetch_add(evicted, Ordering::Relaxed);
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                last_used: self.tick(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        CacheStats {
            entries: entries.len(),
            negative_entries: entries.values().filter(|e| e.value.is_none()).count(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

/// Statistics for the metadata cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub negative_entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}
