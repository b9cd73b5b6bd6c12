//! Match result caching
//!
//! Matching walks the route tree and runs a regex per visited route. The
//! router remembers results per stripped pathname, misses included, with LRU
//! eviction.

use crate::matcher::MatchChain;
use crate::trace_log;
use lru::LruCache;
use std::num::NonZeroUsize;

/// Cache performance statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub invalidations: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Pathname to match chain cache with LRU eviction
///
/// Default capacity: 1000 entries. A cached `None` records that nothing
/// matched the pathname.
#[derive(Debug)]
pub struct MatchCache {
    entries: LruCache<String, Option<MatchChain>>,
    stats: CacheStats,
}

impl MatchCache {
    const DEFAULT_CAPACITY: usize = 1000;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// A capacity of 0 is bumped to 1
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(cap),
            stats: CacheStats::default(),
        }
    }

    pub fn clear(&mut self) {
        trace_log!("Clearing match cache");
        self.entries.clear();
        self.stats.invalidations += 1;
    }

    /// Look up a pathname; the outer `None` is a cache miss
    pub fn get(&mut self, pathname: &str) -> Option<Option<MatchChain>> {
        if let Some(entry) = self.entries.get(pathname) {
            self.stats.hits += 1;
            trace_log!("Match cache hit for path: '{}'", pathname);
            Some(entry.clone())
        } else {
            self.stats.misses += 1;
            trace_log!("Match cache miss for path: '{}'", pathname);
            None
        }
    }

    pub fn insert(&mut self, pathname: String, chain: Option<MatchChain>) {
        self.entries.push(pathname, chain);
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MatchCache {
    fn default() -> Self {
        Self::new()
    }
}
