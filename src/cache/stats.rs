//! Cache Statistics Module
//!
//! Tracks cache and namespace activity: hits, misses, evictions, loads.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Counters for a single [`ConcurrentCache`](super::ConcurrentCache).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of lookups
    pub gets: u64,
    /// Number of lookups that found a value
    pub hits: u64,
    /// Number of entries evicted by the LRU policy
    pub evictions: u64,
    /// Current number of entries
    pub items: usize,
    /// Current bytes accounted to keys and values
    pub bytes: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / gets, or 0.0 if nothing has been looked up.
    pub fn hit_rate(&self) -> f64 {
        if self.gets == 0 {
            0.0
        } else {
            self.hits as f64 / self.gets as f64
        }
    }

    // == Record Lookup ==
    pub fn record_hit(&mut self) {
        self.gets += 1;
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.gets += 1;
    }

    // == Update Usage ==
    /// Updates the entry and byte gauges.
    pub fn set_usage(&mut self, items: usize, bytes: usize) {
        self.items = items;
        self.bytes = bytes;
    }
}

// == Namespace Stats ==
/// Live counters for a namespace, updated concurrently by every caller.
#[derive(Debug, Default)]
pub struct NamespaceStats {
    /// Any `get` request, including from peers
    pub gets: AtomicU64,
    /// Served from the local cache
    pub cache_hits: AtomicU64,
    /// Remote fetches that succeeded
    pub peer_loads: AtomicU64,
    /// Remote fetches that failed and fell back
    pub peer_errors: AtomicU64,
    /// Misses that went through the deduplication group
    pub loads: AtomicU64,
    /// Loads that actually ran after deduplication
    pub loads_deduped: AtomicU64,
    /// Successful loader calls
    pub local_loads: AtomicU64,
    /// Failed loader calls
    pub local_load_errs: AtomicU64,
    /// Requests that arrived over the peer protocol
    pub server_requests: AtomicU64,
}

impl NamespaceStats {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> NamespaceStatsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        NamespaceStatsSnapshot {
            gets: load(&self.gets),
            cache_hits: load(&self.cache_hits),
            peer_loads: load(&self.peer_loads),
            peer_errors: load(&self.peer_errors),
            loads: load(&self.loads),
            loads_deduped: load(&self.loads_deduped),
            local_loads: load(&self.local_loads),
            local_load_errs: load(&self.local_load_errs),
            server_requests: load(&self.server_requests),
        }
    }
}

/// Serializable copy of [`NamespaceStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NamespaceStatsSnapshot {
    pub gets: u64,
    pub cache_hits: u64,
    pub peer_loads: u64,
    pub peer_errors: u64,
    pub loads: u64,
    pub loads_deduped: u64,
    pub local_loads: u64,
    pub local_load_errs: u64,
    pub server_requests: u64,
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.gets, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.items, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.gets, 2);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_set_usage() {
        let mut stats = CacheStats::new();
        stats.set_usage(3, 42);
        assert_eq!(stats.items, 3);
        assert_eq!(stats.bytes, 42);
    }

    #[test]
    fn test_namespace_snapshot() {
        let stats = NamespaceStats::default();
        NamespaceStats::incr(&stats.gets);
        NamespaceStats::incr(&stats.gets);
        NamespaceStats::incr(&stats.local_loads);

        let snap = stats.snapshot();
        assert_eq!(snap.gets, 2);
        assert_eq!(snap.local_loads, 1);
        assert_eq!(snap.cache_hits, 0);
    }
}
