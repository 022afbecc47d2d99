//! Concurrent Cache Module
//!
//! Mutex-serialized wrapper around the LRU store, allocated on first write.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{ByteView, CacheStats, LruStore};

/// Storage is only allocated once something is written.
#[derive(Debug)]
enum CacheState {
    Uninitialized,
    Ready(LruStore<ByteView>),
}

#[derive(Debug)]
struct Inner {
    state: CacheState,
    stats: CacheStats,
}

// == Concurrent Cache ==
/// Thread-safe byte-budgeted LRU cache of [`ByteView`] values.
///
/// Every operation takes the single lock for its full duration. The lock is
/// never held across an await point.
#[derive(Debug)]
pub struct ConcurrentCache {
    cache_bytes: usize,
    inner: Mutex<Inner>,
    evictions: Arc<AtomicU64>,
}

impl ConcurrentCache {
    // == Constructor ==
    /// Creates an empty cache with a byte budget (0 = unbounded).
    pub fn new(cache_bytes: usize) -> Self {
        Self {
            cache_bytes,
            inner: Mutex::new(Inner {
                state: CacheState::Uninitialized,
                stats: CacheStats::new(),
            }),
            evictions: Arc::new(AtomicU64::new(0)),
        }
    }

    // == Get ==
    /// Looks up a key, marking it most recently used on a hit.
    pub fn get(&self, key: &str) -> Option<ByteView> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let found = match &mut inner.state {
            CacheState::Uninitialized => None,
            CacheState::Ready(lru) => lru.get(key).cloned(),
        };

        match found {
            Some(_) => inner.stats.record_hit(),
            None => inner.stats.record_miss(),
        }
        found
    }

    // == Add ==
    /// Inserts or replaces a value, evicting older entries as needed.
    pub fn add(&self, key: String, value: ByteView) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        if let CacheState::Uninitialized = inner.state {
            let evictions = Arc::clone(&self.evictions);
            inner.state = CacheState::Ready(LruStore::with_on_evicted(
                self.cache_bytes,
                Box::new(move |key: &str, value: &ByteView| {
                    evictions.fetch_add(1, Ordering::Relaxed);
                    debug!(key, bytes = value.len(), "evicted cache entry");
                }),
            ));
        }

        if let CacheState::Ready(lru) = &mut inner.state {
            lru.put(key, value);
            inner.stats.set_usage(lru.len(), lru.used_bytes());
        }
    }

    // == Stats ==
    /// Returns a snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.inner.lock().stats.clone();
        stats.evictions = self.evictions.load(Ordering::Relaxed);
        stats
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        match &self.inner.lock().state {
            CacheState::Uninitialized => 0,
            CacheState::Ready(lru) => lru.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the underlying store has been allocated yet.
    pub fn is_initialized(&self) -> bool {
        matches!(self.inner.lock().state, CacheState::Ready(_))
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        match &self.inner.lock().state {
            CacheState::Uninitialized => Vec::new(),
            CacheState::Ready(lru) => lru.keys().into_iter().map(str::to_owned).collect(),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_cache_lazy_init() {
        let cache = ConcurrentCache::new(100);
        assert!(!cache.is_initialized());

        assert!(cache.get("key").is_none());
        assert!(!cache.is_initialized(), "reads must not allocate storage");

        cache.add("key".to_string(), ByteView::from("value"));
        assert!(cache.is_initialized());
    }

    #[test]
    fn test_cache_add_and_get() {
        let cache = ConcurrentCache::new(0);
        cache.add("Tom".to_string(), ByteView::from("630"));

        assert_eq!(cache.get("Tom").unwrap().as_string(), "630");
        assert!(cache.get("Jack").is_none());
    }

    #[test]
    fn test_cache_holds_two_most_recent() {
        // Each entry is "kN" + "vN" = 4 bytes.
        let cache = ConcurrentCache::new(8);
        for i in 1..=5 {
            cache.add(format!("k{}", i), ByteView::from(format!("v{}", i).as_str()));
        }

        assert!(cache.len() <= 2);
        assert_eq!(cache.keys(), vec!["k5".to_string(), "k4".to_string()]);
        assert_eq!(cache.stats().evictions, 3);
    }

    #[test]
    fn test_cache_get_refreshes_recency() {
        let cache = ConcurrentCache::new(8);
        cache.add("k1".to_string(), ByteView::from("v1"));
        cache.add("k2".to_string(), ByteView::from("v2"));
        cache.get("k1");
        cache.add("k3".to_string(), ByteView::from("v3"));

        assert!(cache.get("k1").is_some());
        assert!(cache.get("k2").is_none());
    }

    #[test]
    fn test_cache_stats() {
        let cache = ConcurrentCache::new(0);
        cache.add("key".to_string(), ByteView::from("value"));
        cache.get("key");
        cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.gets, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.items, 1);
        assert_eq!(stats.bytes, 8);
    }

    #[test]
    fn test_cache_concurrent_adds() {
        let cache = Arc::new(ConcurrentCache::new(0));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..100 {
                        cache.add(format!("{}-{}", t, i), ByteView::from("x"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 800);
    }
}
