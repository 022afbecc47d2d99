//! Cache Module
//!
//! Local storage for a namespace: a byte-budgeted LRU store, the immutable
//! value view it holds, and the locked wrapper shared by concurrent callers.

mod byteview;
mod lru;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use byteview::ByteView;
pub use lru::{ByteSize, LruStore, OnEvicted};
pub use stats::{CacheStats, NamespaceStats, NamespaceStatsSnapshot};
pub use store::ConcurrentCache;
