//! distcache - A distributed read-through cache
//!
//! Namespaces cache values in a byte-budgeted LRU, route misses to the peer
//! that owns the key on a consistent hash ring, and fall back to a loader.
//! Concurrent misses on the same key share one load.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod namespace;
pub mod peers;
pub mod ring;
pub mod singleflight;

pub use api::{create_router, AppState};
pub use cache::ByteView;
pub use config::Config;
pub use error::{CacheError, Result};
pub use namespace::{Loader, LoaderFn, Namespace, Registry};
pub use peers::{HttpPool, PeerFetcher, PeerPicker};
