//! Cache Namespace
//!
//! A named cache with its own loader, local storage and view of the peers.
//!
//! ```text
//! get(key) --> cached locally? ---- yes ----> return value
//!                 | no
//!                 v
//!          (deduplicated by key)
//!          owned by a peer? ---- yes --> fetch from peer --> return value
//!                 | no / peer failed
//!                 v
//!          loader --> populate local cache --> return value
//! ```

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::{ByteView, CacheStats, ConcurrentCache, NamespaceStats, NamespaceStatsSnapshot};
use crate::error::{CacheError, Result};
use crate::namespace::Loader;
use crate::peers::{PeerFetcher, PeerPicker};
use crate::singleflight::SingleFlight;

struct Inner {
    name: String,
    loader: Arc<dyn Loader>,
    main_cache: ConcurrentCache,
    peers: OnceLock<Arc<dyn PeerPicker>>,
    loads: SingleFlight<Result<ByteView>>,
    load_timeout: Option<Duration>,
    stats: NamespaceStats,
}

// == Namespace ==
/// A cache namespace. Cloning is cheap and yields a handle to the same
/// namespace.
#[derive(Clone)]
pub struct Namespace {
    inner: Arc<Inner>,
}

impl Namespace {
    /// Starts building a namespace called `name`.
    pub fn builder(name: impl Into<String>) -> NamespaceBuilder {
        NamespaceBuilder {
            name: name.into(),
            cache_bytes: 0,
            loader: None,
            peers: None,
            load_timeout: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    // == Get ==
    /// Returns the value for `key`, loading it on a miss.
    ///
    /// Concurrent misses on the same key share one load. A peer failure is
    /// logged and falls back to the loader; only the loader's error reaches
    /// the caller.
    pub async fn get(&self, key: &str) -> Result<ByteView> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey);
        }

        NamespaceStats::incr(&self.inner.stats.gets);
        if let Some(value) = self.inner.main_cache.get(key) {
            NamespaceStats::incr(&self.inner.stats.cache_hits);
            debug!(namespace = %self.inner.name, key, "cache hit");
            return Ok(value);
        }

        self.load(key).await
    }

    // == Register Peers ==
    /// Binds the peer picker. May be called once.
    pub fn register_peers(&self, peers: Arc<dyn PeerPicker>) -> Result<()> {
        self.inner
            .peers
            .set(peers)
            .map_err(|_| CacheError::PeersAlreadyRegistered(self.inner.name.clone()))
    }

    // == Stats ==
    pub fn stats(&self) -> NamespaceStatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Counters of the local cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.inner.main_cache.stats()
    }

    pub(crate) fn record_server_request(&self) {
        NamespaceStats::incr(&self.inner.stats.server_requests);
    }

    // == Load ==
    async fn load(&self, key: &str) -> Result<ByteView> {
        NamespaceStats::incr(&self.inner.stats.loads);

        let this = self.clone();
        let owned = key.to_string();
        let (result, shared) = self
            .inner
            .loads
            .work(key, move || async move { this.load_once(owned).await })
            .await;

        if shared {
            debug!(namespace = %self.inner.name, key, "joined in-flight load");
        }
        result
    }

    /// Runs in exactly one caller per in-flight key.
    async fn load_once(&self, key: String) -> Result<ByteView> {
        // A load that finished just before this one was registered has
        // already populated the cache.
        if let Some(value) = self.inner.main_cache.get(&key) {
            NamespaceStats::incr(&self.inner.stats.cache_hits);
            return Ok(value);
        }
        NamespaceStats::incr(&self.inner.stats.loads_deduped);

        match self.inner.load_timeout {
            Some(limit) => tokio::time::timeout(limit, self.fetch_or_load(&key))
                .await
                .map_err(|_| CacheError::Timeout(limit))?,
            None => self.fetch_or_load(&key).await,
        }
    }

    async fn fetch_or_load(&self, key: &str) -> Result<ByteView> {
        if let Some(peer) = self.inner.peers.get().and_then(|p| p.pick_peer(key)) {
            match self.get_from_peer(peer.as_ref(), key).await {
                Ok(value) => {
                    NamespaceStats::incr(&self.inner.stats.peer_loads);
                    return Ok(value);
                }
                Err(err) => {
                    NamespaceStats::incr(&self.inner.stats.peer_errors);
                    warn!(
                        namespace = %self.inner.name,
                        key,
                        error = %err,
                        "failed to get from peer, loading locally"
                    );
                }
            }
        }

        self.get_locally(key).await
    }

    /// Values owned by another peer are not kept locally.
    async fn get_from_peer(&self, peer: &dyn PeerFetcher, key: &str) -> Result<ByteView> {
        let bytes = peer.fetch(&self.inner.name, key).await?;
        Ok(ByteView::from(bytes))
    }

    async fn get_locally(&self, key: &str) -> Result<ByteView> {
        match self.inner.loader.load(key).await {
            Ok(bytes) => {
                NamespaceStats::incr(&self.inner.stats.local_loads);
                let value = ByteView::from(bytes);
                self.populate_cache(key, value.clone());
                Ok(value)
            }
            Err(err) => {
                NamespaceStats::incr(&self.inner.stats.local_load_errs);
                Err(CacheError::loader(err))
            }
        }
    }

    fn populate_cache(&self, key: &str, value: ByteView) {
        self.inner.main_cache.add(key.to_string(), value);
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("name", &self.inner.name)
            .field("has_peers", &self.inner.peers.get().is_some())
            .field("main_cache", &self.inner.main_cache)
            .finish()
    }
}

// == Builder ==
/// Configures a [`Namespace`]. A loader is required.
pub struct NamespaceBuilder {
    name: String,
    cache_bytes: usize,
    loader: Option<Arc<dyn Loader>>,
    peers: Option<Arc<dyn PeerPicker>>,
    load_timeout: Option<Duration>,
}

impl NamespaceBuilder {
    /// Byte budget of the local cache; 0 means unbounded.
    pub fn cache_bytes(mut self, cache_bytes: usize) -> Self {
        self.cache_bytes = cache_bytes;
        self
    }

    pub fn loader(self, loader: impl Loader + 'static) -> Self {
        self.shared_loader(Arc::new(loader))
    }

    pub fn shared_loader(mut self, loader: Arc<dyn Loader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Binds the peer picker up front instead of via
    /// [`Namespace::register_peers`].
    pub fn peers(mut self, peers: Arc<dyn PeerPicker>) -> Self {
        self.peers = Some(peers);
        self
    }

    /// Deadline for a whole deduplicated load, peer attempt included.
    pub fn load_timeout(mut self, limit: Duration) -> Self {
        self.load_timeout = Some(limit);
        self
    }

    pub fn build(self) -> Result<Namespace> {
        let loader = self
            .loader
            .ok_or_else(|| CacheError::MissingLoader(self.name.clone()))?;

        let peers = OnceLock::new();
        if let Some(picker) = self.peers {
            let _ = peers.set(picker);
        }

        Ok(Namespace {
            inner: Arc::new(Inner {
                name: self.name,
                loader,
                main_cache: ConcurrentCache::new(self.cache_bytes),
                peers,
                loads: SingleFlight::new(),
                load_timeout: self.load_timeout,
                stats: NamespaceStats::default(),
            }),
        })
    }
}

impl fmt::Debug for NamespaceBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespaceBuilder")
            .field("name", &self.name)
            .field("cache_bytes", &self.cache_bytes)
            .field("has_loader", &self.loader.is_some())
            .finish()
    }
}
