//! HTTP peer pool
//!
//! Knows this node's identity and the set of peers, and picks the owner of a
//! key from a consistent hash ring.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::{CacheError, Result};
use crate::peers::{HttpFetcher, PeerFetcher, PeerPicker};
use crate::ring::{HashFn, HashRing};

// == Defaults ==
/// Path prefix the peer protocol is served under
pub const DEFAULT_BASE_PATH: &str = "/_distcache/";

/// Virtual nodes per peer
pub const DEFAULT_REPLICAS: usize = 50;

/// Tuning for an [`HttpPool`].
#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub base_path: String,
    pub replicas: usize,
    /// Ring hash, CRC-32 when `None`
    pub hash: Option<HashFn>,
    /// Per-request deadline for peer fetches
    pub timeout: Option<Duration>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_BASE_PATH.to_string(),
            replicas: DEFAULT_REPLICAS,
            hash: None,
            timeout: None,
        }
    }
}

struct PoolState {
    ring: HashRing,
    fetchers: HashMap<String, Arc<HttpFetcher>>,
}

// == HTTP Pool ==
/// Pool of HTTP peers sharing one consistent hash ring.
///
/// Replacing the peer set swaps the ring and the fetcher map under a single
/// lock; a pick made just before a swap may route to the previous owner.
pub struct HttpPool {
    /// This node's base URL, e.g. `http://10.0.0.1:8001`
    self_url: String,
    options: PoolOptions,
    client: reqwest::Client,
    state: Mutex<PoolState>,
}

impl HttpPool {
    // == Constructor ==
    /// Creates a pool with default options and no peers.
    pub fn new(self_url: impl Into<String>) -> Self {
        Self::with_options(self_url, PoolOptions::default())
    }

    pub fn with_options(self_url: impl Into<String>, mut options: PoolOptions) -> Self {
        options.base_path = normalize_base_path(&options.base_path);
        let ring = HashRing::new(options.replicas, options.hash);
        Self {
            self_url: trim_url(&self_url.into()),
            options,
            client: reqwest::Client::new(),
            state: Mutex::new(PoolState {
                ring,
                fetchers: HashMap::new(),
            }),
        }
    }

    // == Set Peers ==
    /// Replaces the known peers. The list may include this node.
    pub fn set_peers<I, S>(&self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let peers: Vec<String> = peers.into_iter().map(|p| trim_url(p.as_ref())).collect();

        let mut ring = HashRing::new(self.options.replicas, self.options.hash);
        ring.add(&peers);
        let fetchers = peers
            .iter()
            .map(|peer| {
                let base_url = format!("{}{}", peer, self.options.base_path);
                let mut fetcher = HttpFetcher::new(self.client.clone(), base_url);
                if let Some(timeout) = self.options.timeout {
                    fetcher = fetcher.with_timeout(timeout);
                }
                (peer.clone(), Arc::new(fetcher))
            })
            .collect();

        *self.state.lock() = PoolState { ring, fetchers };
        info!(node = %self.self_url, peers = ?peers, "peer set updated");
    }

    // == Parse Path ==
    /// Splits a peer request path into its decoded namespace and key.
    ///
    /// A path outside the base path is a [`CacheError::Protocol`]; a path
    /// that does not split into two segments is a [`CacheError::BadRequest`].
    pub fn parse_path(&self, path: &str) -> Result<(String, String)> {
        let rest = path.strip_prefix(self.options.base_path.as_str()).ok_or_else(|| {
            CacheError::Protocol(format!("peer pool serving unexpected path: {}", path))
        })?;

        let mut parts = rest.splitn(2, '/');
        match (parts.next(), parts.next()) {
            (Some(namespace), Some(key)) => Ok((decode(namespace)?, decode(key)?)),
            _ => Err(CacheError::BadRequest(format!(
                "expected {}<namespace>/<key>, got {}",
                self.options.base_path, path
            ))),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.options.base_path
    }

    pub fn self_url(&self) -> &str {
        &self.self_url
    }

    /// Identities currently on the ring.
    pub fn peers(&self) -> Vec<String> {
        let mut peers: Vec<String> = self.state.lock().fetchers.keys().cloned().collect();
        peers.sort();
        peers
    }

    /// The node that owns `key`, which may be this node.
    pub fn owner_of(&self, key: &str) -> Option<String> {
        self.state.lock().ring.get(key).map(str::to_owned)
    }
}

impl PeerPicker for HttpPool {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerFetcher>> {
        let state = self.state.lock();
        let peer = state.ring.get(key)?;
        if peer == self.self_url {
            return None;
        }
        debug!(node = %self.self_url, peer, key, "picked peer");
        let fetcher = state.fetchers.get(peer)?;
        Some(Arc::clone(fetcher) as Arc<dyn PeerFetcher>)
    }
}

impl fmt::Debug for HttpPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpPool")
            .field("self_url", &self.self_url)
            .field("base_path", &self.options.base_path)
            .finish()
    }
}

// == Helpers ==
/// Ensures the base path starts and ends with `/`.
pub(crate) fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}

fn trim_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

fn decode(segment: &str) -> Result<String> {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .map_err(|e| CacheError::BadRequest(format!("invalid path encoding: {}", e)))
}
