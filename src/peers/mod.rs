//! Peers Module
//!
//! Capabilities a namespace uses to reach the peer that owns a key, plus the
//! HTTP implementation of both sides of the peer protocol.
//!
//! # Protocol
//! - `GET {base_path}{namespace}/{key}` with both segments percent-encoded
//! - `200` with the raw value bytes as `application/octet-stream`
//! - `400` for a malformed path, `404` for an unknown namespace, `500` when
//!   the namespace fails to produce the value

mod client;
mod pool;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

pub use client::HttpFetcher;
pub use pool::{HttpPool, PoolOptions, DEFAULT_BASE_PATH, DEFAULT_REPLICAS};
pub(crate) use pool::normalize_base_path;

/// Picks the peer that owns a key.
pub trait PeerPicker: Send + Sync {
    /// Returns the owning peer, or `None` when the key belongs to this node
    /// or no peers are known.
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerFetcher>>;
}

/// Fetches a value from one remote peer.
#[async_trait]
pub trait PeerFetcher: Send + Sync {
    async fn fetch(&self, namespace: &str, key: &str) -> Result<Bytes>;
}
