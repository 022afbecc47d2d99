//! HTTP peer client

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::peers::PeerFetcher;

// == HTTP Fetcher ==
/// Client side of the peer protocol for one remote node.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    /// Peer URL joined with the base path, e.g. `http://10.0.0.2:8001/_distcache/`
    base_url: String,
    timeout: Option<Duration>,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout: None,
        }
    }

    /// Bounds each fetch, from connect to the last body byte.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the request URL for a namespace and key.
    pub fn url_for(&self, namespace: &str, key: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            urlencoding::encode(namespace),
            urlencoding::encode(key)
        )
    }
}

#[async_trait]
impl PeerFetcher for HttpFetcher {
    async fn fetch(&self, namespace: &str, key: &str) -> Result<Bytes> {
        let url = self.url_for(namespace, key);
        debug!(%url, "fetching from peer");

        let mut request = self.client.get(&url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CacheError::PeerFetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CacheError::PeerFetch(format!("server returned: {}", status)));
        }

        response
            .bytes()
            .await
            .map_err(|e| CacheError::PeerFetch(format!("reading response body: {}", e)))
    }
}
