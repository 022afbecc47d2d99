//! Configuration Module
//!
//! Handles loading and managing node configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::peers::{normalize_base_path, PoolOptions, DEFAULT_BASE_PATH, DEFAULT_REPLICAS};

/// Node configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// This node's identity on the ring, as peers reach it
    pub self_url: String,
    /// Every node of the cluster, this one included
    pub peers: Vec<String>,
    /// Byte budget of each namespace's local cache
    pub cache_bytes: usize,
    /// Virtual nodes per peer on the hash ring
    pub replicas: usize,
    /// Path prefix of the peer protocol
    pub base_path: String,
    /// Deadline for a single peer fetch
    pub peer_timeout: Duration,
    /// Deadline for a whole deduplicated load
    pub load_timeout: Option<Duration>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8001)
    /// - `SELF_URL` - This node's URL (default: `http://localhost:{SERVER_PORT}`)
    /// - `PEERS` - Comma separated peer URLs (default: just `SELF_URL`)
    /// - `CACHE_BYTES` - Per-namespace cache budget in bytes (default: 2048)
    /// - `REPLICAS` - Virtual nodes per peer (default: 50)
    /// - `BASE_PATH` - Peer protocol prefix (default: `/_distcache/`)
    /// - `PEER_TIMEOUT_MS` - Peer fetch deadline (default: 5000)
    /// - `LOAD_TIMEOUT_MS` - Load deadline, 0 disables it (default: 0)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let server_port = parse_var("SERVER_PORT").unwrap_or(defaults.server_port);
        let self_url = env::var("SELF_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| local_url(server_port));
        let peers = env::var("PEERS")
            .ok()
            .map(|v| split_list(&v))
            .filter(|peers| !peers.is_empty())
            .unwrap_or_else(|| vec![self_url.clone()]);

        Self {
            server_port,
            self_url,
            peers,
            cache_bytes: parse_var("CACHE_BYTES").unwrap_or(defaults.cache_bytes),
            replicas: parse_var("REPLICAS").unwrap_or(defaults.replicas),
            base_path: env::var("BASE_PATH")
                .map(|v| normalize_base_path(&v))
                .unwrap_or(defaults.base_path),
            peer_timeout: parse_var("PEER_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.peer_timeout),
            load_timeout: match parse_var::<u64>("LOAD_TIMEOUT_MS") {
                Some(0) => None,
                Some(ms) => Some(Duration::from_millis(ms)),
                None => defaults.load_timeout,
            },
        }
    }

    /// Peer pool options derived from this configuration.
    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions {
            base_path: self.base_path.clone(),
            replicas: self.replicas,
            hash: None,
            timeout: Some(self.peer_timeout),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let server_port = 8001;
        let self_url = local_url(server_port);
        Self {
            server_port,
            peers: vec![self_url.clone()],
            self_url,
            cache_bytes: 2 << 10,
            replicas: DEFAULT_REPLICAS,
            base_path: DEFAULT_BASE_PATH.to_string(),
            peer_timeout: Duration::from_millis(5000),
            load_timeout: None,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn local_url(port: u16) -> String {
    format!("http://localhost:{}", port)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 8001);
        assert_eq!(config.self_url, "http://localhost:8001");
        assert_eq!(config.peers, vec!["http://localhost:8001"]);
        assert_eq!(config.cache_bytes, 2048);
        assert_eq!(config.replicas, 50);
        assert_eq!(config.base_path, "/_distcache/");
        assert_eq!(config.peer_timeout, Duration::from_secs(5));
        assert!(config.load_timeout.is_none());
    }

    #[test]
    fn test_config_from_env() {
        // All env handling lives in one test; tests run in parallel.
        for var in [
            "SERVER_PORT",
            "SELF_URL",
            "PEERS",
            "CACHE_BYTES",
            "REPLICAS",
            "BASE_PATH",
            "PEER_TIMEOUT_MS",
            "LOAD_TIMEOUT_MS",
        ] {
            env::remove_var(var);
        }

        let config = Config::from_env();
        assert_eq!(config.server_port, 8001);
        assert_eq!(config.peers, vec![config.self_url.clone()]);
        assert!(config.load_timeout.is_none());

        env::set_var("SERVER_PORT", "9001");
        env::set_var("PEERS", "http://a:9001, http://b:9002,,");
        env::set_var("BASE_PATH", "cache");
        env::set_var("LOAD_TIMEOUT_MS", "250");

        let config = Config::from_env();
        assert_eq!(config.server_port, 9001);
        assert_eq!(config.self_url, "http://localhost:9001");
        assert_eq!(config.peers, vec!["http://a:9001", "http://b:9002"]);
        assert_eq!(config.base_path, "/cache/");
        assert_eq!(config.load_timeout, Some(Duration::from_millis(250)));

        env::set_var("LOAD_TIMEOUT_MS", "0");
        assert!(Config::from_env().load_timeout.is_none());

        for var in ["SERVER_PORT", "PEERS", "BASE_PATH", "LOAD_TIMEOUT_MS"] {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_pool_options() {
        let options = Config::default().pool_options();
        assert_eq!(options.base_path, "/_distcache/");
        assert_eq!(options.replicas, 50);
        assert_eq!(options.timeout, Some(Duration::from_secs(5)));
    }
}
