//! Response DTOs for the node's JSON endpoints
//!
//! Peer values are served as raw bytes; only the operational endpoints and
//! errors use these bodies.

use serde::Serialize;

use crate::cache::{CacheStats, NamespaceStatsSnapshot};
use crate::namespace::Namespace;

/// One namespace's entry in the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Namespace name
    pub name: String,
    /// Lookup and load counters
    pub stats: NamespaceStatsSnapshot,
    /// Local cache counters
    pub cache: CacheStats,
    /// Local cache hit rate (hits / gets)
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Snapshots a namespace's counters
    pub fn from_namespace(namespace: &Namespace) -> Self {
        let cache = namespace.cache_stats();
        Self {
            name: namespace.name().to_string(),
            stats: namespace.stats(),
            hit_rate: cache.hit_rate(),
            cache,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::LoaderFn;

    #[tokio::test]
    async fn test_stats_response_from_namespace() {
        let ns = Namespace::builder("scores")
            .loader(LoaderFn(|key: &str| -> anyhow::Result<Vec<u8>> {
                Ok(key.as_bytes().to_vec())
            }))
            .build()
            .unwrap();
        ns.get("Tom").await.unwrap();
        ns.get("Tom").await.unwrap();

        let resp = StatsResponse::from_namespace(&ns);
        assert_eq!(resp.name, "scores");
        assert_eq!(resp.stats.gets, 2);
        assert_eq!(resp.cache.hits, 1);
        assert!((resp.hit_rate - 0.5).abs() < 0.001);

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["stats"]["local_loads"], 1);
        assert_eq!(json["cache"]["items"], 1);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("no such namespace: avatars");
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"error":"no such namespace: avatars"}"#);
    }
}
