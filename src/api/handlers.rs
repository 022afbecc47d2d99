//! API Handlers
//!
//! HTTP request handlers for the peer protocol and the operational endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, Uri},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::models::{HealthResponse, StatsResponse};
use crate::namespace::Registry;
use crate::peers::HttpPool;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Namespaces served by this node
    pub registry: Arc<Registry>,
    /// This node's view of the cluster
    pub pool: Arc<HttpPool>,
}

impl AppState {
    pub fn new(registry: Arc<Registry>, pool: Arc<HttpPool>) -> Self {
        Self { registry, pool }
    }
}

/// Handler for GET {base_path}{namespace}/{key}
///
/// Serves a value to another node. The lookup goes through the namespace's
/// full read path, so a key this node does not own is forwarded to its owner.
pub async fn peer_handler(State(state): State<AppState>, uri: Uri) -> Result<Response> {
    let (name, key) = state.pool.parse_path(uri.path())?;
    debug!(node = %state.pool.self_url(), namespace = %name, key = %key, "serving peer request");

    let namespace = state
        .registry
        .get(&name)
        .ok_or(CacheError::NamespaceNotFound(name))?;
    namespace.record_server_request();

    let value = namespace.get(&key).await?;
    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        value.into_body(),
    )
        .into_response())
}

/// Handler for GET /stats
///
/// Returns the counters of every registered namespace.
pub async fn stats_handler(State(state): State<AppState>) -> Json<Vec<StatsResponse>> {
    let stats = state
        .registry
        .names()
        .iter()
        .filter_map(|name| state.registry.get(name))
        .map(|namespace| StatsResponse::from_namespace(&namespace))
        .collect();

    Json(stats)
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
