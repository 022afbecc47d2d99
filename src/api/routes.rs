//! API Routes
//!
//! Configures the Axum router with the peer protocol and operational endpoints.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{health_handler, peer_handler, stats_handler, AppState};

/// Creates the node router.
///
/// # Endpoints
/// - `GET {base_path}{namespace}/{key}` - Peer value fetch (raw bytes)
/// - `GET /stats` - Per-namespace statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let peer_route = format!("{}*rest", state.pool.base_path());

    Router::new()
        .route(&peer_route, get(peer_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
