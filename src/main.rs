//! distcache node
//!
//! Serves a sample `scores` namespace and joins the peers listed in `PEERS`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use distcache::{create_router, AppState, Config, HttpPool, LoaderFn, Namespace, Registry};

/// Main entry point for a cache node.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the peer pool and register the cluster
/// 4. Create the sample namespace and bind it to the pool
/// 5. Start HTTP server on configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "distcache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting distcache node");

    let config = Config::from_env();
    info!(
        "Configuration loaded: self={}, peers={:?}, cache_bytes={}, replicas={}, base_path={}",
        config.self_url, config.peers, config.cache_bytes, config.replicas, config.base_path
    );

    let pool = Arc::new(HttpPool::with_options(
        config.self_url.clone(),
        config.pool_options(),
    ));
    pool.set_peers(&config.peers);

    let registry = Arc::new(Registry::new());
    let mut builder = Namespace::builder("scores")
        .cache_bytes(config.cache_bytes)
        .loader(scores_db())
        .peers(pool.clone());
    if let Some(limit) = config.load_timeout {
        builder = builder.load_timeout(limit);
    }
    registry.insert(builder.build()?);

    let app = create_router(AppState::new(registry, pool));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Node listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("Node shutdown complete");
    Ok(())
}

/// Stand-in for a slow source of truth.
fn scores_db() -> LoaderFn<impl Fn(&str) -> anyhow::Result<Vec<u8>> + Send + Sync> {
    let db: HashMap<&'static str, &'static str> =
        [("Tom", "630"), ("Jack", "589"), ("Sam", "567")].into_iter().collect();

    LoaderFn(move |key: &str| -> anyhow::Result<Vec<u8>> {
        info!(key, "[SlowDB] search key");
        db.get(key)
            .map(|v| v.as_bytes().to_vec())
            .ok_or_else(|| anyhow::anyhow!("{} not exist", key))
    })
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
