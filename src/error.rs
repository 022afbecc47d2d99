//! Error types for the distributed cache
//!
//! Provides unified error handling using thiserror.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// Cloneable so that a single deduplicated load can hand the same outcome to
/// every waiter.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// Empty key, rejected before any lookup
    #[error("key is required")]
    InvalidKey,

    /// No namespace registered under this name
    #[error("no such namespace: {0}")]
    NamespaceNotFound(String),

    /// The loader failed to produce a value
    #[error("{0}")]
    Loader(Arc<anyhow::Error>),

    /// Network, status or body-read failure talking to a peer
    #[error("peer fetch failed: {0}")]
    PeerFetch(String),

    /// A peer request arrived outside the configured base path
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Malformed peer request
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A deduplicated load exceeded its deadline
    #[error("load timed out after {0:?}")]
    Timeout(Duration),

    /// Namespace built without a loader
    #[error("namespace {0:?} has no loader")]
    MissingLoader(String),

    /// Peer picker bound twice on the same namespace
    #[error("peers already registered for namespace {0:?}")]
    PeersAlreadyRegistered(String),
}

impl CacheError {
    /// Wraps a loader failure.
    pub fn loader(err: anyhow::Error) -> Self {
        CacheError::Loader(Arc::new(err))
    }

    /// Whether this error comes from setting up a namespace rather than
    /// serving a request.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            CacheError::MissingLoader(_) | CacheError::PeersAlreadyRegistered(_)
        )
    }

    fn status(&self) -> StatusCode {
        match self {
            CacheError::InvalidKey | CacheError::BadRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::NamespaceNotFound(_) => StatusCode::NOT_FOUND,
            CacheError::PeerFetch(_) => StatusCode::BAD_GATEWAY,
            CacheError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CacheError::Loader(_)
            | CacheError::Protocol(_)
            | CacheError::MissingLoader(_)
            | CacheError::PeersAlreadyRegistered(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
