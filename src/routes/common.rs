//! Common routes: root greeting and health check.

use crate::handlers::health::{health_check, root};
use axum::{routing::get, Router};

/// GET / (no state).
pub fn root_routes<S: Clone + Send + Sync + 'static>() -> Router<S> {
    Router::new().route("/", get(root))
}

/// GET /health-check, with or without trailing slash.
pub fn health_routes<S: Clone + Send + Sync + 'static>() -> Router<S> {
    Router::new()
        .route("/health-check", get(health_check))
        .route("/health-check/", get(health_check))
}
