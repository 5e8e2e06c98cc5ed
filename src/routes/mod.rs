//! Router assembly: `/`, `/api/v1/health-check`, `/api/v1/examples...`.

mod common;
mod example;

pub use common::{health_routes, root_routes};
pub use example::example_routes;

use crate::state::AppState;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const API_V1_PREFIX: &str = "/api/v1";

/// Versioned API routes (mount under [`API_V1_PREFIX`]).
pub fn api_v1_routes(state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(example_routes(state))
}

/// Full application: routes plus request tracing and permissive CORS.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    Router::new()
        .merge(root_routes())
        .nest(API_V1_PREFIX, api_v1_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}
