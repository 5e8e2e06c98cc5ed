//! Example resource routes.

use crate::handlers::example::{create, deactivate, delete as delete_handler, list, read, update};
use crate::state::AppState;
use axum::{routing::get, routing::post, Router};

pub fn example_routes(state: AppState) -> Router {
    Router::new()
        .route("/examples", get(list).post(create))
        .route(
            "/examples/:id",
            get(read).patch(update).delete(delete_handler),
        )
        .route("/examples/:id/deactivate", post(deactivate))
        .with_state(state)
}
