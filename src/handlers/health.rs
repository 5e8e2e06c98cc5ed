//! Liveness handlers.

use crate::response::{message, Message};
use axum::Json;
use serde_json::{json, Value};

pub const HEALTH_MESSAGE: &str = "Users - service active";

pub async fn root() -> Json<Value> {
    Json(json!({ "Hello": "World" }))
}

/// Ping: always 200 while the process is serving.
pub async fn health_check() -> Json<Message> {
    message(HEALTH_MESSAGE)
}
