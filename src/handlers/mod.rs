//! HTTP handlers: liveness and the example resource.

pub mod example;
pub mod health;
