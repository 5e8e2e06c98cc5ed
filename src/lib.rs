//! Starter REST backend: settings resolved from the environment, a generic CRUD
//! repository over unit-of-work sessions, and a health-checked axum app.

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod migration;
pub mod model;
pub mod queue;
pub mod repository;
pub mod response;
pub mod routes;
pub mod session;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{DatabaseSettings, ExampleSettings, Settings};
pub use error::{AppError, BootstrapError, ConfigError, PersistenceError, QueueError, RepositoryError};
pub use migration::apply_migrations;
pub use model::{Entity, Row, SoftDelete};
pub use queue::{MemoryQueue, MessageQueue};
pub use repository::{ListLimit, Repository};
pub use routes::app;
pub use session::{MemoryStore, PgSession, PgSessionFactory, Session, SessionFactory};
pub use state::AppState;
pub use store::ensure_database_exists;
