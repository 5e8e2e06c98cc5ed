//! Unit-of-work sessions the repository runs against.
//!
//! A session begins its transaction lazily on first use. Work becomes visible to
//! other sessions only after [`Session::commit`]; dropping a session discards
//! anything uncommitted.

mod memory;
mod postgres;

pub use memory::{MemorySession, MemoryStore};
pub use postgres::{PgSession, PgSessionFactory};

use crate::error::PersistenceError;
use crate::model::{Row, Table};
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait Session: Send {
    /// First row matching every `(column, value)` equality, if any.
    async fn find(
        &mut self,
        table: &Table,
        filters: &[(&str, Value)],
    ) -> Result<Option<Row>, PersistenceError>;

    async fn find_many(
        &mut self,
        table: &Table,
        offset: u64,
        limit: Option<u64>,
    ) -> Result<Vec<Row>, PersistenceError>;

    /// Add a row and return it as stored (with storage-side defaults filled in).
    async fn insert(&mut self, table: &Table, row: Row) -> Result<Row, PersistenceError>;

    /// Apply `changes` to the row with primary key `id`; `None` when no such row.
    async fn update(
        &mut self,
        table: &Table,
        id: &Value,
        changes: Row,
    ) -> Result<Option<Row>, PersistenceError>;

    /// Delete the row with primary key `id`, returning it as it was.
    async fn delete(&mut self, table: &Table, id: &Value) -> Result<Option<Row>, PersistenceError>;

    async fn commit(&mut self) -> Result<(), PersistenceError>;

    async fn rollback(&mut self) -> Result<(), PersistenceError>;
}

/// Opens one session per logical unit of work (typically one per request).
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn Session>, PersistenceError>;
}
