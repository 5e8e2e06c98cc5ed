//! Entity contract shared by the repository and sessions, plus the example entity.

mod example;
pub use example::{Example, ExampleCreate, ExampleUpdate, UPDATE_BY_MAX_LEN};

use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Display;

/// A row as it travels between sessions and the repository: column name to JSON value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// One persisted column and its PostgreSQL type (used for casts on bound parameters).
#[derive(Clone, Copy, Debug)]
pub struct Column {
    pub name: &'static str,
    pub pg_type: &'static str,
    /// Character limit of a `varchar(n)` column.
    pub max_len: Option<usize>,
}

impl Column {
    pub const fn new(name: &'static str, pg_type: &'static str) -> Self {
        Column {
            name,
            pg_type,
            max_len: None,
        }
    }

    pub const fn varchar(name: &'static str, max_len: usize) -> Self {
        Column {
            name,
            pg_type: "varchar",
            max_len: Some(max_len),
        }
    }
}

/// Static description of an entity's table.
#[derive(Clone, Copy, Debug)]
pub struct Table {
    pub name: &'static str,
    pub primary_key: &'static str,
    pub columns: &'static [Column],
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// First string value longer than its column allows, as `(column, limit)`.
    /// Length is counted in characters, as PostgreSQL does.
    pub fn overlong(&self, row: &Row) -> Option<(&'static str, usize)> {
        self.columns.iter().find_map(|c| {
            let max = c.max_len?;
            match row.get(c.name) {
                Some(serde_json::Value::String(s)) if s.chars().count() > max => Some((c.name, max)),
                _ => None,
            }
        })
    }

    /// Keep only entries naming a column of this table.
    pub fn retain_known(&self, row: &mut Row) {
        row.retain(|k, _| self.has_column(k));
    }
}

/// A record managed by [`crate::repository::Repository`].
///
/// The entity serializes to and from a [`Row`] whose keys are its column names.
/// `Create` and `Update` are the input shapes; `Update` fields that serialize to
/// nothing (e.g. `None` with `skip_serializing_if`) are left untouched.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    type Id: Serialize + Display + Send + Sync;
    type Create: Serialize + Send + Sync;
    type Update: Serialize + Send + Sync;

    const TABLE: Table;

    fn id(&self) -> &Self::Id;

    /// Values the mapper fills in on insert when the input does not supply them.
    fn insert_defaults() -> Row {
        Row::new()
    }

    /// Values the mapper refreshes on every update (e.g. a last-modified stamp).
    fn update_defaults() -> Row {
        Row::new()
    }
}

/// Entities that are deactivated instead of deleted.
pub trait SoftDelete: Entity {
    const ACTIVE_COLUMN: &'static str = "active";

    fn is_active(&self) -> bool;
}
