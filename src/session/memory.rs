//! In-process store with unit-of-work sessions. Useful for tests and local development.
//!
//! A session records its inserts, updates and deletes as a change log keyed by
//! primary key. Reads see the latest committed rows with the log applied on top.
//! Commit replays the log against the current tables under the write lock, so rows
//! other sessions committed in the meantime are kept. Rollback or drop discards the log.

use crate::error::PersistenceError;
use crate::model::{Row, Table};
use crate::session::{Session, SessionFactory};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

type Tables = HashMap<&'static str, Vec<Row>>;

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> MemorySession {
        MemorySession {
            store: self.clone(),
            log: Vec::new(),
        }
    }

    /// Committed row count for a table.
    pub fn len(&self, table: &Table) -> usize {
        self.tables
            .read()
            .map(|t| t.get(table.name).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, table: &Table) -> bool {
        self.len(table) == 0
    }

    fn committed(&self, table: &Table) -> Result<Vec<Row>, PersistenceError> {
        self.tables
            .read()
            .map(|t| t.get(table.name).cloned().unwrap_or_default())
            .map_err(|_| poisoned())
    }

    /// Replay `log` against the current tables. All or nothing.
    fn replay(&self, log: &[(Table, Change)]) -> Result<(), PersistenceError> {
        let mut guard = self.tables.write().map_err(|_| poisoned())?;
        let mut touched: HashMap<&'static str, Vec<Row>> = HashMap::new();
        for (table, change) in log {
            let rows = touched
                .entry(table.name)
                .or_insert_with(|| guard.get(table.name).cloned().unwrap_or_default());
            apply(rows, table, change)?;
        }
        guard.extend(touched);
        Ok(())
    }
}

fn poisoned() -> PersistenceError {
    PersistenceError::Unavailable("memory store lock poisoned".into())
}

#[async_trait]
impl SessionFactory for MemoryStore {
    async fn open(&self) -> Result<Box<dyn Session>, PersistenceError> {
        Ok(Box::new(self.session()))
    }
}

/// One pending write, addressed by primary key.
#[derive(Clone, Debug)]
enum Change {
    Insert(Row),
    Update { key: Value, changes: Row },
    Delete(Value),
}

pub struct MemorySession {
    store: MemoryStore,
    log: Vec<(Table, Change)>,
}

impl MemorySession {
    /// Committed rows of `table` with this session's pending changes applied.
    fn view(&self, table: &Table) -> Result<Vec<Row>, PersistenceError> {
        let mut rows = self.store.committed(table)?;
        for (t, change) in self.log.iter().filter(|(t, _)| t.name == table.name) {
            apply(&mut rows, t, change)?;
        }
        Ok(rows)
    }
}

fn apply(rows: &mut Vec<Row>, table: &Table, change: &Change) -> Result<(), PersistenceError> {
    match change {
        Change::Insert(row) => {
            let key = key_of(table, row);
            if rows.iter().any(|r| key_of(table, r) == key) {
                return Err(PersistenceError::Constraint(format!(
                    "duplicate key {}.{} = {}",
                    table.name, table.primary_key, key
                )));
            }
            rows.push(row.clone());
        }
        // A row deleted by another session stays deleted.
        Change::Update { key, changes } => {
            if let Some(row) = rows.iter_mut().find(|r| key_of(table, r) == *key) {
                for (k, v) in changes {
                    row.insert(k.clone(), v.clone());
                }
            }
        }
        Change::Delete(key) => rows.retain(|r| key_of(table, r) != *key),
    }
    Ok(())
}

fn row_matches(row: &Row, filters: &[(&str, Value)]) -> bool {
    filters
        .iter()
        .all(|(col, val)| row.get(*col).unwrap_or(&Value::Null) == val)
}

fn key_of(table: &Table, row: &Row) -> Value {
    row.get(table.primary_key).cloned().unwrap_or(Value::Null)
}

#[async_trait]
impl Session for MemorySession {
    async fn find(
        &mut self,
        table: &Table,
        filters: &[(&str, Value)],
    ) -> Result<Option<Row>, PersistenceError> {
        let rows = self.view(table)?;
        Ok(rows.into_iter().find(|r| row_matches(r, filters)))
    }

    async fn find_many(
        &mut self,
        table: &Table,
        offset: u64,
        limit: Option<u64>,
    ) -> Result<Vec<Row>, PersistenceError> {
        let rows = self.view(table)?;
        let skipped = rows.into_iter().skip(usize::try_from(offset).unwrap_or(usize::MAX));
        Ok(match limit {
            Some(n) => skipped.take(usize::try_from(n).unwrap_or(usize::MAX)).collect(),
            None => skipped.collect(),
        })
    }

    async fn insert(&mut self, table: &Table, mut row: Row) -> Result<Row, PersistenceError> {
        table.retain_known(&mut row);
        for c in table.columns {
            row.entry(c.name).or_insert(Value::Null);
        }
        if key_of(table, &row).is_null() {
            return Err(PersistenceError::Constraint(format!(
                "null value in primary key {}.{}",
                table.name, table.primary_key
            )));
        }
        let change = Change::Insert(row.clone());
        apply(&mut self.view(table)?, table, &change)?;
        self.log.push((*table, change));
        Ok(row)
    }

    async fn update(
        &mut self,
        table: &Table,
        id: &Value,
        mut changes: Row,
    ) -> Result<Option<Row>, PersistenceError> {
        let Some(mut row) = self.view(table)?.into_iter().find(|r| key_of(table, r) == *id) else {
            return Ok(None);
        };
        changes.retain(|k, _| k != table.primary_key && table.has_column(k));
        if changes.is_empty() {
            return Ok(Some(row));
        }
        for (k, v) in &changes {
            row.insert(k.clone(), v.clone());
        }
        self.log.push((
            *table,
            Change::Update {
                key: id.clone(),
                changes,
            },
        ));
        Ok(Some(row))
    }

    async fn delete(&mut self, table: &Table, id: &Value) -> Result<Option<Row>, PersistenceError> {
        let Some(row) = self.view(table)?.into_iter().find(|r| key_of(table, r) == *id) else {
            return Ok(None);
        };
        self.log.push((*table, Change::Delete(id.clone())));
        Ok(Some(row))
    }

    async fn commit(&mut self) -> Result<(), PersistenceError> {
        let log = std::mem::take(&mut self.log);
        if log.is_empty() {
            return Ok(());
        }
        self.store.replay(&log)
    }

    async fn rollback(&mut self) -> Result<(), PersistenceError> {
        self.log.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Entity, Example};
    use serde_json::json;

    const T: Table = Example::TABLE;

    fn row(id: &str) -> Row {
        let mut r = Row::new();
        r.insert("id".into(), json!(id));
        r
    }

    #[tokio::test]
    async fn uncommitted_work_is_invisible_and_dropped() {
        let store = MemoryStore::new();
        let mut s = store.session();
        s.insert(&T, row("a")).await.unwrap();
        assert!(s.find(&T, &[("id", json!("a"))]).await.unwrap().is_some());
        assert!(store.is_empty(&T));
        drop(s);

        let mut s = store.session();
        assert!(s.find(&T, &[("id", json!("a"))]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn commit_publishes_and_rollback_discards() {
        let store = MemoryStore::new();
        let mut s = store.session();
        s.insert(&T, row("a")).await.unwrap();
        s.commit().await.unwrap();
        assert_eq!(store.len(&T), 1);

        s.delete(&T, &json!("a")).await.unwrap();
        s.rollback().await.unwrap();
        assert_eq!(store.len(&T), 1);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_and_missing_keys() {
        let store = MemoryStore::new();
        let mut s = store.session();
        s.insert(&T, row("a")).await.unwrap();
        assert!(matches!(
            s.insert(&T, row("a")).await,
            Err(PersistenceError::Constraint(_))
        ));
        assert!(matches!(
            s.insert(&T, Row::new()).await,
            Err(PersistenceError::Constraint(_))
        ));
    }

    #[tokio::test]
    async fn interleaved_commits_keep_each_others_rows() {
        let store = MemoryStore::new();
        let mut seed = store.session();
        seed.insert(&T, row("a")).await.unwrap();
        seed.commit().await.unwrap();

        let mut first = store.session();
        assert!(first.find(&T, &[("id", json!("a"))]).await.unwrap().is_some());

        let mut second = store.session();
        second.insert(&T, row("b")).await.unwrap();
        second.commit().await.unwrap();
        assert_eq!(store.len(&T), 2);

        let mut changes = Row::new();
        changes.insert("update_by".into(), json!("ana"));
        first.update(&T, &json!("a"), changes).await.unwrap();
        first.commit().await.unwrap();

        assert_eq!(store.len(&T), 2);
        let mut check = store.session();
        assert!(check.find(&T, &[("id", json!("b"))]).await.unwrap().is_some());
        let a = check.find(&T, &[("id", json!("a"))]).await.unwrap().unwrap();
        assert_eq!(a.get("update_by"), Some(&json!("ana")));
    }

    #[tokio::test]
    async fn reads_see_rows_committed_after_the_session_started() {
        let store = MemoryStore::new();
        let mut reader = store.session();
        assert!(reader.find_many(&T, 0, None).await.unwrap().is_empty());

        let mut writer = store.session();
        writer.insert(&T, row("a")).await.unwrap();
        writer.commit().await.unwrap();

        assert_eq!(reader.find_many(&T, 0, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn conflicting_insert_fails_at_commit_and_publishes_nothing() {
        let store = MemoryStore::new();
        let mut first = store.session();
        first.insert(&T, row("a")).await.unwrap();
        first.insert(&T, row("x")).await.unwrap();

        let mut second = store.session();
        second.insert(&T, row("a")).await.unwrap();
        second.commit().await.unwrap();

        assert!(matches!(first.commit().await, Err(PersistenceError::Constraint(_))));
        assert_eq!(store.len(&T), 1);
    }

    #[tokio::test]
    async fn update_of_row_deleted_elsewhere_is_dropped() {
        let store = MemoryStore::new();
        let mut seed = store.session();
        seed.insert(&T, row("a")).await.unwrap();
        seed.commit().await.unwrap();

        let mut updater = store.session();
        let mut changes = Row::new();
        changes.insert("active".into(), json!(false));
        assert!(updater.update(&T, &json!("a"), changes).await.unwrap().is_some());

        let mut deleter = store.session();
        deleter.delete(&T, &json!("a")).await.unwrap();
        deleter.commit().await.unwrap();

        updater.commit().await.unwrap();
        assert!(store.is_empty(&T));
    }

    #[tokio::test]
    async fn insert_fills_missing_columns_with_null() {
        let store = MemoryStore::new();
        let mut s = store.session();
        let stored = s.insert(&T, row("a")).await.unwrap();
        assert_eq!(stored.get("update_by"), Some(&Value::Null));
        assert_eq!(stored.len(), T.columns.len());
    }
}
