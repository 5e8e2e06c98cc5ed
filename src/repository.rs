//! Generic CRUD over any [`Entity`], executed against an open [`Session`].
//!
//! The repository holds no state besides its list policy. Every write commits
//! before returning; the caller owns the session and its lifetime.

use crate::error::RepositoryError;
use crate::model::{Entity, Row, SoftDelete};
use crate::session::Session;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;

/// Whether [`Repository::list`] bounds its result by the requested limit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListLimit {
    #[default]
    Honor,
    /// Offset only; the limit argument is accepted and ignored.
    Ignore,
}

pub struct Repository<T> {
    list_limit: ListLimit,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Repository<T> {}

impl<T: Entity> Default for Repository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Repository<T> {
    pub fn new() -> Self {
        Repository {
            list_limit: ListLimit::default(),
            _entity: PhantomData,
        }
    }

    pub fn with_list_limit(mut self, policy: ListLimit) -> Self {
        self.list_limit = policy;
        self
    }

    pub fn list_limit(&self) -> ListLimit {
        self.list_limit
    }

    /// Single row by primary key; `Ok(None)` when absent.
    pub async fn get(&self, session: &mut dyn Session, id: &T::Id) -> Result<Option<T>, RepositoryError> {
        let id = serde_json::to_value(id)?;
        let row = session.find(&T::TABLE, &[(T::TABLE.primary_key, id)]).await?;
        row.map(decode::<T>).transpose()
    }

    /// First row matching every `(column, value)` pair. With several matches,
    /// which one is returned is unspecified.
    pub async fn get_by(
        &self,
        session: &mut dyn Session,
        filters: &[(&str, Value)],
    ) -> Result<Option<T>, RepositoryError> {
        if let Some((column, _)) = filters.iter().find(|(c, _)| !T::TABLE.has_column(c)) {
            return Err(RepositoryError::UnknownColumn {
                entity: T::TABLE.name,
                column: column.to_string(),
            });
        }
        let row = session.find(&T::TABLE, filters).await?;
        row.map(decode::<T>).transpose()
    }

    pub async fn list(
        &self,
        session: &mut dyn Session,
        skip: u64,
        limit: Option<u64>,
    ) -> Result<Vec<T>, RepositoryError> {
        let limit = match self.list_limit {
            ListLimit::Honor => limit,
            ListLimit::Ignore => None,
        };
        let rows = session.find_many(&T::TABLE, skip, limit).await?;
        rows.into_iter().map(decode::<T>).collect()
    }

    /// Insert from the create shape merged over the entity's insert defaults.
    /// A failed insert rolls the session back before returning the error.
    pub async fn create(&self, session: &mut dyn Session, input: &T::Create) -> Result<T, RepositoryError> {
        let mut row = T::insert_defaults();
        row.extend(encode_known::<T, _>(input)?);
        check_lengths::<T>(&row)?;
        let stored = match session.insert(&T::TABLE, row).await {
            Ok(stored) => stored,
            Err(e) => {
                if let Err(rb) = session.rollback().await {
                    tracing::warn!(error = %rb, table = T::TABLE.name, "rollback after failed insert");
                }
                return Err(e.into());
            }
        };
        session.commit().await?;
        let created: T = decode(stored)?;
        tracing::debug!(table = T::TABLE.name, id = %created.id(), "created");
        Ok(created)
    }

    /// Patch `existing` with the fields `input` carries; absent fields are untouched.
    pub async fn update(
        &self,
        session: &mut dyn Session,
        existing: &T,
        input: &T::Update,
    ) -> Result<T, RepositoryError> {
        let mut changes = encode_known::<T, _>(input)?;
        changes.remove(T::TABLE.primary_key);
        check_lengths::<T>(&changes)?;
        if !changes.is_empty() {
            for (k, v) in T::update_defaults() {
                changes.entry(k).or_insert(v);
            }
        }
        let id = serde_json::to_value(existing.id())?;
        let row = session
            .update(&T::TABLE, &id, changes)
            .await?
            .ok_or_else(|| not_found::<T>(existing.id()))?;
        session.commit().await?;
        decode::<T>(row)
    }

    /// Hard delete; returns the row as it was. Missing id is `NotFound`.
    pub async fn remove(&self, session: &mut dyn Session, id: &T::Id) -> Result<T, RepositoryError> {
        let key = serde_json::to_value(id)?;
        let row = session
            .delete(&T::TABLE, &key)
            .await?
            .ok_or_else(|| not_found::<T>(id))?;
        session.commit().await?;
        tracing::debug!(table = T::TABLE.name, id = %id, "removed");
        decode::<T>(row)
    }
}

impl<T: SoftDelete> Repository<T> {
    /// Mark inactive instead of deleting. Missing id is `NotFound`.
    pub async fn soft_remove(&self, session: &mut dyn Session, id: &T::Id) -> Result<T, RepositoryError> {
        let key = serde_json::to_value(id)?;
        let mut changes = T::update_defaults();
        changes.insert(T::ACTIVE_COLUMN.to_string(), Value::Bool(false));
        let row = session
            .update(&T::TABLE, &key, changes)
            .await?
            .ok_or_else(|| not_found::<T>(id))?;
        session.commit().await?;
        tracing::debug!(table = T::TABLE.name, id = %id, "deactivated");
        decode::<T>(row)
    }
}

fn decode<T: Entity>(row: Row) -> Result<T, RepositoryError> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

/// Serialize an input shape and keep only the entity's columns.
fn encode_known<T: Entity, I: Serialize>(input: &I) -> Result<Row, RepositoryError> {
    let mut row = match serde_json::to_value(input)? {
        Value::Object(map) => map,
        _ => Row::new(),
    };
    T::TABLE.retain_known(&mut row);
    Ok(row)
}

fn check_lengths<T: Entity>(row: &Row) -> Result<(), RepositoryError> {
    match T::TABLE.overlong(row) {
        Some((column, max)) => Err(RepositoryError::TooLong {
            entity: T::TABLE.name,
            column,
            max,
        }),
        None => Ok(()),
    }
}

fn not_found<T: Entity>(id: &T::Id) -> RepositoryError {
    RepositoryError::NotFound {
        entity: T::TABLE.name,
        id: id.to_string(),
    }
}
