//! PostgreSQL session over a lazily started sqlx transaction.

use crate::error::PersistenceError;
use crate::model::{Row, Table};
use crate::session::{Session, SessionFactory};
use crate::sql::{self, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

pub struct PgSession {
    pool: PgPool,
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgSession {
    pub fn new(pool: PgPool) -> Self {
        PgSession { pool, tx: None }
    }

    async fn conn(&mut self) -> Result<&mut PgConnection, PersistenceError> {
        let tx = match self.tx.take() {
            Some(tx) => tx,
            None => {
                tracing::trace!("begin");
                self.pool.begin().await?
            }
        };
        let tx = self.tx.insert(tx);
        Ok(&mut **tx)
    }

    async fn fetch_optional(&mut self, q: &QueryBuf) -> Result<Option<Row>, PersistenceError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let conn = self.conn().await?;
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        let row = query.fetch_optional(&mut *conn).await?;
        Ok(row.map(|r| row_to_json(&r)))
    }

    async fn fetch_all(&mut self, q: &QueryBuf) -> Result<Vec<Row>, PersistenceError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let conn = self.conn().await?;
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        let rows = query.fetch_all(&mut *conn).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }
}

#[async_trait]
impl Session for PgSession {
    async fn find(
        &mut self,
        table: &Table,
        filters: &[(&str, Value)],
    ) -> Result<Option<Row>, PersistenceError> {
        let q = sql::select_one(table, filters);
        self.fetch_optional(&q).await
    }

    async fn find_many(
        &mut self,
        table: &Table,
        offset: u64,
        limit: Option<u64>,
    ) -> Result<Vec<Row>, PersistenceError> {
        let q = sql::select_list(table, offset, limit);
        self.fetch_all(&q).await
    }

    async fn insert(&mut self, table: &Table, row: Row) -> Result<Row, PersistenceError> {
        let q = sql::insert(table, &row);
        self.fetch_optional(&q)
            .await?
            .ok_or(PersistenceError::Db(sqlx::Error::RowNotFound))
    }

    async fn update(
        &mut self,
        table: &Table,
        id: &Value,
        changes: Row,
    ) -> Result<Option<Row>, PersistenceError> {
        let q = sql::update(table, id, &changes);
        self.fetch_optional(&q).await
    }

    async fn delete(&mut self, table: &Table, id: &Value) -> Result<Option<Row>, PersistenceError> {
        let q = sql::delete(table, id);
        self.fetch_optional(&q).await
    }

    async fn commit(&mut self) -> Result<(), PersistenceError> {
        if let Some(tx) = self.tx.take() {
            tracing::trace!("commit");
            tx.commit().await?;
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), PersistenceError> {
        if let Some(tx) = self.tx.take() {
            tracing::trace!("rollback");
            tx.rollback().await?;
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgSessionFactory {
    pool: PgPool,
}

impl PgSessionFactory {
    pub fn new(pool: PgPool) -> Self {
        PgSessionFactory { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SessionFactory for PgSessionFactory {
    async fn open(&self) -> Result<Box<dyn Session>, PersistenceError> {
        Ok(Box::new(PgSession::new(self.pool.clone())))
    }
}

fn row_to_json(row: &PgRow) -> Row {
    use sqlx::Column;
    use sqlx::Row as _;
    let mut map = Row::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    map
}

fn cell_to_value(row: &PgRow, name: &str) -> Value {
    use sqlx::Row as _;
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n as f64) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(name) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Value::String(d.and_utc().to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(name) {
        return j;
    }
    Value::Null
}
