//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from a table descriptor.

use crate::model::{Row, Table};
use crate::sql::PgBindValue;
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: only from static descriptors).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Push a value bound for `column`; returns the cast placeholder (e.g. `$2::uuid`).
    fn push_param(&mut self, table: &Table, column: &str, v: &Value) -> String {
        let pg_type = table.column(column).map(|c| c.pg_type).unwrap_or("text");
        self.params.push(PgBindValue::for_column(v, pg_type));
        format!("${}::{}", self.params.len(), pg_type)
    }
}

fn column_list(table: &Table) -> String {
    table
        .columns
        .iter()
        .map(|c| quoted(c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn where_clause(q: &mut QueryBuf, table: &Table, filters: &[(&str, Value)]) -> String {
    let parts: Vec<String> = filters
        .iter()
        .filter(|(col, _)| table.has_column(col))
        .map(|(col, val)| {
            let ph = q.push_param(table, col, val);
            format!("{} = {}", quoted(col), ph)
        })
        .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// SELECT with equality filters, first row in primary-key order.
pub fn select_one(table: &Table, filters: &[(&str, Value)]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, table, filters);
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {} LIMIT 1",
        column_list(table),
        quoted(table.name),
        where_sql,
        quoted(table.primary_key)
    );
    q
}

/// SELECT list ORDER BY pk with OFFSET and optional LIMIT.
pub fn select_list(table: &Table, offset: u64, limit: Option<u64>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let limit_clause = limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {} ORDER BY {}{} OFFSET {}",
        column_list(table),
        quoted(table.name),
        quoted(table.primary_key),
        limit_clause,
        offset
    );
    q
}

/// INSERT the known columns present in `row`; columns left out take their DB default.
pub fn insert(table: &Table, row: &Row) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in table.columns {
        let Some(val) = row.get(c.name) else { continue };
        placeholders.push(q.push_param(table, c.name, val));
        cols.push(quoted(c.name));
    }
    q.sql = if cols.is_empty() {
        format!(
            "INSERT INTO {} DEFAULT VALUES RETURNING {}",
            quoted(table.name),
            column_list(table)
        )
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            quoted(table.name),
            cols.join(", "),
            placeholders.join(", "),
            column_list(table)
        )
    };
    q
}

/// UPDATE by id: SET only known, non-key columns present in `changes`.
/// With nothing to set, degrades to a SELECT of the row.
pub fn update(table: &Table, id: &Value, changes: &Row) -> QueryBuf {
    let mut q = QueryBuf::new();
    let pk = table.primary_key;
    let mut sets = Vec::new();
    for c in table.columns {
        if c.name == pk {
            continue;
        }
        let Some(val) = changes.get(c.name) else { continue };
        let ph = q.push_param(table, c.name, val);
        sets.push(format!("{} = {}", quoted(c.name), ph));
    }
    let id_ph = q.push_param(table, pk, id);
    q.sql = if sets.is_empty() {
        format!(
            "SELECT {} FROM {} WHERE {} = {}",
            column_list(table),
            quoted(table.name),
            quoted(pk),
            id_ph
        )
    } else {
        format!(
            "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
            quoted(table.name),
            sets.join(", "),
            quoted(pk),
            id_ph,
            column_list(table)
        )
    };
    q
}

/// DELETE by id, returning the row as it was.
pub fn delete(table: &Table, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let id_ph = q.push_param(table, table.primary_key, id);
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {} RETURNING {}",
        quoted(table.name),
        quoted(table.primary_key),
        id_ph,
        column_list(table)
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Entity, Example};
    use serde_json::json;

    const T: Table = Example::TABLE;

    #[test]
    fn select_one_filters_known_columns_only() {
        let q = select_one(&T, &[("update_by", json!("ana")), ("bogus", json!(1))]);
        assert_eq!(
            q.sql,
            "SELECT \"id\", \"active\", \"created_at\", \"last_update\", \"update_by\", \"extra_data\" \
             FROM \"example\" WHERE \"update_by\" = $1::varchar ORDER BY \"id\" LIMIT 1"
        );
        assert_eq!(q.params, vec![PgBindValue::String("ana".into())]);
    }

    #[test]
    fn select_list_applies_limit_only_when_given() {
        let q = select_list(&T, 5, Some(10));
        assert!(q.sql.ends_with("ORDER BY \"id\" LIMIT 10 OFFSET 5"));
        let q = select_list(&T, 0, None);
        assert!(q.sql.ends_with("ORDER BY \"id\" OFFSET 0"));
    }

    #[test]
    fn insert_casts_each_placeholder() {
        let mut row = Row::new();
        row.insert("active".into(), json!(true));
        row.insert("extra_data".into(), json!({"k": 1}));
        row.insert("ignored".into(), json!("x"));
        let q = insert(&T, &row);
        assert!(q
            .sql
            .starts_with("INSERT INTO \"example\" (\"active\", \"extra_data\") VALUES ($1::boolean, $2::jsonb) RETURNING "));
        assert_eq!(q.params.len(), 2);
    }

    #[test]
    fn update_skips_primary_key_and_binds_id_last() {
        let id = uuid::Uuid::new_v4();
        let mut changes = Row::new();
        changes.insert("id".into(), json!(uuid::Uuid::new_v4().to_string()));
        changes.insert("update_by".into(), json!("bo"));
        let q = update(&T, &json!(id.to_string()), &changes);
        assert!(q
            .sql
            .starts_with("UPDATE \"example\" SET \"update_by\" = $1::varchar WHERE \"id\" = $2::uuid RETURNING "));
        assert_eq!(q.params[1], PgBindValue::Uuid(id));
    }

    #[test]
    fn empty_update_selects_instead() {
        let q = update(&T, &json!(uuid::Uuid::new_v4().to_string()), &Row::new());
        assert!(q.sql.starts_with("SELECT "));
        assert!(q.sql.ends_with("WHERE \"id\" = $1::uuid"));
    }

    #[test]
    fn delete_returns_row() {
        let q = delete(&T, &json!(uuid::Uuid::new_v4().to_string()));
        assert!(q.sql.starts_with("DELETE FROM \"example\" WHERE \"id\" = $1::uuid RETURNING "));
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quoted("we\"ird"), "\"we\"\"ird\"");
    }
}
