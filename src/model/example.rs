//! Example entity. Replace with your own models; keep the shape as a reference.

use crate::model::{Column, Entity, Row, SoftDelete, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub id: Uuid,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    /// Who updated this example.
    pub update_by: Option<String>,
    #[serde(default)]
    pub extra_data: Value,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExampleCreate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExampleUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<Value>,
}

/// Matches `VARCHAR(255)` in the migration.
pub const UPDATE_BY_MAX_LEN: usize = 255;

const EXAMPLE_COLUMNS: &[Column] = &[
    Column::new("id", "uuid"),
    Column::new("active", "boolean"),
    Column::new("created_at", "timestamptz"),
    Column::new("last_update", "timestamptz"),
    Column::varchar("update_by", UPDATE_BY_MAX_LEN),
    Column::new("extra_data", "jsonb"),
];

fn now() -> Value {
    Value::String(Utc::now().to_rfc3339())
}

impl Entity for Example {
    type Id = Uuid;
    type Create = ExampleCreate;
    type Update = ExampleUpdate;

    const TABLE: Table = Table {
        name: "example",
        primary_key: "id",
        columns: EXAMPLE_COLUMNS,
    };

    fn id(&self) -> &Uuid {
        &self.id
    }

    fn insert_defaults() -> Row {
        let stamp = now();
        let mut row = Row::new();
        row.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
        row.insert("active".into(), Value::Bool(true));
        row.insert("created_at".into(), stamp.clone());
        row.insert("last_update".into(), stamp);
        row
    }

    fn update_defaults() -> Row {
        let mut row = Row::new();
        row.insert("last_update".into(), now());
        row
    }
}

impl SoftDelete for Example {
    fn is_active(&self) -> bool {
        self.active
    }
}
