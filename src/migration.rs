//! Schema bootstrap for the bundled models. Idempotent (IF NOT EXISTS).

use crate::error::PersistenceError;
use sqlx::PgPool;

const EXAMPLE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS "example" (
    "id" UUID PRIMARY KEY,
    "active" BOOLEAN NOT NULL DEFAULT TRUE,
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    "last_update" TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    "update_by" VARCHAR(255),
    "extra_data" JSONB
)
"#;

const EXAMPLE_INDEXES: &[&str] = &[r#"CREATE INDEX IF NOT EXISTS "ix_example_active" ON "example" ("active")"#];

pub async fn apply_migrations(pool: &PgPool) -> Result<(), PersistenceError> {
    sqlx::query(EXAMPLE_DDL).execute(pool).await?;
    for ddl in EXAMPLE_INDEXES {
        sqlx::query(ddl).execute(pool).await?;
    }
    tracing::info!("migrations applied");
    Ok(())
}
