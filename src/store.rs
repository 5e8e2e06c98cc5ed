//! Database bootstrap: create the target database when it does not exist yet.

use crate::error::{BootstrapError, ConfigError};
use sqlx::ConnectOptions;
use std::str::FromStr;

/// Connect to the `postgres` maintenance database on the same server and
/// `CREATE DATABASE` the target if missing.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), BootstrapError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|_| ConfigError::InvalidDatabaseUrl)?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", crate::sql::quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

/// Split a URL into (maintenance-db URL, database name).
fn parse_db_name_from_url(url: &str) -> Result<(String, String), ConfigError> {
    let authority_start = url.find("://").map(|i| i + 3).ok_or(ConfigError::InvalidDatabaseUrl)?;
    let path_start = url[authority_start..]
        .find('/')
        .map(|i| authority_start + i + 1)
        .ok_or(ConfigError::InvalidDatabaseUrl)?;
    let path_and_query = &url[path_start..];
    let (path, query) = match path_and_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_and_query, None),
    };
    let base = &url[..path_start];
    let admin_url = match query {
        Some(q) => format!("{}postgres?{}", base, q),
        None => format!("{}postgres", base),
    };
    let name = urlencoding::decode(path.trim()).map_err(|_| ConfigError::InvalidDatabaseUrl)?;
    Ok((admin_url, name.into_owned()))
}
