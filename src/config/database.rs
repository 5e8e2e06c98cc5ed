//! Database connection settings and URL assembly.

use crate::error::ConfigError;
use sqlx::postgres::PgConnectOptions;
use std::str::FromStr;

pub const DEFAULT_DB_PORT: u16 = 5432;

/// Scheme used for assembled URLs. sqlx accepts both `postgres` and `postgresql`.
pub const DB_SCHEME: &str = "postgresql";

const ACCEPTED_SCHEMES: &[&str] = &["postgres://", "postgresql://"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub name: String,
}

impl DatabaseSettings {
    /// Connection URL; user, password and database name are percent-encoded.
    pub fn url(&self) -> String {
        format!(
            "{}://{}:{}@{}:{}/{}",
            DB_SCHEME,
            urlencoding::encode(&self.user),
            urlencoding::encode(&self.password),
            self.host,
            self.port,
            urlencoding::encode(&self.name)
        )
    }
}

/// Parse DB_PORT; absent means the default port.
pub fn parse_port(raw: Option<&str>) -> Result<u16, ConfigError> {
    match raw {
        None => Ok(DEFAULT_DB_PORT),
        Some(s) => s
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(s.to_string())),
    }
}

/// Scheme check for an explicit DATABASE_URL.
pub fn check_database_url(url: &str) -> Result<(), ConfigError> {
    if ACCEPTED_SCHEMES.iter().any(|s| url.starts_with(s)) && url.len() > "postgres://".len() {
        Ok(())
    } else {
        Err(ConfigError::InvalidDatabaseUrl)
    }
}

/// Parse a resolved URL the way the pool will, so a bad URL fails at load time.
pub fn check_connect_options(url: &str) -> Result<PgConnectOptions, ConfigError> {
    PgConnectOptions::from_str(url).map_err(|_| ConfigError::InvalidDatabaseUrl)
}

/// Replace the password component of a URL with `***` for logging.
pub fn redact_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let rest = &url[scheme_end + 3..];
    let Some(at) = rest.rfind('@') else {
        return url.to_string();
    };
    let userinfo = &rest[..at];
    match userinfo.find(':') {
        Some(colon) => format!(
            "{}{}:***{}",
            &url[..scheme_end + 3],
            &userinfo[..colon],
            &rest[at..]
        ),
        None => url.to_string(),
    }
}
