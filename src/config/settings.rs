//! Process settings resolved once at startup from `.env` and the environment.

use crate::config::database::{
    check_connect_options, check_database_url, parse_port, redact_url, DatabaseSettings,
};
use crate::error::ConfigError;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::Level;

pub const DEFAULT_PROJECT_NAME: &str = "Users";

/// Optional settings for the example queue integration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExampleSettings {
    pub url: Option<String>,
    pub users_queue: Option<String>,
    pub errors_queue: Option<String>,
}

impl ExampleSettings {
    pub fn is_complete(&self) -> bool {
        self.url.is_some() && self.users_queue.is_some() && self.errors_queue.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub project_name: String,
    /// Present when every DB_* part was supplied.
    pub database: Option<DatabaseSettings>,
    pub database_url: String,
    pub example: ExampleSettings,
    pub log_level: Level,
}

impl Settings {
    /// Resolve from the process environment, falling back to a `.env` file found in
    /// the working directory or its parents. Environment variables take precedence.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match dotenvy::dotenv_iter() {
            Ok(iter) => Some(iter),
            Err(e) if e.not_found() => None,
            Err(e) => return Err(ConfigError::Load(e.to_string())),
        };
        Self::from_env_file(file.into_iter().flatten(), |key| std::env::var(key).ok())
    }

    /// Like [`Settings::load`] with an explicit `.env` path, which must exist.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = dotenvy::from_path_iter(path).map_err(|e| ConfigError::Load(e.to_string()))?;
        Self::from_env_file(file, |key| std::env::var(key).ok())
    }

    /// Resolve from `env`, falling back to the parsed `.env` entries. A malformed
    /// entry is `ConfigError::Load`.
    pub fn from_env_file<I, F>(entries: I, env: F) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = Result<(String, String), dotenvy::Error>>,
        F: Fn(&str) -> Option<String>,
    {
        let file = entries
            .into_iter()
            .collect::<Result<HashMap<_, _>, _>>()
            .map_err(|e| ConfigError::Load(e.to_string()))?;
        Self::from_lookup(|key| env(key).or_else(|| file.get(key).cloned()))
    }

    /// Resolve settings from a key lookup. Empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = parse_port(get("DB_PORT").as_deref())?;
        let parts = [
            ("DB_USER", get("DB_USER")),
            ("DB_PASS", get("DB_PASS")),
            ("DB_HOST", get("DB_HOST")),
            ("DB_NAME", get("DB_NAME")),
        ];
        let missing: Vec<&'static str> = parts
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(k, _)| *k)
            .collect();
        let database = match parts {
            [(_, Some(user)), (_, Some(password)), (_, Some(host)), (_, Some(name))] => {
                Some(DatabaseSettings {
                    user,
                    password,
                    host,
                    port,
                    name,
                })
            }
            _ => None,
        };

        let database_url = match get("DATABASE_URL") {
            Some(url) => {
                check_database_url(&url)?;
                url
            }
            None => database
                .as_ref()
                .map(DatabaseSettings::url)
                .ok_or(ConfigError::MissingDatabaseFields(missing))?,
        };
        check_connect_options(&database_url)?;

        let log_level = match get("LOG_LEVEL") {
            Some(raw) => Level::from_str(raw.trim()).map_err(|_| ConfigError::InvalidLogLevel(raw))?,
            None => Level::INFO,
        };

        Ok(Settings {
            project_name: get("PROJECT_NAME").unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string()),
            database,
            database_url,
            example: ExampleSettings {
                url: get("EXAMPLE_URL"),
                users_queue: get("EXAMPLE_QUEUE_USERS"),
                errors_queue: get("EXAMPLE_ERROR"),
            },
            log_level,
        })
    }

    /// Log the resolved settings. Call after the subscriber is installed.
    pub fn log_summary(&self) {
        tracing::info!(
            project = %self.project_name,
            database_url = %redact_url(&self.database_url),
            log_level = %self.log_level,
            "settings loaded"
        );
        if !self.example.is_complete() {
            tracing::warn!(
                "incomplete example configuration: set EXAMPLE_URL, EXAMPLE_QUEUE_USERS and EXAMPLE_ERROR"
            );
        }
    }
}
