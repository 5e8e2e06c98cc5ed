//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("incomplete database configuration: missing {}", .0.join(", "))]
    MissingDatabaseFields(Vec<&'static str>),
    #[error("invalid DB_PORT '{0}': expected an integer in 0..=65535")]
    InvalidPort(String),
    #[error("invalid DATABASE_URL: expected a postgres:// or postgresql:// url")]
    InvalidDatabaseUrl,
    #[error("invalid LOG_LEVEL '{0}'")]
    InvalidLogLevel(String),
    #[error("config load: {0}")]
    Load(String),
}

/// Failure inside a session or its backing store.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("database: {0}")]
    Db(sqlx::Error),
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for PersistenceError {
    fn from(e: sqlx::Error) -> Self {
        use sqlx::error::ErrorKind;
        match e.as_database_error().map(|d| d.kind()) {
            Some(
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation,
            ) => PersistenceError::Constraint(e.to_string()),
            _ => PersistenceError::Db(e),
        }
    }
}

/// Startup failure before the server accepts requests.
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl From<sqlx::Error> for BootstrapError {
    fn from(e: sqlx::Error) -> Self {
        BootstrapError::Persistence(e.into())
    }
}

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },
    #[error("unknown column '{column}' on {entity}")]
    UnknownColumn { entity: &'static str, column: String },
    #[error("{entity}.{column} is longer than {max} characters")]
    TooLong {
        entity: &'static str,
        column: &'static str,
        max: usize,
    },
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("row mapping: {0}")]
    Mapping(#[from] serde_json::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(e: sqlx::Error) -> Self {
        RepositoryError::Persistence(e.into())
    }
}

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("queue unavailable: {0}")]
    Unavailable(String),
    #[error("encode message: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("decode message: {0}")]
    Decode(#[source] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl From<PersistenceError> for AppError {
    fn from(e: PersistenceError) -> Self {
        AppError::Repository(RepositoryError::Persistence(e))
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Repository(e) => match e {
                RepositoryError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
                RepositoryError::UnknownColumn { .. } | RepositoryError::TooLong { .. } => {
                    (StatusCode::BAD_REQUEST, "bad_request")
                }
                RepositoryError::Persistence(PersistenceError::Constraint(_)) => {
                    (StatusCode::CONFLICT, "conflict")
                }
                RepositoryError::Persistence(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                }
                RepositoryError::Mapping(_) => (StatusCode::INTERNAL_SERVER_ERROR, "mapping_error"),
            },
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
