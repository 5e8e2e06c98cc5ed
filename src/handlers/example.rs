//! Example resource handlers: one session per request, CRUD via the generic repository.

use crate::error::{AppError, RepositoryError};
use crate::model::{Entity, Example, ExampleCreate, ExampleUpdate};
use crate::response::{success_many, success_one, success_one_ok};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: u64,
    pub limit: Option<u64>,
}

/// Largest offset or limit PostgreSQL accepts (BIGINT).
const MAX_PAGE_BOUND: u64 = i64::MAX as u64;

impl ListParams {
    fn bounds(&self) -> Result<(u64, Option<u64>), AppError> {
        if self.skip > MAX_PAGE_BOUND {
            return Err(AppError::BadRequest(format!("skip must be at most {MAX_PAGE_BOUND}")));
        }
        if self.limit.is_some_and(|n| n > MAX_PAGE_BOUND) {
            return Err(AppError::BadRequest(format!("limit must be at most {MAX_PAGE_BOUND}")));
        }
        Ok((self.skip, self.limit))
    }
}

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("invalid uuid".into()))
}

fn not_found(id: &Uuid) -> AppError {
    AppError::Repository(RepositoryError::NotFound {
        entity: Example::TABLE.name,
        id: id.to_string(),
    })
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let (skip, limit) = params.bounds()?;
    let mut session = state.sessions.open().await?;
    let rows = state.examples.list(session.as_mut(), skip, limit).await?;
    Ok(success_many(rows))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<ExampleCreate>,
) -> Result<impl IntoResponse, AppError> {
    let mut session = state.sessions.open().await?;
    let created = state.examples.create(session.as_mut(), &body).await?;
    tracing::info!(id = %created.id, "example created");
    Ok(success_one(created))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let mut session = state.sessions.open().await?;
    let row = state
        .examples
        .get(session.as_mut(), &id)
        .await?
        .ok_or_else(|| not_found(&id))?;
    Ok(success_one_ok(row))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ExampleUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let mut session = state.sessions.open().await?;
    let existing = state
        .examples
        .get(session.as_mut(), &id)
        .await?
        .ok_or_else(|| not_found(&id))?;
    let updated = state.examples.update(session.as_mut(), &existing, &body).await?;
    Ok(success_one_ok(updated))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let mut session = state.sessions.open().await?;
    let removed = state.examples.remove(session.as_mut(), &id).await?;
    tracing::info!(id = %id, "example removed");
    Ok(success_one_ok(removed))
}

pub async fn deactivate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let mut session = state.sessions.open().await?;
    let row = state.examples.soft_remove(session.as_mut(), &id).await?;
    Ok(success_one_ok(row))
}
