//! Worker endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use validator::Validate;

use super::error::ApiError;
use crate::model::{Worker, WorkerId, WorkersFilter};
use crate::planner::Planner;
use crate::repository::Repository;

pub fn routes<R: Repository>() -> Router<Planner<R>> {
    Router::new()
        .route("/worker", post(create_worker::<R>))
        .route("/worker/{id}", get(get_worker::<R>))
        .route("/workers", get(list_workers::<R>))
}

/// Query parameters for listing workers.
#[derive(Debug, Deserialize)]
pub struct ListWorkersQuery {
    /// Substring of the worker's name. Empty means unfiltered.
    pub name: Option<String>,
}

impl From<ListWorkersQuery> for WorkersFilter {
    fn from(query: ListWorkersQuery) -> Self {
        Self {
            name: query.name.filter(|n| !n.is_empty()),
        }
    }
}

async fn create_worker<R: Repository>(
    State(planner): State<Planner<R>>,
    payload: Result<Json<Worker>, JsonRejection>,
) -> Result<(StatusCode, Json<Worker>), ApiError> {
    let Json(worker) = payload?;
    worker.validate()?;

    let worker = planner
        .create_worker(worker)
        .await
        .map_err(|e| ApiError::from_planner(e, "create worker"))?;
    Ok((StatusCode::CREATED, Json(worker)))
}

async fn get_worker<R: Repository>(
    State(planner): State<Planner<R>>,
    Path(id): Path<String>,
) -> Result<Json<Worker>, ApiError> {
    let id: WorkerId = id
        .parse()
        .map_err(|e| ApiError::bad_request(format!("id: {e}")))?;

    let worker = planner
        .get_worker(id)
        .await
        .map_err(|e| ApiError::from_planner(e, "get worker"))?;
    Ok(Json(worker))
}

async fn list_workers<R: Repository>(
    State(planner): State<Planner<R>>,
    Query(query): Query<ListWorkersQuery>,
) -> Result<Json<Vec<Worker>>, ApiError> {
    let workers = planner
        .list_workers(query.into())
        .await
        .map_err(|e| ApiError::from_planner(e, "list workers"))?;
    Ok(Json(workers))
}
