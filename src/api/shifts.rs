//! Shift endpoints.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use chrono::DateTime;
use serde::Deserialize;
use validator::Validate;

use super::error::ApiError;
use crate::model::{Shift, ShiftsFilter, WorkerId};
use crate::planner::Planner;
use crate::repository::Repository;

pub fn routes<R: Repository>() -> Router<Planner<R>> {
    Router::new()
        .route("/shift", post(create_shift::<R>))
        .route("/shifts", get(list_shifts::<R>))
}

/// Query parameters for listing shifts. Empty values mean unfiltered.
#[derive(Debug, Default, Deserialize)]
pub struct ListShiftsQuery {
    pub worker_id: Option<String>,
    /// RFC 3339 timestamp; any time on the wanted day.
    pub date: Option<String>,
}

impl TryFrom<ListShiftsQuery> for ShiftsFilter {
    type Error = ApiError;

    fn try_from(query: ListShiftsQuery) -> Result<Self, ApiError> {
        let mut filter = ShiftsFilter::default();
        if let Some(raw) = query.worker_id.filter(|v| !v.is_empty()) {
            let id: WorkerId = raw
                .parse()
                .map_err(|e| ApiError::bad_request(format!("worker_id: {e}")))?;
            filter.worker_id = Some(id);
        }
        if let Some(raw) = query.date.filter(|v| !v.is_empty()) {
            let date = DateTime::parse_from_rfc3339(&raw)
                .map_err(|e| ApiError::bad_request(format!("date: {e}")))?;
            filter.date = Some(date);
        }
        Ok(filter)
    }
}

async fn create_shift<R: Repository>(
    State(planner): State<Planner<R>>,
    payload: Result<Json<Shift>, JsonRejection>,
) -> Result<(StatusCode, Json<Shift>), ApiError> {
    let Json(shift) = payload?;
    shift.validate()?;

    let shift = planner
        .create_shift(shift)
        .await
        .map_err(|e| ApiError::from_planner(e, "create shift"))?;
    Ok((StatusCode::CREATED, Json(shift)))
}

async fn list_shifts<R: Repository>(
    State(planner): State<Planner<R>>,
    Query(query): Query<ListShiftsQuery>,
) -> Result<Json<Vec<Shift>>, ApiError> {
    let filter = ShiftsFilter::try_from(query)?;
    let shifts = planner
        .list_shifts(filter)
        .await
        .map_err(|e| ApiError::from_planner(e, "list shifts"))?;
    Ok(Json(shifts))
}
