//! Shift queries and booking error classification.

use crate::error::{Error, Result};
use crate::model::{Shift, ShiftId, ShiftsFilter, WorkerId};
use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Unique index on (worker_id, date). See migrations.
const WORKER_DAY_CONSTRAINT: &str = "shifts_worker_day_key";

pub(crate) async fn insert<'e>(exec: impl PgExecutor<'e>, shift: &Shift) -> Result<()> {
    sqlx::query(
        "INSERT INTO shifts (id, worker_id, date, start_hour, end_hour)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(shift.id.0)
    .bind(shift.worker_id.0)
    .bind(shift.date.with_timezone(&Utc))
    .bind(shift.start_hour)
    .bind(shift.end_hour)
    .execute(exec)
    .await
    .map_err(|e| classify_insert_error(e, shift))?;
    Ok(())
}

pub(crate) async fn list<'e>(
    exec: impl PgExecutor<'e>,
    filter: &ShiftsFilter,
) -> Result<Vec<Shift>> {
    let rows: Vec<ShiftRow> = sqlx::query_as(
        "SELECT id, worker_id, date, start_hour, end_hour FROM shifts
         WHERE ($1::uuid IS NULL OR worker_id = $1)
         AND ($2::timestamptz IS NULL OR date = $2)
         ORDER BY date, start_hour, id",
    )
    .bind(filter.worker_id.map(|id| id.0))
    .bind(filter.date.map(|d| d.with_timezone(&Utc)))
    .fetch_all(exec)
    .await?;

    Ok(rows.into_iter().map(Shift::from).collect())
}

fn classify_insert_error(err: sqlx::Error, shift: &Shift) -> Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() && db_err.constraint() == Some(WORKER_DAY_CONSTRAINT) {
            return Error::DayAlreadyBooked;
        }
        if db_err.is_foreign_key_violation() {
            return Error::NoRecord(format!("worker {}", shift.worker_id));
        }
    }
    Error::Storage(err)
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct ShiftRow {
    id: Uuid,
    worker_id: Uuid,
    date: DateTime<Utc>,
    start_hour: i32,
    end_hour: i32,
}

impl From<ShiftRow> for Shift {
    fn from(row: ShiftRow) -> Self {
        Self {
            id: ShiftId(row.id),
            worker_id: WorkerId(row.worker_id),
            date: row.date.fixed_offset(),
            start_hour: row.start_hour,
            end_hour: row.end_hour,
        }
    }
}
