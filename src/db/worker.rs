//! Worker queries.

use crate::error::{Error, Result};
use crate::model::{Worker, WorkerId, WorkersFilter};
use sqlx::PgExecutor;
use uuid::Uuid;

pub(crate) async fn insert<'e>(exec: impl PgExecutor<'e>, worker: &Worker) -> Result<()> {
    sqlx::query("INSERT INTO workers (id, name) VALUES ($1, $2)")
        .bind(worker.id.0)
        .bind(&worker.name)
        .execute(exec)
        .await?;
    Ok(())
}

pub(crate) async fn get<'e>(exec: impl PgExecutor<'e>, id: WorkerId) -> Result<Worker> {
    let row: Option<WorkerRow> = sqlx::query_as("SELECT id, name FROM workers WHERE id = $1")
        .bind(id.0)
        .fetch_optional(exec)
        .await?;

    row.map(Worker::from)
        .ok_or_else(|| Error::NoRecord(format!("worker {id}")))
}

pub(crate) async fn list<'e>(
    exec: impl PgExecutor<'e>,
    filter: &WorkersFilter,
) -> Result<Vec<Worker>> {
    let rows: Vec<WorkerRow> = sqlx::query_as(
        "SELECT id, name FROM workers
         WHERE ($1::text IS NULL OR strpos(lower(name), lower($1)) > 0)
         ORDER BY name, id",
    )
    .bind(filter.name.as_deref())
    .fetch_all(exec)
    .await?;

    Ok(rows.into_iter().map(Worker::from).collect())
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct WorkerRow {
    id: Uuid,
    name: String,
}

impl From<WorkerRow> for Worker {
    fn from(row: WorkerRow) -> Self {
        Self {
            id: WorkerId(row.id),
            name: row.name,
        }
    }
}
