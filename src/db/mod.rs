//! Postgres repository: connection pool, migrations, and health check.
//!
//! Queries are written once against a generic `PgExecutor` and shared by the
//! pool-level [`Db`] and the transaction-scoped [`DbTransaction`].
//! Transactions run at READ COMMITTED. The `(worker_id, date)` unique index
//! is what decides a race between two bookings for the same day: the later
//! insert waits for the earlier transaction and then fails with a unique
//! violation, reported as `DayAlreadyBooked`. Bookings for other days or
//! workers never conflict.

pub mod shift;
pub mod worker;

use crate::error::Result;
use crate::model::{Shift, ShiftsFilter, Worker, WorkerId, WorkersFilter};
use crate::repository::{Repository, Transaction};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres};

/// Default pool size.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Database handle. Owns the connection pool.
pub struct Db {
    pool: PgPool,
}

impl Db {
    /// Connect to Postgres with the default pool size.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with(url, DEFAULT_MAX_CONNECTIONS).await
    }

    /// Connect to Postgres and create a connection pool.
    pub async fn connect_with(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Run all pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Repository for Db {
    type Tx = DbTransaction;

    async fn create_worker(&self, worker: &Worker) -> Result<()> {
        worker::insert(&self.pool, worker).await
    }

    async fn get_worker(&self, id: WorkerId) -> Result<Worker> {
        worker::get(&self.pool, id).await
    }

    async fn list_workers(&self, filter: &WorkersFilter) -> Result<Vec<Worker>> {
        worker::list(&self.pool, filter).await
    }

    async fn create_shift(&self, shift: &Shift) -> Result<()> {
        shift::insert(&self.pool, shift).await
    }

    async fn list_shifts(&self, filter: &ShiftsFilter) -> Result<Vec<Shift>> {
        shift::list(&self.pool, filter).await
    }

    async fn begin(&self) -> Result<DbTransaction> {
        Ok(DbTransaction {
            tx: self.pool.begin().await?,
        })
    }

    /// Simple health check: run a SELECT 1.
    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Database transaction. Rolled back by sqlx if dropped uncommitted.
pub struct DbTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

impl Transaction for DbTransaction {
    async fn create_worker(&mut self, worker: &Worker) -> Result<()> {
        worker::insert(&mut *self.tx, worker).await
    }

    async fn get_worker(&mut self, id: WorkerId) -> Result<Worker> {
        worker::get(&mut *self.tx, id).await
    }

    async fn list_workers(&mut self, filter: &WorkersFilter) -> Result<Vec<Worker>> {
        worker::list(&mut *self.tx, filter).await
    }

    async fn create_shift(&mut self, shift: &Shift) -> Result<()> {
        shift::insert(&mut *self.tx, shift).await
    }

    async fn list_shifts(&mut self, filter: &ShiftsFilter) -> Result<Vec<Shift>> {
        shift::list(&mut *self.tx, filter).await
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
