//! The planner: worker registration and one-shift-per-day booking.
//!
//! The planner holds no mutable state. The booking invariant (at most one
//! shift per worker per normalized day) is enforced by running the conflict
//! check and the insert in a single repository transaction; under
//! concurrency the repository breaks ties for the same worker and day.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use opentelemetry::KeyValue;
use tracing::{Instrument, warn};
use uuid::Uuid;

use crate::error::{Error, ErrorKind, Result, ResultExt};
use crate::model::{
    Shift, ShiftId, ShiftsFilter, Worker, WorkerId, WorkersFilter, normalize_date,
};
use crate::repository::{Repository, Transaction};
use crate::telemetry::metrics;
use crate::telemetry::planner::{
    record_result, result_label, start_booking_span, start_operation_span,
};

/// Source of fresh record IDs.
pub type IdGenerator = Arc<dyn Fn() -> Uuid + Send + Sync>;

/// Planner behaviour switches.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Check that the referenced worker exists before booking a shift.
    pub verify_worker: bool,
    /// Upper bound on each operation. Expiry drops the in-flight work,
    /// rolling back any open transaction.
    pub operation_timeout: Option<Duration>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            verify_worker: true,
            operation_timeout: None,
        }
    }
}

pub struct Planner<R> {
    repo: Arc<R>,
    config: PlannerConfig,
    next_id: IdGenerator,
}

impl<R> Clone for Planner<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            config: self.config.clone(),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl<R: Repository> Planner<R> {
    pub fn new(repo: R) -> Self {
        Self::with_config(repo, PlannerConfig::default())
    }

    pub fn with_config(repo: R, config: PlannerConfig) -> Self {
        Self {
            repo: Arc::new(repo),
            config,
            next_id: Arc::new(Uuid::new_v4),
        }
    }

    /// Replace the ID source (deterministic IDs in tests).
    pub fn with_id_generator(mut self, next_id: impl Fn() -> Uuid + Send + Sync + 'static) -> Self {
        self.next_id = Arc::new(next_id);
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Register a worker under a freshly generated ID.
    pub async fn create_worker(&self, mut worker: Worker) -> Result<Worker> {
        worker.id = WorkerId((self.next_id)());

        let result = self
            .observe("create_worker", self.repo.create_worker(&worker))
            .await
            .context("creating worker");
        metrics::workers_created().add(1, &[KeyValue::new("result", result_label(&result))]);
        result.map(|()| worker)
    }

    /// Fetch a worker. Absence is reported as [`ErrorKind::NoRecord`].
    pub async fn get_worker(&self, id: WorkerId) -> Result<Worker> {
        self.observe("get_worker", self.repo.get_worker(id))
            .await
            .context("get worker")
    }

    pub async fn list_workers(&self, filter: WorkersFilter) -> Result<Vec<Worker>> {
        self.observe("list_workers", self.repo.list_workers(&filter))
            .await
            .context("list workers")
    }

    /// Book a shift.
    ///
    /// The shift gets a fresh ID and its date is normalized to midnight UTC.
    /// Fails with [`ErrorKind::DayAlreadyBooked`] if the worker already has a
    /// shift that day, and with [`ErrorKind::NoRecord`] if worker
    /// verification is enabled and the worker does not exist. Nothing is
    /// written on failure.
    pub async fn create_shift(&self, mut shift: Shift) -> Result<Shift> {
        shift.id = ShiftId((self.next_id)());
        shift.date = normalize_date(shift.date);

        let span = start_booking_span(&shift.worker_id, &shift.date);
        let started = Instant::now();
        let result = self
            .bounded(self.book(&shift))
            .instrument(span.clone())
            .await
            .context("create shift transaction");

        let label = result_label(&result);
        record_result(&span, label);
        metrics::shifts_booked().add(1, &[KeyValue::new("result", label)]);
        metrics::operation_duration_ms().record(
            started.elapsed().as_secs_f64() * 1000.0,
            &[KeyValue::new("operation", "create_shift")],
        );
        result.map(|()| shift)
    }

    /// List shifts. A date filter matches the whole calendar day it falls on.
    pub async fn list_shifts(&self, mut filter: ShiftsFilter) -> Result<Vec<Shift>> {
        filter.date = filter.date.map(normalize_date);
        self.observe("list_shifts", self.repo.list_shifts(&filter))
            .await
            .context("list shifts")
    }

    /// Probe the backing store.
    pub async fn health_check(&self) -> Result<()> {
        self.bounded(self.repo.health_check()).await
    }

    /// Begin, check, insert, commit. Any failure rolls back.
    async fn book(&self, shift: &Shift) -> Result<()> {
        let mut tx = self.repo.begin().await.context("begin transaction")?;

        match check_and_insert(&mut tx, shift, self.config.verify_worker).await {
            Ok(()) => tx.commit().await.context("commit"),
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Run `fut` under the operation span, timeout and duration histogram.
    async fn observe<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let span = start_operation_span(operation);
        let started = Instant::now();
        let result = self.bounded(fut).instrument(span.clone()).await;

        record_result(&span, result_label(&result));
        metrics::operation_duration_ms().record(
            started.elapsed().as_secs_f64() * 1000.0,
            &[KeyValue::new("operation", operation)],
        );
        result
    }

    async fn bounded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match self.config.operation_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| Error::Timeout(limit))?,
            None => fut.await,
        }
    }
}

async fn check_and_insert<T: Transaction>(
    tx: &mut T,
    shift: &Shift,
    verify_worker: bool,
) -> Result<()> {
    if verify_worker {
        match tx.get_worker(shift.worker_id).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NoRecord => return Err(e.context("verify worker")),
            Err(e) => return Err(e.context("get worker")),
        }
    }

    let booked = tx
        .list_shifts(&ShiftsFilter::day(shift.worker_id, shift.date))
        .await
        .context("list shifts")?;
    if !booked.is_empty() {
        return Err(Error::DayAlreadyBooked);
    }

    tx.create_shift(shift).await.context("creating shift")
}
