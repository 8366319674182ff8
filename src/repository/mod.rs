//! Storage contract used by the planner.
//!
//! A [`Repository`] offers the five record operations directly and through a
//! [`Transaction`] handle from [`Repository::begin`]. A transaction only takes
//! effect on [`Transaction::commit`]; dropping the handle rolls it back, which
//! is also what happens when the future driving it is cancelled.
//!
//! When two transactions both run "list shifts for (worker, day), then
//! insert" for the same pair, implementations must let at most one commit
//! and fail the other with `DayAlreadyBooked`, either by isolation or by a
//! uniqueness rule on the pair.

pub mod memory;

pub use memory::MemoryRepository;

use std::future::Future;

use crate::error::Result;
use crate::model::{Shift, ShiftsFilter, Worker, WorkerId, WorkersFilter};

/// Durable store for workers and shifts.
pub trait Repository: Send + Sync + 'static {
    type Tx: Transaction;

    fn create_worker(&self, worker: &Worker) -> impl Future<Output = Result<()>> + Send;

    /// Fails with [`Error::NoRecord`](crate::error::Error::NoRecord) when absent.
    fn get_worker(&self, id: WorkerId) -> impl Future<Output = Result<Worker>> + Send;

    fn list_workers(
        &self,
        filter: &WorkersFilter,
    ) -> impl Future<Output = Result<Vec<Worker>>> + Send;

    fn create_shift(&self, shift: &Shift) -> impl Future<Output = Result<()>> + Send;

    fn list_shifts(&self, filter: &ShiftsFilter)
    -> impl Future<Output = Result<Vec<Shift>>> + Send;

    /// Open a transaction.
    fn begin(&self) -> impl Future<Output = Result<Self::Tx>> + Send;

    /// Cheap liveness probe of the backing store.
    fn health_check(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Repository handle scoped to one transaction.
pub trait Transaction: Send {
    fn create_worker(&mut self, worker: &Worker) -> impl Future<Output = Result<()>> + Send;

    fn get_worker(&mut self, id: WorkerId) -> impl Future<Output = Result<Worker>> + Send;

    fn list_workers(
        &mut self,
        filter: &WorkersFilter,
    ) -> impl Future<Output = Result<Vec<Worker>>> + Send;

    fn create_shift(&mut self, shift: &Shift) -> impl Future<Output = Result<()>> + Send;

    fn list_shifts(
        &mut self,
        filter: &ShiftsFilter,
    ) -> impl Future<Output = Result<Vec<Shift>>> + Send;

    fn commit(self) -> impl Future<Output = Result<()>> + Send;

    fn rollback(self) -> impl Future<Output = Result<()>> + Send;
}
