//! In-memory repository.
//!
//! Tables live behind one async mutex. A transaction holds the lock for its
//! whole lifetime and works on a staged copy, so transactions are fully
//! serialized; commit publishes the copy, drop discards it.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{Repository, Transaction};
use crate::error::{Error, Result};
use crate::model::{Shift, ShiftId, ShiftsFilter, Worker, WorkerId, WorkersFilter};

#[derive(Debug, Clone, Default)]
struct Tables {
    workers: BTreeMap<WorkerId, Worker>,
    shifts: BTreeMap<ShiftId, Shift>,
}

impl Tables {
    fn insert_worker(&mut self, worker: &Worker) -> Result<()> {
        if self.workers.contains_key(&worker.id) {
            return Err(Error::Other(format!("duplicate worker id {}", worker.id)));
        }
        self.workers.insert(worker.id, worker.clone());
        Ok(())
    }

    fn get_worker(&self, id: WorkerId) -> Result<Worker> {
        self.workers
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NoRecord(format!("worker {id}")))
    }

    fn list_workers(&self, filter: &WorkersFilter) -> Vec<Worker> {
        let mut workers: Vec<Worker> = self
            .workers
            .values()
            .filter(|w| filter.matches(w))
            .cloned()
            .collect();
        workers.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        workers
    }

    /// Same constraints the Postgres schema enforces: the worker must exist
    /// and (worker_id, date) is unique.
    fn insert_shift(&mut self, shift: &Shift) -> Result<()> {
        if !self.workers.contains_key(&shift.worker_id) {
            return Err(Error::NoRecord(format!("worker {}", shift.worker_id)));
        }
        if self.shifts.contains_key(&shift.id) {
            return Err(Error::Other(format!("duplicate shift id {}", shift.id)));
        }
        let day = ShiftsFilter::day(shift.worker_id, shift.date);
        if self.shifts.values().any(|s| day.matches(s)) {
            return Err(Error::DayAlreadyBooked);
        }
        self.shifts.insert(shift.id, shift.clone());
        Ok(())
    }

    fn list_shifts(&self, filter: &ShiftsFilter) -> Vec<Shift> {
        let mut shifts: Vec<Shift> = self
            .shifts
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        shifts.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then(a.start_hour.cmp(&b.start_hour))
                .then(a.id.cmp(&b.id))
        });
        shifts
    }
}

/// Repository kept entirely in process memory. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Repository for MemoryRepository {
    type Tx = MemoryTransaction;

    async fn create_worker(&self, worker: &Worker) -> Result<()> {
        self.tables.lock().await.insert_worker(worker)
    }

    async fn get_worker(&self, id: WorkerId) -> Result<Worker> {
        self.tables.lock().await.get_worker(id)
    }

    async fn list_workers(&self, filter: &WorkersFilter) -> Result<Vec<Worker>> {
        Ok(self.tables.lock().await.list_workers(filter))
    }

    async fn create_shift(&self, shift: &Shift) -> Result<()> {
        self.tables.lock().await.insert_shift(shift)
    }

    async fn list_shifts(&self, filter: &ShiftsFilter) -> Result<Vec<Shift>> {
        Ok(self.tables.lock().await.list_shifts(filter))
    }

    async fn begin(&self) -> Result<MemoryTransaction> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let staged = guard.clone();
        Ok(MemoryTransaction { guard, staged })
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// Exclusive transaction over the in-memory tables.
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
}

impl Transaction for MemoryTransaction {
    async fn create_worker(&mut self, worker: &Worker) -> Result<()> {
        self.staged.insert_worker(worker)
    }

    async fn get_worker(&mut self, id: WorkerId) -> Result<Worker> {
        self.staged.get_worker(id)
    }

    async fn list_workers(&mut self, filter: &WorkersFilter) -> Result<Vec<Worker>> {
        Ok(self.staged.list_workers(filter))
    }

    async fn create_shift(&mut self, shift: &Shift) -> Result<()> {
        self.staged.insert_shift(shift)
    }

    async fn list_shifts(&mut self, filter: &ShiftsFilter) -> Result<Vec<Shift>> {
        Ok(self.staged.list_shifts(filter))
    }

    async fn commit(self) -> Result<()> {
        let MemoryTransaction { mut guard, staged } = self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}
