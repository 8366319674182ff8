//! Planner behaviour against the in-memory repository, plus a scripted
//! wrapper that records repository calls and injects failures.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use uuid::Uuid;
use work_planner::error::{Error, ErrorKind, Result};
use work_planner::model::{Shift, ShiftsFilter, Worker, WorkerId, WorkersFilter};
use work_planner::planner::{Planner, PlannerConfig};
use work_planner::repository::memory::MemoryTransaction;
use work_planner::repository::{MemoryRepository, Repository, Transaction};

fn at(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

// ---------------------------------------------------------------------------
// Scripted repository
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct Scripted {
    inner: MemoryRepository,
    fail: Option<&'static str>,
    begin_delay: Option<Duration>,
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl Scripted {
    fn failing(op: &'static str) -> Self {
        Self {
            fail: Some(op),
            ..Self::default()
        }
    }

    fn step(&self, op: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(op);
        if self.fail == Some(op) {
            Err(Error::Other(format!("{op}: connection reset")))
        } else {
            Ok(())
        }
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl Repository for Scripted {
    type Tx = ScriptedTx;

    async fn create_worker(&self, worker: &Worker) -> Result<()> {
        self.step("create_worker")?;
        self.inner.create_worker(worker).await
    }

    async fn get_worker(&self, id: WorkerId) -> Result<Worker> {
        self.step("get_worker")?;
        self.inner.get_worker(id).await
    }

    async fn list_workers(&self, filter: &WorkersFilter) -> Result<Vec<Worker>> {
        self.step("list_workers")?;
        self.inner.list_workers(filter).await
    }

    async fn create_shift(&self, shift: &Shift) -> Result<()> {
        self.step("create_shift")?;
        self.inner.create_shift(shift).await
    }

    async fn list_shifts(&self, filter: &ShiftsFilter) -> Result<Vec<Shift>> {
        self.step("list_shifts")?;
        self.inner.list_shifts(filter).await
    }

    async fn begin(&self) -> Result<ScriptedTx> {
        self.step("begin")?;
        let inner = self.inner.begin().await?;
        if let Some(delay) = self.begin_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(ScriptedTx {
            inner,
            script: self.clone(),
        })
    }

    async fn health_check(&self) -> Result<()> {
        self.step("health_check")
    }
}

struct ScriptedTx {
    inner: MemoryTransaction,
    script: Scripted,
}

impl Transaction for ScriptedTx {
    async fn create_worker(&mut self, worker: &Worker) -> Result<()> {
        self.script.step("tx.create_worker")?;
        self.inner.create_worker(worker).await
    }

    async fn get_worker(&mut self, id: WorkerId) -> Result<Worker> {
        self.script.step("tx.get_worker")?;
        self.inner.get_worker(id).await
    }

    async fn list_workers(&mut self, filter: &WorkersFilter) -> Result<Vec<Worker>> {
        self.script.step("tx.list_workers")?;
        self.inner.list_workers(filter).await
    }

    async fn create_shift(&mut self, shift: &Shift) -> Result<()> {
        self.script.step("tx.create_shift")?;
        self.inner.create_shift(shift).await
    }

    async fn list_shifts(&mut self, filter: &ShiftsFilter) -> Result<Vec<Shift>> {
        self.script.step("tx.list_shifts")?;
        self.inner.list_shifts(filter).await
    }

    async fn commit(self) -> Result<()> {
        self.script.step("commit")?;
        self.inner.commit().await
    }

    async fn rollback(self) -> Result<()> {
        self.script.step("rollback")?;
        self.inner.rollback().await
    }
}

async fn with_worker<R: Repository>(planner: &Planner<R>, name: &str) -> Worker {
    planner.create_worker(Worker::new(name)).await.unwrap()
}

// ---------------------------------------------------------------------------
// Workers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_worker_replaces_caller_id() {
    let fixed = Uuid::new_v4();
    let planner = Planner::new(MemoryRepository::new()).with_id_generator(move || fixed);

    let supplied = Worker::new("Buddy Guy");
    let supplied_id = supplied.id;
    let created = planner.create_worker(supplied).await.unwrap();

    assert_eq!(created.id, WorkerId(fixed));
    assert_ne!(created.id, supplied_id);
    assert_eq!(created.name, "Buddy Guy");
    assert_eq!(planner.get_worker(created.id).await.unwrap(), created);
}

#[tokio::test]
async fn create_worker_wraps_repository_error() {
    let planner = Planner::new(Scripted::failing("create_worker"));

    let err = planner
        .create_worker(Worker::new("Buddy Guy"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Infrastructure);
    assert_eq!(
        err.to_string(),
        "creating worker: create_worker: connection reset"
    );
}

#[tokio::test]
async fn get_unknown_worker_is_no_record() {
    let planner = Planner::new(MemoryRepository::new());

    let err = planner.get_worker(WorkerId::new()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoRecord);
    assert!(err.to_string().starts_with("get worker: no record"));
}

#[tokio::test]
async fn list_workers_passes_filter_through() {
    let planner = Planner::new(MemoryRepository::new());
    with_worker(&planner, "Buddy Guy").await;
    with_worker(&planner, "Buddy Friend").await;
    with_worker(&planner, "Someone Else").await;

    let names: Vec<_> = planner
        .list_workers(WorkersFilter::name("buddy"))
        .await
        .unwrap()
        .into_iter()
        .map(|w| w.name)
        .collect();
    assert_eq!(names, vec!["Buddy Friend", "Buddy Guy"]);

    let all = planner.list_workers(WorkersFilter::default()).await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn list_workers_wraps_repository_error() {
    let planner = Planner::new(Scripted::failing("list_workers"));

    let err = planner
        .list_workers(WorkersFilter::default())
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("list workers: "));
}

// ---------------------------------------------------------------------------
// Shift booking
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_shift_assigns_id_and_normalizes_date() {
    let planner = Planner::new(MemoryRepository::new());
    let worker = with_worker(&planner, "Buddy Guy").await;

    let fixed = Uuid::new_v4();
    let planner = planner.with_id_generator(move || fixed);
    let input = Shift::new(worker.id, at("2025-11-03T08:00:00Z"), 8, 16);
    let supplied_id = input.id;

    let shift = planner.create_shift(input).await.unwrap();
    assert_eq!(shift.id.0, fixed);
    assert_ne!(shift.id, supplied_id);
    assert_eq!(shift.date, at("2025-11-03T00:00:00Z"));
    assert_eq!((shift.start_hour, shift.end_hour), (8, 16));

    let stored = planner.list_shifts(ShiftsFilter::default()).await.unwrap();
    assert_eq!(stored, vec![shift]);
}

#[tokio::test]
async fn second_shift_on_same_day_is_rejected() {
    let planner = Planner::new(MemoryRepository::new());
    let worker = with_worker(&planner, "Buddy Guy").await;

    planner
        .create_shift(Shift::new(worker.id, at("2025-11-03T00:00:00Z"), 8, 16))
        .await
        .unwrap();

    let err = planner
        .create_shift(Shift::new(worker.id, at("2025-11-03T00:00:00Z"), 16, 24))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DayAlreadyBooked);
    assert!(matches!(err.root(), Error::DayAlreadyBooked));

    // Any time of day, any offset, as long as it is the same calendar day.
    let err = planner
        .create_shift(Shift::new(worker.id, at("2025-11-03T22:45:00-05:00"), 0, 4))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DayAlreadyBooked);

    planner
        .create_shift(Shift::new(worker.id, at("2025-11-04T00:00:00Z"), 8, 16))
        .await
        .unwrap();

    let on_day = planner
        .list_shifts(ShiftsFilter::day(worker.id, at("2025-11-03T00:00:00Z")))
        .await
        .unwrap();
    assert_eq!(on_day.len(), 1);
    assert_eq!((on_day[0].start_hour, on_day[0].end_hour), (8, 16));
}

#[tokio::test]
async fn same_day_for_different_workers_is_fine() {
    let planner = Planner::new(MemoryRepository::new());
    let buddy = with_worker(&planner, "Buddy Guy").await;
    let friend = with_worker(&planner, "Buddy Friend").await;
    let day = at("2025-11-03T00:00:00Z");

    planner
        .create_shift(Shift::new(buddy.id, day, 8, 16))
        .await
        .unwrap();
    planner
        .create_shift(Shift::new(friend.id, day, 8, 16))
        .await
        .unwrap();

    let shifts = planner
        .list_shifts(ShiftsFilter {
            worker_id: None,
            date: Some(day),
        })
        .await
        .unwrap();
    assert_eq!(shifts.len(), 2);
}

#[tokio::test]
async fn unknown_worker_is_no_record_and_writes_nothing() {
    let planner = Planner::new(MemoryRepository::new());

    let err = planner
        .create_shift(Shift::new(WorkerId::new(), at("2025-11-03T00:00:00Z"), 8, 16))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoRecord);
    assert!(
        err.to_string()
            .starts_with("create shift transaction: verify worker: no record")
    );
    assert!(
        planner
            .list_shifts(ShiftsFilter::default())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn booking_runs_check_then_insert_in_one_transaction() {
    let repo = Scripted::default();
    let planner = Planner::new(repo.clone());
    let worker = with_worker(&planner, "Buddy Guy").await;
    repo.clear_calls();

    planner
        .create_shift(Shift::new(worker.id, at("2025-11-03T00:00:00Z"), 8, 16))
        .await
        .unwrap();
    assert_eq!(
        repo.calls(),
        vec![
            "begin",
            "tx.get_worker",
            "tx.list_shifts",
            "tx.create_shift",
            "commit"
        ]
    );
}

#[tokio::test]
async fn conflict_rolls_back_without_insert() {
    let repo = Scripted::default();
    let planner = Planner::new(repo.clone());
    let worker = with_worker(&planner, "Buddy Guy").await;
    planner
        .create_shift(Shift::new(worker.id, at("2025-11-03T00:00:00Z"), 8, 16))
        .await
        .unwrap();
    repo.clear_calls();

    let err = planner
        .create_shift(Shift::new(worker.id, at("2025-11-03T00:00:00Z"), 0, 8))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DayAlreadyBooked);
    assert_eq!(
        repo.calls(),
        vec!["begin", "tx.get_worker", "tx.list_shifts", "rollback"]
    );
}

#[tokio::test]
async fn worker_check_can_be_disabled() {
    let repo = Scripted::default();
    let planner = Planner::with_config(
        repo.clone(),
        PlannerConfig {
            verify_worker: false,
            ..PlannerConfig::default()
        },
    );
    let worker = with_worker(&planner, "Buddy Guy").await;
    repo.clear_calls();

    planner
        .create_shift(Shift::new(worker.id, at("2025-11-03T00:00:00Z"), 8, 16))
        .await
        .unwrap();
    assert_eq!(
        repo.calls(),
        vec!["begin", "tx.list_shifts", "tx.create_shift", "commit"]
    );

    // Storage still refuses dangling references.
    let err = planner
        .create_shift(Shift::new(WorkerId::new(), at("2025-11-03T00:00:00Z"), 8, 16))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoRecord);
}

#[tokio::test]
async fn repository_failures_in_transaction_are_wrapped() {
    for (op, context) in [
        ("begin", "create shift transaction: begin transaction: "),
        ("tx.get_worker", "create shift transaction: get worker: "),
        ("tx.list_shifts", "create shift transaction: list shifts: "),
        ("tx.create_shift", "create shift transaction: creating shift: "),
        ("commit", "create shift transaction: commit: "),
    ] {
        let repo = Scripted::failing(op);
        let planner = Planner::new(repo.clone());
        let worker = with_worker(&planner, "Buddy Guy").await;

        let err = planner
            .create_shift(Shift::new(worker.id, at("2025-11-03T00:00:00Z"), 8, 16))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Infrastructure, "{op}");
        assert!(err.to_string().starts_with(context), "{op}: {err}");
        assert!(
            repo.inner
                .list_shifts(&ShiftsFilter::default())
                .await
                .unwrap()
                .is_empty(),
            "{op} left a shift behind"
        );
    }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_shifts_matches_whole_day() {
    let planner = Planner::new(MemoryRepository::new());
    let worker = with_worker(&planner, "Buddy Guy").await;
    planner
        .create_shift(Shift::new(worker.id, at("2025-11-03T09:30:00Z"), 8, 16))
        .await
        .unwrap();

    let by_time = planner
        .list_shifts(ShiftsFilter::day(worker.id, at("2025-11-03T14:22:15Z")))
        .await
        .unwrap();
    let by_midnight = planner
        .list_shifts(ShiftsFilter::day(worker.id, at("2025-11-03T00:00:00Z")))
        .await
        .unwrap();
    assert_eq!(by_time.len(), 1);
    assert_eq!(by_time, by_midnight);

    let other_day = planner
        .list_shifts(ShiftsFilter::day(worker.id, at("2025-11-04T00:00:00Z")))
        .await
        .unwrap();
    assert!(other_day.is_empty());
}

#[tokio::test]
async fn list_shifts_wraps_repository_error() {
    let repo = Scripted::failing("list_shifts");
    let planner = Planner::new(repo);

    let err = planner
        .list_shifts(ShiftsFilter::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Infrastructure);
    assert!(err.to_string().starts_with("list shifts: "));
}

// ---------------------------------------------------------------------------
// Concurrency and cancellation
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bookings_for_same_day_admit_one() {
    let planner = Planner::new(MemoryRepository::new());
    let worker_id = with_worker(&planner, "Buddy Guy").await.id;

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let planner = planner.clone();
            tokio::spawn(async move {
                planner
                    .create_shift(Shift::new(worker_id, at("2025-11-03T06:00:00Z"), i, i + 8))
                    .await
            })
        })
        .collect();

    let mut booked = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => booked += 1,
            Err(e) => {
                assert_eq!(e.kind(), ErrorKind::DayAlreadyBooked, "{e}");
                conflicts += 1;
            }
        }
    }
    assert_eq!(booked, 1);
    assert_eq!(conflicts, 7);

    let stored = planner
        .list_shifts(ShiftsFilter::day(worker_id, at("2025-11-03T00:00:00Z")))
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn timed_out_booking_rolls_back() {
    let repo = Scripted {
        begin_delay: Some(Duration::from_millis(200)),
        ..Scripted::default()
    };
    let planner = Planner::with_config(
        repo.clone(),
        PlannerConfig {
            operation_timeout: Some(Duration::from_millis(20)),
            ..PlannerConfig::default()
        },
    );
    let worker = with_worker(&planner, "Buddy Guy").await;

    let err = planner
        .create_shift(Shift::new(worker.id, at("2025-11-03T00:00:00Z"), 8, 16))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Infrastructure);
    assert!(matches!(err.root(), Error::Timeout(_)));

    // The abandoned transaction released the store.
    let stored = repo
        .inner
        .list_shifts(&ShiftsFilter::default())
        .await
        .unwrap();
    assert!(stored.is_empty());
}
