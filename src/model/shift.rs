//! Shift types and day normalization.
//!
//! A shift's `date` is a calendar day. Before a date is stored or compared it
//! goes through [`normalize_date`], so time-of-day never takes part in
//! conflict detection.

use chrono::{DateTime, FixedOffset, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::worker::WorkerId;

/// A single booked block of hours for one worker on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_hour_order", skip_on_field_errors = false))]
pub struct Shift {
    /// Assigned by the planner on creation. Any incoming value is replaced.
    #[serde(default)]
    pub id: ShiftId,

    pub worker_id: WorkerId,

    /// Calendar day of the shift. Stored as midnight UTC.
    pub date: DateTime<FixedOffset>,

    /// Missing hours read as 0 and are left to validation.
    #[serde(default)]
    #[validate(range(min = 0, max = 23))]
    pub start_hour: i32,

    #[serde(default)]
    #[validate(range(min = 1, max = 24))]
    pub end_hour: i32,
}

impl Shift {
    pub fn new(
        worker_id: WorkerId,
        date: DateTime<FixedOffset>,
        start_hour: i32,
        end_hour: i32,
    ) -> Self {
        Self {
            id: ShiftId::default(),
            worker_id,
            date,
            start_hour,
            end_hour,
        }
    }
}

fn validate_hour_order(shift: &Shift) -> Result<(), ValidationError> {
    if shift.end_hour > shift.start_hour {
        Ok(())
    } else {
        // Reported under the constrained field's name.
        Err(ValidationError::new("end_hour"))
    }
}

/// Newtype for shift IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShiftId(pub Uuid);

impl ShiftId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ShiftId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for ShiftId {
    fn default() -> Self {
        Self::new()
    }
}

/// Filters for listing shifts. `None` means unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShiftsFilter {
    pub worker_id: Option<WorkerId>,
    /// Matched against the normalized day.
    pub date: Option<DateTime<FixedOffset>>,
}

impl ShiftsFilter {
    /// Filter for the booking conflict check.
    pub fn day(worker_id: WorkerId, date: DateTime<FixedOffset>) -> Self {
        Self {
            worker_id: Some(worker_id),
            date: Some(date),
        }
    }

    /// Exact comparison. Callers normalize the date first.
    pub fn matches(&self, shift: &Shift) -> bool {
        self.worker_id.is_none_or(|id| shift.worker_id == id)
            && self.date.is_none_or(|date| shift.date == date)
    }
}

/// Collapse a timestamp to its calendar day, expressed as midnight UTC.
///
/// The day is the one written in the timestamp's own offset, so
/// `2025-11-03T23:30:00-05:00` and `2025-11-03T01:00:00+09:00` both
/// become `2025-11-03T00:00:00Z`. Already-normalized values are unchanged.
pub fn normalize_date(date: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let midnight = date.date_naive().and_time(NaiveTime::MIN);
    Utc.from_utc_datetime(&midnight).fixed_offset()
}
