//! Planner span helpers.
//!
//! Every planner operation runs inside a span carrying a `planner.result`
//! field that is filled in once the outcome is known.

use chrono::{DateTime, FixedOffset};
use tracing::Span;

use crate::error::{ErrorKind, Result};
use crate::model::WorkerId;

/// Start a span for a read or worker operation.
pub fn start_operation_span(operation: &'static str) -> Span {
    tracing::info_span!(
        "planner.operation",
        "planner.operation" = operation,
        "planner.result" = tracing::field::Empty,
    )
}

/// Start a span for a shift booking.
pub fn start_booking_span(worker_id: &WorkerId, date: &DateTime<FixedOffset>) -> Span {
    tracing::info_span!(
        "planner.create_shift",
        "shift.worker_id" = %worker_id,
        "shift.date" = %date.date_naive(),
        "planner.result" = tracing::field::Empty,
    )
}

/// Outcome label shared by spans and metrics.
pub fn result_label<T>(result: &Result<T>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) => match e.kind() {
            ErrorKind::DayAlreadyBooked => "day_already_booked",
            ErrorKind::NoRecord => "no_record",
            ErrorKind::Infrastructure => "error",
        },
    }
}

/// Record the outcome on the span and emit an event inside it.
pub fn record_result(span: &Span, result: &'static str) {
    span.record("planner.result", result);
    span.in_scope(|| {
        tracing::debug!(result = result, "planner_result");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn labels_follow_error_kind() {
        assert_eq!(result_label(&Ok(())), "ok");
        assert_eq!(
            result_label::<()>(&Err(Error::DayAlreadyBooked.context("booking"))),
            "day_already_booked"
        );
        assert_eq!(
            result_label::<()>(&Err(Error::NoRecord("worker".into()))),
            "no_record"
        );
        assert_eq!(
            result_label::<()>(&Err(Error::Other("boom".into()))),
            "error"
        );
    }
}
