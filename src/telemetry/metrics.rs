//! Metric instrument factories for work-planner.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"work-planner"` meter.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for work-planner instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("work-planner")
}

/// Counter: workers registered.
/// Labels: `result` ("ok" | "error").
pub fn workers_created() -> Counter<u64> {
    meter()
        .u64_counter("planner.workers.created")
        .with_description("Number of worker registrations")
        .build()
}

/// Counter: shift booking attempts.
/// Labels: `result` ("ok" | "day_already_booked" | "no_record" | "error").
pub fn shifts_booked() -> Counter<u64> {
    meter()
        .u64_counter("planner.shifts.booked")
        .with_description("Number of shift booking attempts by outcome")
        .build()
}

/// Histogram: planner operation duration in milliseconds.
/// Labels: `operation`.
pub fn operation_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("planner.operation.duration_ms")
        .with_description("Planner operation duration in milliseconds")
        .with_unit("ms")
        .build()
}
