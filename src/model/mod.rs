//! Core data model.
//!
//! A worker is someone who can be booked. A shift is one block of hours for
//! one worker on one calendar day. Field rules are declared here with
//! `validator` and checked by callers before they reach the planner.

pub mod shift;
pub mod worker;

pub use shift::{Shift, ShiftId, ShiftsFilter, normalize_date};
pub use worker::{Worker, WorkerId, WorkersFilter};

use validator::ValidationErrors;

/// Names of the fields that failed validation, sorted and deduplicated.
///
/// Struct-level rules report under their error code, which is the name of
/// the field they constrain.
pub fn invalid_fields(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            if field == "__all__" {
                errs.iter().map(|e| e.code.to_string()).collect::<Vec<_>>()
            } else {
                vec![field.to_string()]
            }
        })
        .collect();
    fields.sort();
    fields.dedup();
    fields
}
