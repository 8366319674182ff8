//! # work-planner
//!
//! Registers workers and books at most one shift per worker per calendar day.
//!
//! The [`planner::Planner`] owns the booking rule and runs it inside a
//! [`repository::Repository`] transaction. Repositories exist for Postgres
//! ([`db::Db`]) and for process memory ([`repository::MemoryRepository`]).
//! The [`api`] module serves the planner over HTTP.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod planner;
pub mod repository;
pub mod telemetry;

pub use error::{Error, ErrorKind, Result};
pub use planner::{Planner, PlannerConfig};
