//! Typed configuration from environment variables.
//!
//! Loads once at startup and fails fast on malformed values.
//! The database URL is wrapped in secrecy::SecretString to prevent log leaks.

pub mod secrets;

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::planner::PlannerConfig;
use secrets::SecretString;

#[derive(Debug)]
pub struct Config {
    /// Postgres URL. When unset the service runs on the in-memory store.
    pub database_url: Option<SecretString>,
    pub database_max_connections: u32,
    pub listen_addr: SocketAddr,
    pub log_level: String,
    pub otel_endpoint: Option<String>,
    pub shutdown_timeout: Duration,
    pub planner: PlannerConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        let operation_timeout_ms: u64 = parsed_var("PLANNER_OPERATION_TIMEOUT_MS", 5000)?;

        Ok(Self {
            database_url: optional_var("DATABASE_URL").map(SecretString::from),
            database_max_connections: parsed_var(
                "DATABASE_MAX_CONNECTIONS",
                crate::db::DEFAULT_MAX_CONNECTIONS,
            )?,
            listen_addr: parsed_var("HTTP_LISTEN_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?,
            log_level: optional_var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            otel_endpoint: optional_var("OTEL_ENDPOINT"),
            shutdown_timeout: Duration::from_secs(parsed_var("SHUTDOWN_TIMEOUT_SECS", 5)?),
            planner: PlannerConfig {
                verify_worker: bool_var("PLANNER_VERIFY_WORKER", true)?,
                operation_timeout: (operation_timeout_ms > 0)
                    .then(|| Duration::from_millis(operation_timeout_ms)),
            },
        })
    }
}

/// Unset and empty are treated alike.
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{name}={raw:?} is invalid: {e}"))),
        None => Ok(default),
    }
}

fn bool_var(name: &str, default: bool) -> Result<bool> {
    match optional_var(name).map(|v| v.trim().to_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(v) => Err(Error::Config(format!("{name}={v:?} is not a boolean"))),
    }
}
