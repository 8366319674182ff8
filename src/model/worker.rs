//! Worker types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Someone who can be assigned shifts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Worker {
    /// Assigned by the planner on creation. Any incoming value is replaced.
    #[serde(default)]
    pub id: WorkerId,

    #[validate(length(min = 1))]
    pub name: String,
}

impl Worker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: WorkerId::default(),
            name: name.into(),
        }
    }
}

/// Newtype for worker IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerId(pub Uuid);

impl WorkerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for WorkerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for WorkerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Filters for listing workers. `None` means unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkersFilter {
    /// Case-insensitive substring of the worker's name.
    pub name: Option<String>,
}

impl WorkersFilter {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    pub fn matches(&self, worker: &Worker) -> bool {
        match &self.name {
            Some(name) => worker.name.to_lowercase().contains(&name.to_lowercase()),
            None => true,
        }
    }
}
