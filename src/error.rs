//! Error types for work-planner.
//!
//! Two conditions are part of the domain contract and survive any amount of
//! context wrapping: [`ErrorKind::DayAlreadyBooked`] and [`ErrorKind::NoRecord`].
//! Everything else is infrastructure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("day already booked")]
    DayAlreadyBooked,

    #[error("no record: {0}")]
    NoRecord(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },

    #[error("{0}")]
    Other(String),
}

/// The classification outward layers match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The worker already has a shift on that day.
    DayAlreadyBooked,
    /// A referenced record does not exist.
    NoRecord,
    /// Anything else: storage, timeouts, configuration.
    Infrastructure,
}

impl Error {
    /// Classify this error, looking through context layers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::DayAlreadyBooked => ErrorKind::DayAlreadyBooked,
            Error::NoRecord(_) => ErrorKind::NoRecord,
            Error::Context { source, .. } => source.kind(),
            _ => ErrorKind::Infrastructure,
        }
    }

    /// Wrap this error with operation context.
    pub fn context(self, context: impl Into<String>) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all context layers removed.
    pub fn root(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Attach operation context to a fallible result.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().context(context))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
