//! Error types for the ipwatch system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for ipwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the ipwatch system
#[derive(Error, Debug)]
pub enum Error {
    /// Every IP-echo endpoint failed or returned a non-IPv4 answer
    #[error("IP resolution failed: {0}")]
    Resolution(String),

    /// History store errors
    #[error("history store error: {0}")]
    Store(String),

    /// Underlying SQLite errors
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Report assembly/write errors
    #[error("report error: {0}")]
    Report(String),

    /// Filesystem errors (report output, database directory)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a resolution error
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Create a history store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a report error
    pub fn report(msg: impl Into<String>) -> Self {
        Self::Report(msg.into())
    }

    /// True for errors the tick recovers from locally (logged, recorded,
    /// process still exits cleanly)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Resolution(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
