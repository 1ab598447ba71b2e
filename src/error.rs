use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A clinic id, date, metric name or range that cannot be served.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The rollup store could not answer a fetch.
    #[error("Rollup source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::SourceUnavailable(e.to_string())
    }
}

impl From<rusqlite_migration::Error> for Error {
    fn from(e: rusqlite_migration::Error) -> Self {
        Error::Migration(e.to_string())
    }
}

impl<E: fmt::Display> From<tokio_rusqlite::Error<E>> for Error {
    fn from(e: tokio_rusqlite::Error<E>) -> Self {
        Error::SourceUnavailable(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
