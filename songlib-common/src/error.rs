//! Common error types for the song library

use thiserror::Error;

/// Common result type for song library operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by stores, the lifecycle service and the HTTP layer
#[derive(Error, Debug)]
pub enum Error {
    /// Requested entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A song with the same (group, title, release date, text, link) already exists
    #[error("Duplicate song: {0}")]
    DuplicateSong(String),

    /// Malformed or missing required fields
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The metadata resolver failed (network, status or decoding)
    #[error("Metadata unavailable: {0}")]
    MetadataUnavailable(String),

    /// Underlying persistence failure (wraps sqlx::Error)
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal invariant broken (e.g. unparseable id read back from storage)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the wrapped storage error is a UNIQUE constraint violation
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Storage(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}
