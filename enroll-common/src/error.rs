//! Common error types for the enrollment kiosk

use thiserror::Error;

/// Common result type for enrollment operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the kiosk crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Roster dataset could not be parsed as a whole
    #[error("Roster error: {0}")]
    Roster(String),
}
