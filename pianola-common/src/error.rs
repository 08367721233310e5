//! Common error types for Pianola

use thiserror::Error;

/// Common result type for Pianola operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the Pianola crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Score text could not be parsed
    #[error("Score parse error: {0}")]
    ScoreParse(#[from] serde_json::Error),

    /// A score event is outside its allowed range
    #[error("Invalid score event #{index}: {reason}")]
    InvalidEvent { index: usize, reason: String },
}
