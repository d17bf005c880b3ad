//! Error types for tob-maker.

use thiserror::Error;

/// Maker error types.
#[derive(Debug, Error)]
pub enum MakerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for maker operations.
pub type Result<T> = std::result::Result<T, MakerError>;
