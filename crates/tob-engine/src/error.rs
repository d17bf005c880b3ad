//! Error types for tob-engine.

use thiserror::Error;

/// Engine error types.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine channel closed")]
    ChannelClosed,
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
