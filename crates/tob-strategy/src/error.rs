//! Error types for tob-strategy.

use crate::state::StrategyState;
use thiserror::Error;

/// Strategy error types.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition {
        from: StrategyState,
        to: StrategyState,
    },
}

/// Result type alias for strategy operations.
pub type Result<T> = std::result::Result<T, StrategyError>;
