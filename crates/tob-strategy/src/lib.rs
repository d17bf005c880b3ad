//! Strategy lifecycle and shared strategy state.
//!
//! Provides the `Strategy` trait, the `StrategyCore` state owned by
//! every concrete strategy through composition, `Position` with
//! weighted-average-cost accounting, and performance metrics.

pub mod core;
pub mod error;
pub mod metrics;
pub mod position;
pub mod state;

pub use crate::core::{Strategy, StrategyCore, StrategyStatus};
pub use error::{Result, StrategyError};
pub use metrics::StrategyMetrics;
pub use position::Position;
pub use state::StrategyState;
