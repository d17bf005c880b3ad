//! Strategy performance metrics.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Running performance metrics for a strategy.
///
/// Every fill counts as a trade; fills that realize PnL also classify
/// as winning or losing. Drawdown is tracked peak-to-trough over
/// cumulative realized PnL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyMetrics {
    pub total_trades: u64,
    pub winning_trades: u64,
    pub losing_trades: u64,
    pub total_pnl: Decimal,
    pub max_drawdown: Decimal,
    pub start_time: DateTime<Utc>,
    peak_pnl: Decimal,
}

impl StrategyMetrics {
    pub fn new() -> Self {
        Self {
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            total_pnl: Decimal::ZERO,
            max_drawdown: Decimal::ZERO,
            start_time: Utc::now(),
            peak_pnl: Decimal::ZERO,
        }
    }

    /// Win rate as a percentage. Zero when no trades yet.
    pub fn win_rate(&self) -> Decimal {
        if self.total_trades == 0 {
            Decimal::ZERO
        } else {
            Decimal::from(self.winning_trades) / Decimal::from(self.total_trades)
                * Decimal::from(100)
        }
    }

    /// Record a fill and the realized PnL it produced.
    pub fn record_fill(&mut self, realized: Decimal) {
        self.total_trades += 1;
        if realized > Decimal::ZERO {
            self.winning_trades += 1;
        } else if realized < Decimal::ZERO {
            self.losing_trades += 1;
        }

        self.total_pnl += realized;
        if self.total_pnl > self.peak_pnl {
            self.peak_pnl = self.total_pnl;
        }
        let drawdown = self.peak_pnl - self.total_pnl;
        if drawdown > self.max_drawdown {
            self.max_drawdown = drawdown;
        }
    }
}

impl Default for StrategyMetrics {
    fn default() -> Self {
        Self::new()
    }
}
