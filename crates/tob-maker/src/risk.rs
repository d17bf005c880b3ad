//! Daily-loss kill-switch latch.
//!
//! Once triggered, the latch stays set until an explicit operator
//! reset. No event handler may clear it.

use rust_decimal::Decimal;

/// Tracks the day's running PnL against a loss limit.
///
/// Single-owner state: the strategy is driven by one event source, so
/// no synchronization is needed here.
#[derive(Debug, Clone)]
pub struct DailyLossGuard {
    max_daily_loss: Decimal,
    daily_pnl: Decimal,
    triggered: bool,
}

impl DailyLossGuard {
    pub fn new(max_daily_loss: Decimal) -> Self {
        Self {
            max_daily_loss,
            daily_pnl: Decimal::ZERO,
            triggered: false,
        }
    }

    /// Accrue realized PnL from a fill.
    ///
    /// Returns true when the loss limit is breached and the latch is
    /// not yet set — the caller's cue to trigger the kill-switch.
    pub fn record(&mut self, realized: Decimal) -> bool {
        self.daily_pnl += realized;
        !self.triggered && self.daily_pnl <= -self.max_daily_loss
    }

    /// Set the latch. Idempotent.
    pub fn trigger(&mut self) {
        self.triggered = true;
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    /// The day's running PnL.
    pub fn daily_pnl(&self) -> Decimal {
        self.daily_pnl
    }

    /// Clear the latch and zero the day's PnL counter.
    ///
    /// Manual operator action only; never invoked from event handlers.
    pub fn reset(&mut self) {
        self.daily_pnl = Decimal::ZERO;
        self.triggered = false;
    }
}
