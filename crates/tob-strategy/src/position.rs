//! Signed position with weighted-average-cost accounting.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tob_core::{OrderSide, Price, Symbol};

/// A trading position in one symbol.
///
/// Quantity is signed: positive = long, negative = short. Mutated only
/// through `apply_fill`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: Symbol,
    /// Net shares, positive = long, negative = short.
    pub quantity: i64,
    /// Average entry price of the open position. Zero when flat.
    pub avg_cost: Price,
    /// Cumulative realized PnL.
    pub realized_pnl: Decimal,
    /// Mark-to-market PnL of the open position.
    pub unrealized_pnl: Decimal,
}

impl Position {
    /// A flat position in a symbol.
    pub fn flat(symbol: Symbol) -> Self {
        Self {
            symbol,
            quantity: 0,
            avg_cost: Price::ZERO,
            realized_pnl: Decimal::ZERO,
            unrealized_pnl: Decimal::ZERO,
        }
    }

    /// Market value at average cost.
    pub fn market_value(&self) -> Decimal {
        Decimal::from(self.quantity.abs()) * self.avg_cost.inner()
    }

    /// Re-mark unrealized PnL against the current price.
    ///
    /// Signed quantity makes the formula side-agnostic: a short
    /// position gains when the mark drops below average cost.
    pub fn update_unrealized(&mut self, mark: Price) {
        self.unrealized_pnl = if self.quantity != 0 {
            (mark.inner() - self.avg_cost.inner()) * Decimal::from(self.quantity)
        } else {
            Decimal::ZERO
        };
    }

    /// Apply a fill and return the realized PnL it produced.
    ///
    /// Weighted-average-cost with flip handling:
    /// - Same direction (or flat): extend, recompute the weighted
    ///   average cost over the combined quantity.
    /// - Opposite direction, no sign flip: partial close; average cost
    ///   is unchanged, PnL realizes on the closed shares.
    /// - Sign flip: the closing leg realizes PnL, the remainder opens a
    ///   fresh position at the fill price.
    pub fn apply_fill(&mut self, side: OrderSide, fill_qty: i64, fill_price: Price) -> Decimal {
        let signed = side.sign() * fill_qty;
        let old_qty = self.quantity;
        let new_qty = old_qty + signed;
        let mut realized = Decimal::ZERO;

        if old_qty == 0 || old_qty.signum() == signed.signum() {
            let old_notional = Decimal::from(old_qty.abs()) * self.avg_cost.inner();
            let fill_notional = Decimal::from(fill_qty) * fill_price.inner();
            self.avg_cost = if new_qty == 0 {
                Price::ZERO
            } else {
                Price::new((old_notional + fill_notional) / Decimal::from(new_qty.abs()))
            };
        } else {
            let closed = fill_qty.min(old_qty.abs());
            let direction = Decimal::from(old_qty.signum());
            realized =
                Decimal::from(closed) * (fill_price.inner() - self.avg_cost.inner()) * direction;

            if new_qty == 0 {
                self.avg_cost = Price::ZERO;
            } else if new_qty.signum() != old_qty.signum() {
                self.avg_cost = fill_price;
            }
            // Partial close: avg_cost stays.
        }

        self.quantity = new_qty;
        self.realized_pnl += realized;
        realized
    }
}
