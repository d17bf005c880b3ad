//! Market-making strategy.
//!
//! Quotes both sides around an inventory-adjusted fair value:
//! 1. Gate on state, kill-switch, market spread, and position limit.
//! 2. Compute fair value and bid/ask prices around it.
//! 3. Skew quote sizes to lean against inventory.
//! 4. Refresh quotes on a rate-limited schedule with a price trigger
//!    and a staleness ceiling.

use std::time::Instant;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, error, info, warn};

use tob_book::BookSnapshot;
use tob_core::{Order, OrderId, OrderSide, Price};
use tob_strategy::{Strategy, StrategyCore, StrategyState, StrategyStatus};

use crate::config::MakerConfig;
use crate::error::MakerError;
use crate::pricing;
use crate::risk::DailyLossGuard;

/// Absolute floor for the quoted spread: one cent.
const MIN_QUOTE_SPREAD: Decimal = dec!(0.01);

/// Liquidity-providing strategy quoting bid/ask around fair value.
pub struct MarketMaker {
    core: StrategyCore,
    config: MakerConfig,
    guard: DailyLossGuard,
    last_snapshot: Option<BookSnapshot>,
    last_quote_at: Option<Instant>,
    /// Mid at the time of the last quote, for the price-move trigger.
    last_quoted_mid: Option<Price>,
    current_bid: Option<OrderId>,
    current_ask: Option<OrderId>,
}

impl MarketMaker {
    /// Create a market maker for a symbol.
    ///
    /// The configuration is validated here and immutable afterwards.
    pub fn new(symbol: tob_core::Symbol, config: MakerConfig) -> Result<Self, MakerError> {
        config.validate()?;
        let guard = DailyLossGuard::new(config.max_daily_loss);
        Ok(Self {
            core: StrategyCore::new(symbol),
            config,
            guard,
            last_snapshot: None,
            last_quote_at: None,
            last_quoted_mid: None,
            current_bid: None,
            current_ask: None,
        })
    }

    pub fn config(&self) -> &MakerConfig {
        &self.config
    }

    /// Whether the strategy should be quoting into this market.
    ///
    /// Pure predicate over current state and the snapshot: running, no
    /// kill-switch, market spread inside the tolerated band, position
    /// below the limit.
    pub fn should_quote(&self, snapshot: &BookSnapshot) -> bool {
        if !self.core.state().is_running() {
            return false;
        }

        if self.guard.is_triggered() {
            warn!(symbol = %self.core.symbol, "Kill switch active, not quoting");
            return false;
        }

        if snapshot.spread_bps < self.config.min_book_spread_bps {
            debug!(
                symbol = %self.core.symbol,
                spread_bps = %snapshot.spread_bps,
                "Market spread too tight"
            );
            return false;
        }

        if snapshot.spread_bps > self.config.max_book_spread_bps {
            debug!(
                symbol = %self.core.symbol,
                spread_bps = %snapshot.spread_bps,
                "Market spread too wide"
            );
            return false;
        }

        if self.core.position.quantity.abs() >= self.config.max_position {
            warn!(
                symbol = %self.core.symbol,
                position = self.core.position.quantity,
                "Position limit reached"
            );
            return false;
        }

        true
    }

    /// Bid/ask sizes skewed by inventory.
    ///
    /// The side that would grow the position quotes smaller: size
    /// scales by `1 - 0.5 * |position / max_position|` (truncated to
    /// whole shares, never below 1). The reducing side keeps full size.
    pub fn quote_sizes(&self) -> (i64, i64) {
        let base = self.config.quote_size;
        let qty = self.core.position.quantity;
        if qty == 0 {
            return (base, base);
        }

        let position_pct = Decimal::from(qty) / Decimal::from(self.config.max_position);
        let skew_factor = Decimal::ONE - position_pct.abs() * dec!(0.5);
        let skewed = (Decimal::from(base) * skew_factor)
            .floor()
            .to_i64()
            .unwrap_or(1)
            .max(1);

        if qty > 0 {
            (skewed, base) // long: buy less, sell full size
        } else {
            (base, skewed) // short: mirror
        }
    }

    /// Whether quotes are due for a refresh at `now`.
    ///
    /// Three conditions, in order: never inside the rate-limit floor;
    /// immediately once the mid has moved more than 1 bps since the
    /// last quote; unconditionally once quotes are 10 refresh
    /// intervals old.
    pub fn needs_quote_refresh_at(&self, snapshot: &BookSnapshot, now: Instant) -> bool {
        let Some(quoted_at) = self.last_quote_at else {
            return true;
        };
        let elapsed_ms = now.saturating_duration_since(quoted_at).as_millis() as u64;

        if elapsed_ms < self.config.quote_refresh_ms {
            return false;
        }

        if let Some(quoted_mid) = self.last_quoted_mid {
            if quoted_mid.is_positive() {
                let moved = (snapshot.mid.inner() - quoted_mid.inner()).abs();
                if moved > snapshot.mid.inner() * dec!(0.0001) {
                    return true;
                }
            }
        }

        elapsed_ms >= self.config.quote_refresh_ms.saturating_mul(10)
    }

    /// Process a book update at an explicit time. Seam for tests; the
    /// trait method delegates here with `Instant::now()`.
    pub fn handle_book_update(&mut self, snapshot: &BookSnapshot, now: Instant) {
        if !self.should_quote(snapshot) {
            self.last_snapshot = Some(snapshot.clone());
            return;
        }

        self.core.position.update_unrealized(snapshot.mid);

        if self.needs_quote_refresh_at(snapshot, now) {
            self.update_quotes(snapshot, now);
        }

        self.last_snapshot = Some(snapshot.clone());
    }

    fn update_quotes(&mut self, snapshot: &BookSnapshot, now: Instant) {
        let fair = pricing::fair_value(
            snapshot,
            self.core.position.quantity,
            self.config.inventory_skew,
        );
        if !fair.is_positive() {
            return;
        }

        let (bid_price, ask_price) =
            pricing::quote_prices(fair, self.config.spread_bps, MIN_QUOTE_SPREAD);
        let (bid_size, ask_size) = self.quote_sizes();

        // Superseding a quote is an implicit cancel: the previous
        // working orders leave the active set without a cancel event
        // and without touching metrics.
        if let Some(id) = self.current_bid.take() {
            self.core.active_orders.remove(&id);
        }
        if let Some(id) = self.current_ask.take() {
            self.core.active_orders.remove(&id);
        }

        let symbol = self.core.symbol.clone();

        let bid_id = self.core.next_order_id();
        match Order::limit(
            bid_id.clone(),
            symbol.clone(),
            OrderSide::Buy,
            bid_size,
            bid_price,
        ) {
            Ok(order) => {
                self.core.active_orders.insert(bid_id.clone(), order);
                self.current_bid = Some(bid_id);
            }
            Err(e) => warn!(symbol = %symbol, error = %e, "Skipping bid quote"),
        }

        let ask_id = self.core.next_order_id();
        match Order::limit(
            ask_id.clone(),
            symbol.clone(),
            OrderSide::Sell,
            ask_size,
            ask_price,
        ) {
            Ok(order) => {
                self.core.active_orders.insert(ask_id.clone(), order);
                self.current_ask = Some(ask_id);
            }
            Err(e) => warn!(symbol = %symbol, error = %e, "Skipping ask quote"),
        }

        self.last_quote_at = Some(now);
        self.last_quoted_mid = Some(snapshot.mid);

        debug!(
            symbol = %symbol,
            bid = %bid_price,
            bid_size,
            ask = %ask_price,
            ask_size,
            fair_value = %fair,
            position = self.core.position.quantity,
            "Quotes updated"
        );
    }

    /// Emergency stop: clear all orders, stop quoting, latch the
    /// kill-switch. Irreversible until `reset_daily`.
    pub fn trigger_kill_switch(&mut self) {
        error!(
            symbol = %self.core.symbol,
            daily_pnl = %self.guard.daily_pnl(),
            max_daily_loss = %self.config.max_daily_loss,
            position = self.core.position.quantity,
            "KILL SWITCH TRIGGERED"
        );

        self.guard.trigger();
        self.core.active_orders.clear();
        self.current_bid = None;
        self.current_ask = None;

        if self.core.state().can_transition_to(StrategyState::Stopped) {
            let _ = self.core.stop();
        }
    }

    /// The day's running PnL tracked by the kill-switch.
    pub fn daily_pnl(&self) -> Decimal {
        self.guard.daily_pnl()
    }

    pub fn kill_switch_triggered(&self) -> bool {
        self.guard.is_triggered()
    }

    fn working_price(&self, id: &Option<OrderId>) -> Option<Price> {
        id.as_ref()
            .and_then(|id| self.core.active_orders.get(id))
            .map(|order| order.price)
    }
}

impl Strategy for MarketMaker {
    fn core(&self) -> &StrategyCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StrategyCore {
        &mut self.core
    }

    fn on_book_update(&mut self, snapshot: &BookSnapshot) {
        self.handle_book_update(snapshot, Instant::now());
    }

    fn on_fill(&mut self, order_id: &OrderId, fill_price: Price, fill_qty: i64) {
        if fill_qty <= 0 {
            warn!(
                symbol = %self.core.symbol,
                order_id = %order_id,
                fill_qty,
                "Ignoring non-positive fill quantity"
            );
            return;
        }

        let (side, fully_filled) = match self.core.active_orders.get_mut(order_id) {
            Some(order) => {
                order.record_fill(fill_price, fill_qty);
                (order.side, order.is_filled())
            }
            None => {
                warn!(
                    symbol = %self.core.symbol,
                    order_id = %order_id,
                    "Fill for unknown order, ignoring"
                );
                return;
            }
        };

        if fully_filled {
            self.core.active_orders.remove(order_id);
            if self.current_bid.as_ref() == Some(order_id) {
                self.current_bid = None;
            }
            if self.current_ask.as_ref() == Some(order_id) {
                self.current_ask = None;
            }
        }

        let realized = self.core.position.apply_fill(side, fill_qty, fill_price);
        self.core.metrics.record_fill(realized);

        info!(
            symbol = %self.core.symbol,
            order_id = %order_id,
            side = %side,
            price = %fill_price,
            qty = fill_qty,
            realized = %realized,
            position = self.core.position.quantity,
            "Order filled"
        );

        if self.guard.record(realized) {
            self.trigger_kill_switch();
        }
    }

    fn status(&self) -> StrategyStatus {
        self.core.status_with(
            self.guard.daily_pnl(),
            self.guard.is_triggered(),
            self.working_price(&self.current_bid),
            self.working_price(&self.current_ask),
        )
    }

    fn reset_daily(&mut self) {
        self.guard.reset();
        info!(symbol = %self.core.symbol, "Daily reset complete");
    }
}
