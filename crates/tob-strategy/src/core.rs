//! Shared strategy state and the strategy contract.
//!
//! Concrete strategies own a `StrategyCore` by composition (there is
//! no base-class inheritance): the core holds the lifecycle state,
//! position, metrics, and active orders, and the `Strategy` trait
//! exposes the event contract on top.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use tob_book::BookSnapshot;
use tob_core::{Order, OrderId, Price, Symbol};

use crate::error::StrategyError;
use crate::metrics::StrategyMetrics;
use crate::position::Position;
use crate::state::StrategyState;

/// Read-only strategy status summary.
///
/// The only externally serialized artifact of the core; everything the
/// surrounding system needs to observe a strategy is here.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyStatus {
    pub symbol: Symbol,
    pub state: StrategyState,
    pub position: i64,
    pub avg_cost: Price,
    pub unrealized_pnl: Decimal,
    pub realized_pnl: Decimal,
    pub active_orders: usize,
    pub total_trades: u64,
    pub daily_pnl: Decimal,
    pub kill_switch: bool,
    pub current_bid: Option<Price>,
    pub current_ask: Option<Price>,
}

/// State shared by every strategy, owned by composition.
#[derive(Debug)]
pub struct StrategyCore {
    pub symbol: Symbol,
    state: StrategyState,
    pub position: Position,
    pub metrics: StrategyMetrics,
    pub active_orders: HashMap<OrderId, Order>,
    order_seq: u64,
}

impl StrategyCore {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            position: Position::flat(symbol.clone()),
            symbol,
            state: StrategyState::Initializing,
            metrics: StrategyMetrics::new(),
            active_orders: HashMap::new(),
            order_seq: 0,
        }
    }

    pub fn state(&self) -> StrategyState {
        self.state
    }

    fn transition(&mut self, next: StrategyState) -> Result<(), StrategyError> {
        if !self.state.can_transition_to(next) {
            return Err(StrategyError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        info!(symbol = %self.symbol, from = %self.state, to = %next, "Strategy state change");
        self.state = next;
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), StrategyError> {
        self.transition(StrategyState::Running)
    }

    pub fn stop(&mut self) -> Result<(), StrategyError> {
        self.transition(StrategyState::Stopped)
    }

    pub fn pause(&mut self) -> Result<(), StrategyError> {
        self.transition(StrategyState::Paused)
    }

    pub fn resume(&mut self) -> Result<(), StrategyError> {
        self.transition(StrategyState::Running)
    }

    /// Force the terminal error state. Host-initiated only.
    pub fn set_error(&mut self) -> Result<(), StrategyError> {
        self.transition(StrategyState::Error)
    }

    /// Next unique order id for this strategy instance.
    pub fn next_order_id(&mut self) -> OrderId {
        self.order_seq += 1;
        OrderId::generate(&self.symbol, self.order_seq)
    }

    /// Remove an order from the active set.
    ///
    /// Unknown ids are a logged no-op: cancel notifications can race
    /// quote replacement and must never be fatal.
    pub fn cancel_order(&mut self, order_id: &OrderId) -> Option<Order> {
        match self.active_orders.remove(order_id) {
            Some(order) => {
                debug!(symbol = %self.symbol, order_id = %order_id, "Order cancelled");
                Some(order)
            }
            None => {
                debug!(
                    symbol = %self.symbol,
                    order_id = %order_id,
                    "Cancel for unknown order, ignoring"
                );
                None
            }
        }
    }

    /// Status summary with strategy-specific fields supplied by the
    /// concrete implementation.
    pub fn status_with(
        &self,
        daily_pnl: Decimal,
        kill_switch: bool,
        current_bid: Option<Price>,
        current_ask: Option<Price>,
    ) -> StrategyStatus {
        StrategyStatus {
            symbol: self.symbol.clone(),
            state: self.state,
            position: self.position.quantity,
            avg_cost: self.position.avg_cost,
            unrealized_pnl: self.position.unrealized_pnl,
            realized_pnl: self.position.realized_pnl,
            active_orders: self.active_orders.len(),
            total_trades: self.metrics.total_trades,
            daily_pnl,
            kill_switch,
            current_bid,
            current_ask,
        }
    }

    /// Status summary for strategies without extra risk state.
    pub fn base_status(&self) -> StrategyStatus {
        self.status_with(Decimal::ZERO, false, None, None)
    }
}

/// The strategy contract.
///
/// Concrete strategies implement the two data-event hooks and expose
/// their `StrategyCore`; lifecycle controls and the order/cancel
/// bookkeeping come as provided methods over the core.
pub trait Strategy: Send {
    fn core(&self) -> &StrategyCore;

    fn core_mut(&mut self) -> &mut StrategyCore;

    /// React to an order book change.
    fn on_book_update(&mut self, snapshot: &BookSnapshot);

    /// Handle a fill notification from the execution layer.
    fn on_fill(&mut self, order_id: &OrderId, fill_price: Price, fill_qty: i64);

    /// Handle a cancel notification from the execution layer.
    fn on_cancel(&mut self, order_id: &OrderId) {
        self.core_mut().cancel_order(order_id);
    }

    /// Current working orders.
    fn orders(&self) -> Vec<Order> {
        self.core().active_orders.values().cloned().collect()
    }

    /// Read-only status summary.
    fn status(&self) -> StrategyStatus {
        self.core().base_status()
    }

    fn start(&mut self) -> Result<(), StrategyError> {
        self.core_mut().start()
    }

    fn stop(&mut self) -> Result<(), StrategyError> {
        self.core_mut().stop()
    }

    fn pause(&mut self) -> Result<(), StrategyError> {
        self.core_mut().pause()
    }

    fn resume(&mut self) -> Result<(), StrategyError> {
        self.core_mut().resume()
    }

    /// Reset daily risk tracking. Operator action; default no-op for
    /// strategies without daily state.
    fn reset_daily(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tob_core::OrderSide;

    fn core() -> StrategyCore {
        StrategyCore::new(Symbol::from("AAPL"))
    }

    #[test]
    fn test_initial_state() {
        let core = core();
        assert_eq!(core.state(), StrategyState::Initializing);
        assert_eq!(core.position.quantity, 0);
        assert!(core.active_orders.is_empty());
    }

    #[test]
    fn test_lifecycle_controls() {
        let mut core = core();
        core.start().unwrap();
        assert_eq!(core.state(), StrategyState::Running);

        core.pause().unwrap();
        assert_eq!(core.state(), StrategyState::Paused);

        core.resume().unwrap();
        core.stop().unwrap();
        assert_eq!(core.state(), StrategyState::Stopped);
    }

    #[test]
    fn test_invalid_control_is_error() {
        let mut core = core();
        // Cannot pause before starting.
        assert!(matches!(
            core.pause(),
            Err(StrategyError::InvalidTransition { .. })
        ));
        assert_eq!(core.state(), StrategyState::Initializing);
    }

    #[test]
    fn test_order_ids_are_sequential_and_unique() {
        let mut core = core();
        let id1 = core.next_order_id();
        let id2 = core.next_order_id();

        assert_ne!(id1, id2);
        assert!(id1.as_str().starts_with("AAPL-1-"));
        assert!(id2.as_str().starts_with("AAPL-2-"));
    }

    #[test]
    fn test_cancel_unknown_order_is_noop() {
        let mut core = core();
        let unknown = OrderId::from_string("AAPL-99-deadbeef".to_string());
        assert!(core.cancel_order(&unknown).is_none());
    }

    #[test]
    fn test_cancel_removes_active_order() {
        let mut core = core();
        let id = core.next_order_id();
        let order = Order::limit(
            id.clone(),
            core.symbol.clone(),
            OrderSide::Buy,
            10,
            Price::new(dec!(150)),
        )
        .unwrap();
        core.active_orders.insert(id.clone(), order);

        assert!(core.cancel_order(&id).is_some());
        assert!(core.active_orders.is_empty());
    }

    #[test]
    fn test_status_reflects_position() {
        let mut core = core();
        core.start().unwrap();
        core.position
            .apply_fill(OrderSide::Buy, 10, Price::new(dec!(100)));

        let status = core.base_status();
        assert_eq!(status.position, 10);
        assert_eq!(status.avg_cost.inner(), dec!(100));
        assert_eq!(status.state, StrategyState::Running);
        assert!(!status.kill_switch);
    }

    #[test]
    fn test_status_serializes() {
        let status = core().base_status();
        let json = serde_json::to_value(&status).unwrap();

        assert_eq!(json["symbol"], "AAPL");
        assert_eq!(json["state"], "initializing");
        assert_eq!(json["active_orders"], 0);
        assert_eq!(json["kill_switch"], false);
    }
}
