//! Engine context and event loop.

use rust_decimal::prelude::ToPrimitive;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tob_book::OrderBookManager;
use tob_core::{OrderId, Price, Symbol, TickData};
use tob_strategy::{Strategy, StrategyStatus};
use tob_telemetry::metrics::{
    BOOK_SPREAD_BPS, BOOK_UPDATES_TOTAL, FILLS_TOTAL, KILL_SWITCH_TOTAL, TICKS_TOTAL,
};

use crate::error::EngineError;
use crate::event::{EngineCommand, EngineEvent};

/// Owns the order books and one strategy; processes events one at a
/// time.
///
/// All mutable state lives here, passed explicitly to the processing
/// loop. There are no process-wide registries.
pub struct Engine {
    books: OrderBookManager,
    strategy: Box<dyn Strategy>,
    symbol: Symbol,
}

impl Engine {
    pub fn new(strategy: Box<dyn Strategy>) -> Self {
        let symbol = strategy.core().symbol.clone();
        Self {
            books: OrderBookManager::new(),
            strategy,
            symbol,
        }
    }

    pub fn books(&self) -> &OrderBookManager {
        &self.books
    }

    pub fn strategy(&self) -> &dyn Strategy {
        self.strategy.as_ref()
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Process one event. Returns false when the loop should stop.
    ///
    /// Synchronous by design: the core is pure in-memory computation,
    /// and processing one event at a time is what guarantees arrival
    /// order for the strategy.
    pub fn handle_event(&mut self, event: EngineEvent) -> bool {
        match event {
            EngineEvent::Tick(tick) => {
                TICKS_TOTAL.with_label_values(&[tick.symbol.as_str()]).inc();

                if let Some(snapshot) = self.books.update(&tick) {
                    BOOK_UPDATES_TOTAL
                        .with_label_values(&[tick.symbol.as_str()])
                        .inc();
                    BOOK_SPREAD_BPS
                        .with_label_values(&[tick.symbol.as_str()])
                        .set(snapshot.spread_bps.to_f64().unwrap_or(0.0));

                    if tick.symbol == self.symbol {
                        self.strategy.on_book_update(&snapshot);
                    }
                }
                true
            }
            EngineEvent::Fill {
                order_id,
                price,
                qty,
            } => {
                self.handle_fill(&order_id, price, qty);
                true
            }
            EngineEvent::Cancel(order_id) => {
                self.strategy.on_cancel(&order_id);
                true
            }
            EngineEvent::Command(cmd) => {
                self.handle_command(cmd);
                true
            }
            EngineEvent::Status(tx) => {
                // Receiver may have gone away; that is not our problem.
                let _ = tx.send(self.strategy.status());
                true
            }
            EngineEvent::Shutdown => {
                info!(symbol = %self.symbol, "Engine shutting down");
                false
            }
        }
    }

    fn handle_fill(&mut self, order_id: &OrderId, price: Price, qty: i64) {
        let side = self
            .strategy
            .core()
            .active_orders
            .get(order_id)
            .map(|order| order.side);
        let was_triggered = self.strategy.status().kill_switch;

        self.strategy.on_fill(order_id, price, qty);

        if let Some(side) = side {
            FILLS_TOTAL
                .with_label_values(&[self.symbol.as_str(), &side.to_string()])
                .inc();
        }
        if !was_triggered && self.strategy.status().kill_switch {
            KILL_SWITCH_TOTAL
                .with_label_values(&[self.symbol.as_str()])
                .inc();
        }
    }

    fn handle_command(&mut self, cmd: EngineCommand) {
        debug!(symbol = %self.symbol, command = ?cmd, "Control command");
        let result = match cmd {
            EngineCommand::Start => self.strategy.start(),
            EngineCommand::Stop => self.strategy.stop(),
            EngineCommand::Pause => self.strategy.pause(),
            EngineCommand::Resume => self.strategy.resume(),
            EngineCommand::ResetDaily => {
                self.strategy.reset_daily();
                Ok(())
            }
        };
        if let Err(e) = result {
            warn!(symbol = %self.symbol, error = %e, "Control command rejected");
        }
    }
}

/// Handle for feeding events into a spawned engine.
///
/// Cloneable; every producer sends into the same queue, and the
/// engine task drains it in arrival order.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl EngineHandle {
    pub fn send_tick(&self, tick: TickData) -> Result<(), EngineError> {
        self.send(EngineEvent::Tick(tick))
    }

    pub fn send_fill(&self, order_id: OrderId, price: Price, qty: i64) -> Result<(), EngineError> {
        self.send(EngineEvent::Fill {
            order_id,
            price,
            qty,
        })
    }

    pub fn send_cancel(&self, order_id: OrderId) -> Result<(), EngineError> {
        self.send(EngineEvent::Cancel(order_id))
    }

    pub fn command(&self, cmd: EngineCommand) -> Result<(), EngineError> {
        self.send(EngineEvent::Command(cmd))
    }

    /// Query the strategy status through the event queue.
    ///
    /// The response reflects every event sent before this call from
    /// this producer, since the queue is drained in order.
    pub async fn status(&self) -> Result<StrategyStatus, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.send(EngineEvent::Status(tx))?;
        rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    pub fn shutdown(&self) -> Result<(), EngineError> {
        self.send(EngineEvent::Shutdown)
    }

    fn send(&self, event: EngineEvent) -> Result<(), EngineError> {
        self.tx.send(event).map_err(|_| EngineError::ChannelClosed)
    }
}

/// Spawn the engine event loop on a dedicated task.
///
/// Returns the handle for producers and the join handle, which yields
/// the engine back after shutdown for final inspection.
pub fn spawn(mut engine: Engine) -> (EngineHandle, JoinHandle<Engine>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let join = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if !engine.handle_event(event) {
                break;
            }
        }
        engine
    });
    (EngineHandle { tx }, join)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tob_maker::{MakerConfig, MarketMaker};

    fn tick(symbol: &str, bid: Decimal, ask: Decimal) -> TickData {
        TickData {
            timestamp: Utc::now(),
            symbol: Symbol::from(symbol),
            bid: Price::new(bid),
            ask: Price::new(ask),
            bid_size: 100,
            ask_size: 200,
            last: Price::ZERO,
            volume: 0,
        }
    }

    fn engine() -> Engine {
        let maker = MarketMaker::new(Symbol::from("AAPL"), MakerConfig::default()).unwrap();
        Engine::new(Box::new(maker))
    }

    #[test]
    fn test_tick_before_start_builds_book_only() {
        let mut eng = engine();
        eng.handle_event(EngineEvent::Tick(tick("AAPL", dec!(150.00), dec!(150.10))));

        assert_eq!(eng.books().len(), 1);
        assert!(eng.strategy().orders().is_empty());
    }

    #[test]
    fn test_start_then_tick_quotes() {
        let mut eng = engine();
        eng.handle_event(EngineEvent::Command(EngineCommand::Start));
        eng.handle_event(EngineEvent::Tick(tick("AAPL", dec!(150.00), dec!(150.10))));

        assert_eq!(eng.strategy().orders().len(), 2);
    }

    #[test]
    fn test_duplicate_tick_single_book_update() {
        let mut eng = engine();
        let t = tick("AAPL", dec!(150.00), dec!(150.10));
        eng.handle_event(EngineEvent::Tick(t.clone()));
        eng.handle_event(EngineEvent::Tick(t));

        let book = eng.books().book(&Symbol::from("AAPL")).unwrap();
        assert_eq!(book.update_count(), 1);
    }

    #[test]
    fn test_tick_sequence_moves_mid() {
        let mut eng = engine();
        let t = tick("AAPL", dec!(150.00), dec!(150.10));
        eng.handle_event(EngineEvent::Tick(t.clone()));
        eng.handle_event(EngineEvent::Tick(t));
        eng.handle_event(EngineEvent::Tick(tick("AAPL", dec!(150.05), dec!(150.15))));

        let book = eng.books().book(&Symbol::from("AAPL")).unwrap();
        assert_eq!(book.update_count(), 2);
        assert_eq!(book.mid().inner(), dec!(150.10));
        // Imbalance recomputed from the tick sizes (100 vs 200).
        let snap = book.snapshot();
        assert!(snap.imbalance < Decimal::ZERO);
    }

    #[test]
    fn test_other_symbol_does_not_reach_strategy() {
        let mut eng = engine();
        eng.handle_event(EngineEvent::Command(EngineCommand::Start));
        eng.handle_event(EngineEvent::Tick(tick("MSFT", dec!(300.00), dec!(300.20))));

        assert_eq!(eng.books().len(), 1);
        assert!(eng.strategy().orders().is_empty());
    }

    #[test]
    fn test_fill_round_trip() {
        let mut eng = engine();
        eng.handle_event(EngineEvent::Command(EngineCommand::Start));
        eng.handle_event(EngineEvent::Tick(tick("AAPL", dec!(150.00), dec!(150.10))));

        let bid = eng
            .strategy()
            .orders()
            .into_iter()
            .find(|o| o.side == tob_core::OrderSide::Buy)
            .unwrap();
        eng.handle_event(EngineEvent::Fill {
            order_id: bid.id,
            price: bid.price,
            qty: bid.quantity,
        });

        let status = eng.strategy().status();
        assert_eq!(status.position, bid.quantity);
        assert_eq!(status.total_trades, 1);
    }

    #[test]
    fn test_cancel_removes_order() {
        let mut eng = engine();
        eng.handle_event(EngineEvent::Command(EngineCommand::Start));
        eng.handle_event(EngineEvent::Tick(tick("AAPL", dec!(150.00), dec!(150.10))));

        let order = eng.strategy().orders().pop().unwrap();
        eng.handle_event(EngineEvent::Cancel(order.id));
        assert_eq!(eng.strategy().orders().len(), 1);
    }

    #[test]
    fn test_invalid_command_is_contained() {
        let mut eng = engine();
        // Pause before start: rejected and logged, never fatal.
        eng.handle_event(EngineEvent::Command(EngineCommand::Pause));
        assert_eq!(
            eng.strategy().status().state,
            tob_strategy::StrategyState::Initializing
        );
    }

    #[test]
    fn test_shutdown_stops_loop() {
        let mut eng = engine();
        assert!(eng.handle_event(EngineEvent::Tick(tick("AAPL", dec!(150.00), dec!(150.10)))));
        assert!(!eng.handle_event(EngineEvent::Shutdown));
    }
}
