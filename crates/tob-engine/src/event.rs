//! Engine event types.

use tokio::sync::oneshot;

use tob_core::{OrderId, Price, TickData};
use tob_strategy::StrategyStatus;

/// Lifecycle control commands, forwarded to the strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCommand {
    Start,
    Stop,
    Pause,
    Resume,
    ResetDaily,
}

/// Events processed by the engine, in strict arrival order.
#[derive(Debug)]
pub enum EngineEvent {
    /// Market-data tick from the feed.
    Tick(TickData),
    /// Fill notification from the execution layer.
    Fill {
        order_id: OrderId,
        price: Price,
        qty: i64,
    },
    /// Cancel notification from the execution layer.
    Cancel(OrderId),
    /// Lifecycle control.
    Command(EngineCommand),
    /// Status query; the current strategy status is sent back.
    Status(oneshot::Sender<StrategyStatus>),
    /// Stop the event loop.
    Shutdown,
}
