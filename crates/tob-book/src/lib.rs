//! Top-of-book (L1) reconstruction from raw tick streams.
//!
//! One `OrderBook` per symbol tracks best bid/ask/last and exposes
//! derived metrics (mid, spread, imbalance). The `OrderBookManager`
//! routes ticks to books and fans updates out to subscribers.

pub mod book;
pub mod error;
pub mod manager;

pub use book::{BookObserver, BookSnapshot, ObserverId, OrderBook, PriceLevel};
pub use error::{BookError, Result};
pub use manager::{ManagerObserver, OrderBookManager};
