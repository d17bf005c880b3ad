//! Raw market-data tick.
//!
//! A tick carries the current best bid/ask, last trade, and sizes for
//! one symbol. Broker APIs emit 0 or negative values for fields with
//! no current quote; those are treated as absent, never as errors.

use crate::{Price, Symbol};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single L1 market-data update for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickData {
    /// When the tick was received.
    pub timestamp: DateTime<Utc>,
    /// Instrument the tick belongs to.
    pub symbol: Symbol,
    /// Best bid price. Non-positive = no bid.
    pub bid: Price,
    /// Best ask price. Non-positive = no ask.
    pub ask: Price,
    /// Size at the best bid, in shares.
    pub bid_size: i64,
    /// Size at the best ask, in shares.
    pub ask_size: i64,
    /// Last trade price. Non-positive = no trade yet.
    pub last: Price,
    /// Cumulative session volume, in shares.
    pub volume: i64,
}

impl TickData {
    /// Tick carries a usable bid side.
    pub fn has_bid(&self) -> bool {
        self.bid.is_positive()
    }

    /// Tick carries a usable ask side.
    pub fn has_ask(&self) -> bool {
        self.ask.is_positive()
    }

    /// Tick carries a last-trade print.
    pub fn has_last(&self) -> bool {
        self.last.is_positive()
    }
}
