//! Prometheus metrics for the quoting engine.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration
//! failure means duplicate metric names, a fatal configuration error
//! that should crash at startup rather than fail silently. These
//! panics only occur during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_gauge_vec, CounterVec, GaugeVec};

/// Total ticks received, per symbol.
pub static TICKS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tob_ticks_total",
        "Total market-data ticks received",
        &["symbol"]
    )
    .unwrap()
});

/// Total book updates (de-duplicated ticks that changed the book).
pub static BOOK_UPDATES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tob_book_updates_total",
        "Total order book updates that changed state",
        &["symbol"]
    )
    .unwrap()
});

/// Total fills processed, per symbol and side.
pub static FILLS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tob_fills_total",
        "Total fills processed",
        &["symbol", "side"]
    )
    .unwrap()
});

/// Total kill-switch triggers.
pub static KILL_SWITCH_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tob_kill_switch_total",
        "Total kill-switch triggers",
        &["symbol"]
    )
    .unwrap()
});

/// Current observed market spread in basis points.
pub static BOOK_SPREAD_BPS: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "tob_book_spread_bps",
        "Current market spread in basis points",
        &["symbol"]
    )
    .unwrap()
});
