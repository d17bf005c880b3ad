//! Per-symbol order book state machine.
//!
//! Maintains best bid/ask/last from L1 tick updates. A tick only
//! counts as an update when a bid or ask field actually differs from
//! current state; duplicate ticks are de-duplicated and produce no
//! notification.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use tob_core::{Price, Symbol, TickData};

use crate::error::BookError;

/// A single price level in the book ladder.
///
/// Placeholder for depth-of-market data; L1 reconstruction never
/// populates the ladders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Price,
    pub size: i64,
    pub order_count: u32,
    pub timestamp: DateTime<Utc>,
}

/// Point-in-time snapshot of order book state.
///
/// An immutable value copy with no shared state; safe to hand to any
/// number of concurrent readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub symbol: Symbol,
    pub timestamp: DateTime<Utc>,
    pub bid: Price,
    pub ask: Price,
    pub bid_size: i64,
    pub ask_size: i64,
    pub mid: Price,
    pub spread: Price,
    pub spread_bps: Decimal,
    pub imbalance: Decimal,
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

/// Subscriber to order book updates.
///
/// A failing observer is logged and skipped; it never prevents the
/// remaining observers from being notified.
pub trait BookObserver: Send + Sync {
    fn on_book_update(&self, snapshot: &BookSnapshot) -> Result<(), BookError>;
}

/// Maintains top-of-book state for one symbol.
///
/// Owned exclusively by its manager entry; mutated only through
/// `update`. Created lazily on the first tick for a symbol and lives
/// for the process lifetime.
pub struct OrderBook {
    symbol: Symbol,
    bid: Price,
    ask: Price,
    bid_size: i64,
    ask_size: i64,
    last: Price,
    volume: i64,
    last_update: DateTime<Utc>,
    update_count: u64,
    observers: Vec<(ObserverId, Arc<dyn BookObserver>)>,
    next_observer_id: u64,
    // Depth ladders, reserved for L2 feeds.
    bid_levels: BTreeMap<Price, PriceLevel>,
    ask_levels: BTreeMap<Price, PriceLevel>,
}

impl std::fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBook")
            .field("symbol", &self.symbol)
            .field("bid", &self.bid)
            .field("ask", &self.ask)
            .field("bid_size", &self.bid_size)
            .field("ask_size", &self.ask_size)
            .field("last", &self.last)
            .field("update_count", &self.update_count)
            .finish()
    }
}

impl OrderBook {
    /// Create an empty book for a symbol.
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            bid: Price::ZERO,
            ask: Price::ZERO,
            bid_size: 0,
            ask_size: 0,
            last: Price::ZERO,
            volume: 0,
            last_update: Utc::now(),
            update_count: 0,
            observers: Vec::new(),
            next_observer_id: 0,
            bid_levels: BTreeMap::new(),
            ask_levels: BTreeMap::new(),
        }
    }

    /// Reconstruct a book from a snapshot.
    ///
    /// Test-construction API: fixtures build book state through this
    /// instead of reaching into private fields. `last` is seeded from
    /// the snapshot mid so the mid derivation agrees with the source
    /// snapshot even when a side is absent.
    pub fn from_snapshot(snapshot: &BookSnapshot) -> Self {
        let mut book = Self::new(snapshot.symbol.clone());
        book.bid = snapshot.bid;
        book.ask = snapshot.ask;
        book.bid_size = snapshot.bid_size;
        book.ask_size = snapshot.ask_size;
        book.last = snapshot.mid;
        book.last_update = snapshot.timestamp;
        book
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Best bid price. Zero when no bid has been seen.
    pub fn bid(&self) -> Price {
        self.bid
    }

    /// Best ask price. Zero when no ask has been seen.
    pub fn ask(&self) -> Price {
        self.ask
    }

    pub fn bid_size(&self) -> i64 {
        self.bid_size
    }

    pub fn ask_size(&self) -> i64 {
        self.ask_size
    }

    pub fn last(&self) -> Price {
        self.last
    }

    pub fn volume(&self) -> i64 {
        self.volume
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    pub fn last_update(&self) -> DateTime<Utc> {
        self.last_update
    }

    /// Mid price: (bid + ask) / 2 when both sides are set, otherwise
    /// the last trade price.
    pub fn mid(&self) -> Price {
        if self.bid.is_positive() && self.ask.is_positive() {
            Price::new((self.bid.inner() + self.ask.inner()) / Decimal::TWO)
        } else {
            self.last
        }
    }

    /// Absolute spread: ask - bid when both sides are set, else zero.
    pub fn spread(&self) -> Price {
        if self.bid.is_positive() && self.ask.is_positive() {
            self.ask - self.bid
        } else {
            Price::ZERO
        }
    }

    /// Spread in basis points of mid. Zero when mid is unset.
    pub fn spread_bps(&self) -> Decimal {
        let mid = self.mid();
        if mid.is_positive() {
            self.spread().inner() / mid.inner() * Decimal::from(10000)
        } else {
            Decimal::ZERO
        }
    }

    /// Book imbalance: (bid_size - ask_size) / (bid_size + ask_size).
    ///
    /// Positive = more buying pressure. Zero when both sizes are zero.
    pub fn imbalance(&self) -> Decimal {
        let total = self.bid_size + self.ask_size;
        if total == 0 {
            Decimal::ZERO
        } else {
            Decimal::from(self.bid_size - self.ask_size) / Decimal::from(total)
        }
    }

    /// Apply a tick to the book.
    ///
    /// Bid/ask sides are written only when the tick carries them as
    /// positive AND price or size differs from current state. `last`
    /// and `volume` are written whenever positive, independent of the
    /// quote sides, but do not count as a change on their own.
    ///
    /// Returns true when the book changed; observers are notified
    /// exactly once per changing update.
    pub fn update(&mut self, tick: &TickData) -> bool {
        let mut changed = false;

        if tick.has_bid() && (tick.bid != self.bid || tick.bid_size != self.bid_size) {
            self.bid = tick.bid;
            self.bid_size = tick.bid_size;
            changed = true;
        }

        if tick.has_ask() && (tick.ask != self.ask || tick.ask_size != self.ask_size) {
            self.ask = tick.ask;
            self.ask_size = tick.ask_size;
            changed = true;
        }

        if tick.has_last() {
            self.last = tick.last;
        }

        if tick.volume > 0 {
            self.volume = tick.volume;
        }

        if changed {
            self.last_update = Utc::now();
            self.update_count += 1;
            self.notify();
        }

        changed
    }

    /// Current book state as an immutable snapshot. Pure read.
    pub fn snapshot(&self) -> BookSnapshot {
        BookSnapshot {
            symbol: self.symbol.clone(),
            timestamp: self.last_update,
            bid: self.bid,
            ask: self.ask,
            bid_size: self.bid_size,
            ask_size: self.ask_size,
            mid: self.mid(),
            spread: self.spread(),
            spread_bps: self.spread_bps(),
            imbalance: self.imbalance(),
        }
    }

    /// Register an observer for book updates.
    pub fn subscribe(&mut self, observer: Arc<dyn BookObserver>) -> ObserverId {
        let id = ObserverId(self.next_observer_id);
        self.next_observer_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// Remove an observer. Returns false when the id is unknown.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    fn notify(&self) {
        let snapshot = self.snapshot();
        for (id, observer) in &self.observers {
            if let Err(e) = observer.on_book_update(&snapshot) {
                warn!(
                    symbol = %self.symbol,
                    observer_id = id.0,
                    error = %e,
                    "Book observer failed"
                );
            }
        }
    }

    /// Depth ladder sizes (always empty until L2 feeds exist).
    pub fn depth(&self) -> (usize, usize) {
        (self.bid_levels.len(), self.ask_levels.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tick(bid: Decimal, ask: Decimal, bid_size: i64, ask_size: i64) -> TickData {
        TickData {
            timestamp: Utc::now(),
            symbol: Symbol::from("AAPL"),
            bid: Price::new(bid),
            ask: Price::new(ask),
            bid_size,
            ask_size,
            last: Price::ZERO,
            volume: 0,
        }
    }

    struct CountingObserver {
        count: AtomicUsize,
    }

    impl BookObserver for CountingObserver {
        fn on_book_update(&self, _snapshot: &BookSnapshot) -> Result<(), BookError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingObserver;

    impl BookObserver for FailingObserver {
        fn on_book_update(&self, _snapshot: &BookSnapshot) -> Result<(), BookError> {
            Err(BookError::Observer("boom".to_string()))
        }
    }

    struct RecordingObserver {
        snapshots: Mutex<Vec<BookSnapshot>>,
    }

    impl BookObserver for RecordingObserver {
        fn on_book_update(&self, snapshot: &BookSnapshot) -> Result<(), BookError> {
            self.snapshots.lock().push(snapshot.clone());
            Ok(())
        }
    }

    #[test]
    fn test_update_sets_both_sides() {
        let mut book = OrderBook::new(Symbol::from("AAPL"));
        assert!(book.update(&tick(dec!(150.00), dec!(150.10), 100, 200)));

        assert_eq!(book.bid().inner(), dec!(150.00));
        assert_eq!(book.ask().inner(), dec!(150.10));
        assert_eq!(book.bid_size(), 100);
        assert_eq!(book.ask_size(), 200);
        assert_eq!(book.update_count(), 1);
    }

    #[test]
    fn test_nonpositive_bid_leaves_bid_unchanged() {
        let mut book = OrderBook::new(Symbol::from("AAPL"));
        book.update(&tick(dec!(150.00), dec!(150.10), 100, 200));

        // Bid of 0 means "no bid": the bid side must not be touched.
        book.update(&tick(dec!(0), dec!(150.20), 0, 300));
        assert_eq!(book.bid().inner(), dec!(150.00));
        assert_eq!(book.bid_size(), 100);
        assert_eq!(book.ask().inner(), dec!(150.20));
        assert_eq!(book.ask_size(), 300);
    }

    #[test]
    fn test_nonpositive_ask_leaves_ask_unchanged() {
        let mut book = OrderBook::new(Symbol::from("AAPL"));
        book.update(&tick(dec!(150.00), dec!(150.10), 100, 200));

        book.update(&tick(dec!(150.05), dec!(-1), 150, 0));
        assert_eq!(book.ask().inner(), dec!(150.10));
        assert_eq!(book.ask_size(), 200);
        assert_eq!(book.bid().inner(), dec!(150.05));
    }

    #[test]
    fn test_duplicate_tick_is_noop() {
        let mut book = OrderBook::new(Symbol::from("AAPL"));
        let observer = Arc::new(CountingObserver {
            count: AtomicUsize::new(0),
        });
        book.subscribe(observer.clone());

        let t = tick(dec!(150.00), dec!(150.10), 100, 200);
        assert!(book.update(&t));
        assert!(!book.update(&t));

        assert_eq!(observer.count.load(Ordering::SeqCst), 1);
        assert_eq!(book.update_count(), 1);
    }

    #[test]
    fn test_size_change_alone_is_an_update() {
        let mut book = OrderBook::new(Symbol::from("AAPL"));
        book.update(&tick(dec!(150.00), dec!(150.10), 100, 200));

        // Same prices, different bid size: still a change.
        assert!(book.update(&tick(dec!(150.00), dec!(150.10), 120, 200)));
        assert_eq!(book.bid_size(), 120);
        assert_eq!(book.update_count(), 2);
    }

    #[test]
    fn test_last_and_volume_only_do_not_notify() {
        let mut book = OrderBook::new(Symbol::from("AAPL"));
        book.update(&tick(dec!(150.00), dec!(150.10), 100, 200));

        let observer = Arc::new(CountingObserver {
            count: AtomicUsize::new(0),
        });
        book.subscribe(observer.clone());

        let mut t = tick(dec!(150.00), dec!(150.10), 100, 200);
        t.last = Price::new(dec!(150.05));
        t.volume = 12_345;
        assert!(!book.update(&t));

        assert_eq!(book.last().inner(), dec!(150.05));
        assert_eq!(book.volume(), 12_345);
        assert_eq!(observer.count.load(Ordering::SeqCst), 0);
        assert_eq!(book.update_count(), 1);
    }

    #[test]
    fn test_mid_falls_back_to_last() {
        let mut book = OrderBook::new(Symbol::from("AAPL"));
        let mut t = tick(dec!(0), dec!(0), 0, 0);
        t.last = Price::new(dec!(149.50));
        book.update(&t);

        assert_eq!(book.mid().inner(), dec!(149.50));
        assert_eq!(book.spread(), Price::ZERO);
    }

    #[test]
    fn test_mid_spread_from_both_sides() {
        let mut book = OrderBook::new(Symbol::from("AAPL"));
        book.update(&tick(dec!(150.00), dec!(150.10), 100, 200));

        assert_eq!(book.mid().inner(), dec!(150.05));
        assert_eq!(book.spread().inner(), dec!(0.10));
        // 0.10 / 150.05 * 10000 ≈ 6.66 bps
        let bps = book.spread_bps();
        assert!(bps > dec!(6.6) && bps < dec!(6.7));
    }

    #[test]
    fn test_imbalance() {
        let mut book = OrderBook::new(Symbol::from("AAPL"));
        book.update(&tick(dec!(150.00), dec!(150.10), 300, 100));
        // (300 - 100) / 400 = 0.5
        assert_eq!(book.imbalance(), dec!(0.5));
    }

    #[test]
    fn test_imbalance_zero_sizes() {
        let book = OrderBook::new(Symbol::from("AAPL"));
        assert_eq!(book.imbalance(), Decimal::ZERO);
        assert_eq!(book.spread_bps(), Decimal::ZERO);
    }

    #[test]
    fn test_snapshot_is_value_copy() {
        let mut book = OrderBook::new(Symbol::from("AAPL"));
        book.update(&tick(dec!(150.00), dec!(150.10), 100, 200));
        let snap = book.snapshot();

        book.update(&tick(dec!(151.00), dec!(151.10), 100, 200));

        // Snapshot is unaffected by later mutation.
        assert_eq!(snap.bid.inner(), dec!(150.00));
        assert_eq!(snap.mid.inner(), dec!(150.05));
    }

    #[test]
    fn test_from_snapshot_round_trip() {
        let mut book = OrderBook::new(Symbol::from("AAPL"));
        book.update(&tick(dec!(150.00), dec!(150.10), 100, 200));
        let snap = book.snapshot();

        let rebuilt = OrderBook::from_snapshot(&snap);
        assert_eq!(rebuilt.bid(), snap.bid);
        assert_eq!(rebuilt.ask(), snap.ask);
        assert_eq!(rebuilt.mid(), snap.mid);
        assert_eq!(rebuilt.imbalance(), snap.imbalance);
    }

    #[test]
    fn test_failing_observer_does_not_block_others() {
        let mut book = OrderBook::new(Symbol::from("AAPL"));
        book.subscribe(Arc::new(FailingObserver));
        let observer = Arc::new(CountingObserver {
            count: AtomicUsize::new(0),
        });
        book.subscribe(observer.clone());

        book.update(&tick(dec!(150.00), dec!(150.10), 100, 200));
        assert_eq!(observer.count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let mut book = OrderBook::new(Symbol::from("AAPL"));
        let observer = Arc::new(CountingObserver {
            count: AtomicUsize::new(0),
        });
        let id = book.subscribe(observer.clone());

        assert!(book.unsubscribe(id));
        assert!(!book.unsubscribe(id));

        book.update(&tick(dec!(150.00), dec!(150.10), 100, 200));
        assert_eq!(observer.count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_observer_sees_fresh_snapshot() {
        let mut book = OrderBook::new(Symbol::from("AAPL"));
        let observer = Arc::new(RecordingObserver {
            snapshots: Mutex::new(Vec::new()),
        });
        book.subscribe(observer.clone());

        book.update(&tick(dec!(150.00), dec!(150.10), 100, 200));
        book.update(&tick(dec!(150.05), dec!(150.15), 100, 200));

        let snaps = observer.snapshots.lock();
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].mid.inner(), dec!(150.05));
        assert_eq!(snaps[1].mid.inner(), dec!(150.10));
    }
}
