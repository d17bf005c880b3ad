//! Order book registry.
//!
//! One `OrderBook` per symbol, created lazily on first tick. The
//! manager is the single mutation point for all books; concurrent
//! producers must serialize calls to `update` (see tob-engine for the
//! one-task-per-engine discipline).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use tob_core::{Symbol, TickData};

use crate::book::{BookObserver, BookSnapshot, ObserverId, OrderBook};
use crate::error::BookError;

/// Subscriber to updates from any book in the registry.
///
/// Receives `(symbol, snapshot)` for every symbol without per-symbol
/// wiring. Failure isolation matches `BookObserver`: an erroring
/// subscriber is logged and skipped.
pub trait ManagerObserver: Send + Sync {
    fn on_book_event(&self, symbol: &Symbol, snapshot: &BookSnapshot) -> Result<(), BookError>;
}

/// Shared registry of manager-level observers.
///
/// Each book gets one forwarding observer pointing here, so updates
/// applied directly through `book_mut` still reach manager subscribers.
#[derive(Default)]
struct ManagerObservers {
    inner: RwLock<Vec<(ObserverId, Arc<dyn ManagerObserver>)>>,
}

impl ManagerObservers {
    fn notify(&self, symbol: &Symbol, snapshot: &BookSnapshot) {
        for (id, observer) in self.inner.read().iter() {
            if let Err(e) = observer.on_book_event(symbol, snapshot) {
                warn!(
                    symbol = %symbol,
                    observer_id = id.0,
                    error = %e,
                    "Manager observer failed"
                );
            }
        }
    }
}

/// Per-book observer that forwards updates to the manager registry.
struct ForwardingObserver {
    symbol: Symbol,
    registry: Arc<ManagerObservers>,
}

impl BookObserver for ForwardingObserver {
    fn on_book_update(&self, snapshot: &BookSnapshot) -> Result<(), BookError> {
        self.registry.notify(&self.symbol, snapshot);
        Ok(())
    }
}

/// Manages order books for multiple symbols.
pub struct OrderBookManager {
    books: HashMap<Symbol, OrderBook>,
    observers: Arc<ManagerObservers>,
    next_observer_id: u64,
}

impl OrderBookManager {
    pub fn new() -> Self {
        Self {
            books: HashMap::new(),
            observers: Arc::new(ManagerObservers::default()),
            next_observer_id: 0,
        }
    }

    /// Get or create the book for a symbol.
    pub fn book_mut(&mut self, symbol: &Symbol) -> &mut OrderBook {
        let observers = Arc::clone(&self.observers);
        self.books.entry(symbol.clone()).or_insert_with(|| {
            debug!(symbol = %symbol, "Creating order book");
            let mut book = OrderBook::new(symbol.clone());
            book.subscribe(Arc::new(ForwardingObserver {
                symbol: symbol.clone(),
                registry: observers,
            }));
            book
        })
    }

    /// Read-only access to an existing book.
    pub fn book(&self, symbol: &Symbol) -> Option<&OrderBook> {
        self.books.get(symbol)
    }

    /// Route a tick to the book for its symbol, creating it if needed.
    ///
    /// Returns the new snapshot when the book changed, `None` for
    /// no-op ticks.
    pub fn update(&mut self, tick: &TickData) -> Option<BookSnapshot> {
        let book = self.book_mut(&tick.symbol);
        if book.update(tick) {
            Some(book.snapshot())
        } else {
            None
        }
    }

    /// Point-in-time snapshots of every book ever created.
    pub fn snapshot_all(&self) -> HashMap<Symbol, BookSnapshot> {
        self.books
            .iter()
            .map(|(symbol, book)| (symbol.clone(), book.snapshot()))
            .collect()
    }

    /// Number of symbols seen so far.
    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// All symbols with a book, in arbitrary order.
    pub fn symbols(&self) -> Vec<Symbol> {
        self.books.keys().cloned().collect()
    }

    /// Register an observer for updates from any book.
    pub fn subscribe(&mut self, observer: Arc<dyn ManagerObserver>) -> ObserverId {
        let id = ObserverId(self.next_observer_id);
        self.next_observer_id += 1;
        self.observers.inner.write().push((id, observer));
        id
    }

    /// Remove a manager-level observer. Returns false when unknown.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let mut observers = self.observers.inner.write();
        let before = observers.len();
        observers.retain(|(oid, _)| *oid != id);
        observers.len() != before
    }
}

impl Default for OrderBookManager {
    fn default() -> Self {
        Self::new()
    }
}
