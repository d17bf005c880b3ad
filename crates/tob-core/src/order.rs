//! Order types and identifiers.

use crate::error::CoreError;
use crate::{Price, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Returns 1 for buy, -1 for sell (for position calculations).
    pub fn sign(&self) -> i64 {
        match self {
            Self::Buy => 1,
            Self::Sell => -1,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Limit order (the only type the quoting path emits).
    #[default]
    Limit,
    /// Market order.
    Market,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limit => write!(f, "LMT"),
            Self::Market => write!(f, "MKT"),
        }
    }
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, not yet acknowledged by the execution layer.
    #[default]
    Pending,
    /// Resting in the market.
    Working,
    /// Partially filled, remainder still working.
    PartiallyFilled,
    /// Completely filled.
    Filled,
    /// Cancelled before completion.
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Working => write!(f, "working"),
            Self::PartiallyFilled => write!(f, "partially_filled"),
            Self::Filled => write!(f, "filled"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Order identifier, unique per strategy instance.
///
/// Format: `{symbol}-{seq}-{uuid_short}`. The sequence number keeps ids
/// ordered for a human reading logs; the uuid suffix keeps them unique
/// across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(String);

impl OrderId {
    /// Generate a new order id for a symbol.
    pub fn generate(symbol: &Symbol, seq: u64) -> Self {
        let uuid_short = &Uuid::new_v4().to_string()[..8];
        Self(format!("{symbol}-{seq}-{uuid_short}"))
    }

    /// Create from an existing string (for parsing fill notifications).
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self::from_string(s)
    }
}

impl AsRef<str> for OrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A working or pending order owned by a strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: Symbol,
    pub side: OrderSide,
    /// Total quantity in shares, always > 0.
    pub quantity: i64,
    pub price: Price,
    pub order_type: OrderType,
    pub status: OrderStatus,
    /// Shares filled so far.
    pub filled_qty: i64,
    /// Volume-weighted average fill price.
    pub avg_fill_price: Price,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a new limit order.
    ///
    /// Fails fast on non-positive quantity or price; these are
    /// programmer errors, not market conditions.
    pub fn limit(
        id: OrderId,
        symbol: Symbol,
        side: OrderSide,
        quantity: i64,
        price: Price,
    ) -> Result<Self, CoreError> {
        if quantity <= 0 {
            return Err(CoreError::InvalidQuantity(quantity));
        }
        if !price.is_positive() {
            return Err(CoreError::InvalidPrice(price.to_string()));
        }
        let now = Utc::now();
        Ok(Self {
            id,
            symbol,
            side,
            quantity,
            price,
            order_type: OrderType::Limit,
            status: OrderStatus::Pending,
            filled_qty: 0,
            avg_fill_price: Price::ZERO,
            created_at: now,
            updated_at: now,
        })
    }

    /// Shares still unfilled.
    pub fn remaining_qty(&self) -> i64 {
        self.quantity - self.filled_qty
    }

    /// True once the full quantity has been filled.
    pub fn is_filled(&self) -> bool {
        self.filled_qty >= self.quantity
    }

    /// Record a (partial) fill against this order.
    ///
    /// Updates filled quantity, volume-weighted average fill price, and
    /// status. Overfills are clamped to the order quantity.
    pub fn record_fill(&mut self, fill_price: Price, fill_qty: i64) {
        let qty = fill_qty.min(self.remaining_qty()).max(0);
        if qty == 0 {
            return;
        }

        let old_notional = self.avg_fill_price.inner() * Decimal::from(self.filled_qty);
        let fill_notional = fill_price.inner() * Decimal::from(qty);
        self.filled_qty += qty;
        self.avg_fill_price =
            Price::new((old_notional + fill_notional) / Decimal::from(self.filled_qty));

        self.status = if self.is_filled() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.updated_at = Utc::now();
    }
}
