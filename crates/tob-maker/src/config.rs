//! Market-making configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::MakerError;

/// Market-making configuration.
///
/// Validated once at strategy construction and immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakerConfig {
    /// Target quoted spread in basis points.
    #[serde(default = "default_spread_bps")]
    pub spread_bps: Decimal,

    /// Minimum acceptable quoted spread in basis points.
    #[serde(default = "default_min_spread_bps")]
    pub min_spread_bps: Decimal,

    /// Shares per quote.
    #[serde(default = "default_quote_size")]
    pub quote_size: i64,

    /// Maximum absolute position in shares.
    #[serde(default = "default_max_position")]
    pub max_position: i64,

    /// Fair-value price adjustment per share of inventory.
    /// Long inventory pulls fair value down, short pulls it up.
    #[serde(default = "default_inventory_skew")]
    pub inventory_skew: Decimal,

    /// Daily loss at which the kill-switch fires, in currency units.
    #[serde(default = "default_max_daily_loss")]
    pub max_daily_loss: Decimal,

    /// Minimum time between quote refreshes in milliseconds.
    #[serde(default = "default_quote_refresh_ms")]
    pub quote_refresh_ms: u64,

    /// Stand down when the market spread is tighter than this (bps).
    #[serde(default = "default_min_book_spread_bps")]
    pub min_book_spread_bps: Decimal,

    /// Stand down when the market spread is wider than this (bps).
    #[serde(default = "default_max_book_spread_bps")]
    pub max_book_spread_bps: Decimal,
}

impl MakerConfig {
    /// Validate the configuration.
    ///
    /// Fails fast at construction time; a strategy never runs with a
    /// config that would misbehave at first use.
    pub fn validate(&self) -> Result<(), MakerError> {
        if self.spread_bps <= Decimal::ZERO {
            return Err(MakerError::InvalidConfig(format!(
                "spread_bps must be positive, got {}",
                self.spread_bps
            )));
        }
        if self.min_spread_bps <= Decimal::ZERO || self.min_spread_bps > self.spread_bps {
            return Err(MakerError::InvalidConfig(format!(
                "min_spread_bps must be in (0, spread_bps], got {}",
                self.min_spread_bps
            )));
        }
        if self.quote_size <= 0 {
            return Err(MakerError::InvalidConfig(format!(
                "quote_size must be positive, got {}",
                self.quote_size
            )));
        }
        if self.max_position <= 0 {
            return Err(MakerError::InvalidConfig(format!(
                "max_position must be positive, got {}",
                self.max_position
            )));
        }
        if self.inventory_skew < Decimal::ZERO {
            return Err(MakerError::InvalidConfig(format!(
                "inventory_skew must be non-negative, got {}",
                self.inventory_skew
            )));
        }
        if self.max_daily_loss <= Decimal::ZERO {
            return Err(MakerError::InvalidConfig(format!(
                "max_daily_loss must be positive, got {}",
                self.max_daily_loss
            )));
        }
        if self.quote_refresh_ms == 0 {
            return Err(MakerError::InvalidConfig(
                "quote_refresh_ms must be positive".to_string(),
            ));
        }
        if self.min_book_spread_bps < Decimal::ZERO
            || self.max_book_spread_bps <= self.min_book_spread_bps
        {
            return Err(MakerError::InvalidConfig(format!(
                "book spread band must satisfy 0 <= min < max, got [{}, {}]",
                self.min_book_spread_bps, self.max_book_spread_bps
            )));
        }
        Ok(())
    }
}

impl Default for MakerConfig {
    fn default() -> Self {
        Self {
            spread_bps: default_spread_bps(),
            min_spread_bps: default_min_spread_bps(),
            quote_size: default_quote_size(),
            max_position: default_max_position(),
            inventory_skew: default_inventory_skew(),
            max_daily_loss: default_max_daily_loss(),
            quote_refresh_ms: default_quote_refresh_ms(),
            min_book_spread_bps: default_min_book_spread_bps(),
            max_book_spread_bps: default_max_book_spread_bps(),
        }
    }
}

fn default_spread_bps() -> Decimal {
    Decimal::new(10, 0) // 10 bps
}
fn default_min_spread_bps() -> Decimal {
    Decimal::new(5, 0) // 5 bps
}
fn default_quote_size() -> i64 {
    10
}
fn default_max_position() -> i64 {
    100
}
fn default_inventory_skew() -> Decimal {
    Decimal::new(1, 4) // 0.0001 per share
}
fn default_max_daily_loss() -> Decimal {
    Decimal::new(1000, 0) // $1000
}
fn default_quote_refresh_ms() -> u64 {
    100
}
fn default_min_book_spread_bps() -> Decimal {
    Decimal::ONE // 1 bps
}
fn default_max_book_spread_bps() -> Decimal {
    Decimal::new(100, 0) // 100 bps
}
