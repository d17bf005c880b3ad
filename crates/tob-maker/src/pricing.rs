//! Fair value and quote price calculation.
//!
//! Pure functions: book state + inventory in, prices out. No side
//! effects, no clock, no strategy state.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use tob_book::BookSnapshot;
use tob_core::Price;

/// Calculate fair value with a linear inventory adjustment.
///
/// Returns zero when the book has no usable mid (no market). A long
/// position pulls fair value below mid (incentivize selling), a short
/// position pulls it above (incentivize buying):
/// `fair = mid + (-inventory * skew * mid)`.
pub fn fair_value(snapshot: &BookSnapshot, inventory: i64, inventory_skew: Decimal) -> Price {
    let mid = snapshot.mid;
    if !mid.is_positive() {
        return Price::ZERO;
    }

    let adjustment = -Decimal::from(inventory) * inventory_skew * mid.inner();
    Price::new(mid.inner() + adjustment)
}

/// Calculate bid/ask quote prices around a fair value.
///
/// `half_spread = max(fair * spread_bps / 20000, min_spread / 2)`,
/// both quotes rounded to cents, half away from zero. Returns
/// `(0, 0)` when the fair value is not positive.
pub fn quote_prices(fair_value: Price, spread_bps: Decimal, min_spread: Decimal) -> (Price, Price) {
    if !fair_value.is_positive() {
        return (Price::ZERO, Price::ZERO);
    }

    let fv = fair_value.inner();
    let half_spread = (fv * spread_bps / dec!(20000)).max(min_spread / Decimal::TWO);

    let bid = Price::new(fv - half_spread).round_to_cents();
    let ask = Price::new(fv + half_spread).round_to_cents();

    (bid, ask)
}
