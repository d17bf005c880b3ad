//! Core domain types for the top-of-book market-making engine.
//!
//! This crate provides fundamental types used throughout the system:
//! - `Price`: precision-safe decimal price
//! - `Symbol`: instrument identifier
//! - `TickData`: raw L1 market-data update
//! - `Order`, `OrderId`, `OrderSide`: trading primitives

pub mod decimal;
pub mod error;
pub mod order;
pub mod symbol;
pub mod tick;

pub use decimal::Price;
pub use error::{CoreError, Result};
pub use order::{Order, OrderId, OrderSide, OrderStatus, OrderType};
pub use symbol::Symbol;
pub use tick::TickData;
