//! Serialized event processing for strategies.
//!
//! One dedicated task per engine drains a single event queue, so a
//! strategy and its order books always see ticks, fills, and cancels
//! in strict arrival order, no matter how many producers feed the
//! queue. Event sends are fire-and-forget; nothing in the decision
//! path awaits the execution layer.

pub mod engine;
pub mod error;
pub mod event;

pub use engine::{spawn, Engine, EngineHandle};
pub use error::{EngineError, Result};
pub use event::{EngineCommand, EngineEvent};
