//! Strategy lifecycle states.
//!
//! Transitions happen only through explicit control calls, never from
//! data events. The one exception is the kill-switch, which forces
//! `Stopped`. `Error` is terminal and requires an external reset
//! (a new strategy instance).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Strategy lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyState {
    Initializing,
    Running,
    Paused,
    Stopped,
    Error,
}

impl StrategyState {
    /// Whether a transition to `next` is legal.
    ///
    /// Graph: Initializing -> Running; Running <-> Paused;
    /// Running/Paused -> Stopped; Stopped -> Running (operator
    /// restart, e.g. after a kill-switch reset); any non-terminal
    /// state -> Error.
    pub fn can_transition_to(self, next: StrategyState) -> bool {
        use StrategyState::*;
        if self == next {
            return false;
        }
        match (self, next) {
            (Error, _) => false,
            (_, Error) => true,
            (Initializing, Running) => true,
            (Running, Paused) | (Paused, Running) => true,
            (Running, Stopped) | (Paused, Stopped) => true,
            (Stopped, Running) => true,
            _ => false,
        }
    }

    /// Strategy reacts to market data only while running.
    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

impl fmt::Display for StrategyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initializing => write!(f, "initializing"),
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Stopped => write!(f, "stopped"),
            Self::Error => write!(f, "error"),
        }
    }
}
