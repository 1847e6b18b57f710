//! Wall clock used to stamp records. Real time in production,
//! pinned in tests so timestamps are reproducible.

use crate::types::Timestamp;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExpClock {
    #[default]
    System,
    Fixed { now: Timestamp },
}

impl ExpClock {
    pub fn fixed(now: Timestamp) -> Self {
        Self::Fixed { now }
    }

    pub fn now(&self) -> Timestamp {
        match self {
            Self::System => Utc::now(),
            Self::Fixed { now } => *now,
        }
    }

    /// Move a pinned clock forward. No-op on the system clock.
    pub fn advance(&mut self, by: Duration) {
        if let Self::Fixed { now } = self {
            *now += by;
        }
    }
}
