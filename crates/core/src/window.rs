use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Seconds since the Unix epoch. The common currency for instants across the
/// workspace; timezones only come into play for calendar arithmetic.
pub type EpochSeconds = i64;

/// The interval over which missed scheduled runs are replayed.
///
/// Occurrences are walked forward from `start` and accepted while
/// `run_time <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutageWindow {
    start: EpochSeconds,
    end: EpochSeconds,
}

impl OutageWindow {
    pub fn new(start: EpochSeconds, end: EpochSeconds) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::InvertedWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> EpochSeconds {
        self.start
    }

    pub fn end(&self) -> EpochSeconds {
        self.end
    }

    /// Whether an occurrence found by walking forward from `start` still
    /// belongs to the window.
    pub fn admits(&self, run_time: EpochSeconds) -> bool {
        run_time <= self.end
    }
}
