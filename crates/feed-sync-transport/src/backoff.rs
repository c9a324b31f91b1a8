//! Reconnection backoff.

use std::time::Duration;

use feed_sync_core::{
    ClientConfig,
    config::{DEFAULT_RECONNECT_CEILING, DEFAULT_RECONNECT_FLOOR},
};

/// Exponential backoff with a fixed ceiling and reset on success.
///
/// `current` is the delay for the next scheduled reconnect. It doubles
/// after every attempt and drops back to the floor only on `reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    floor: Duration,
    ceiling: Duration,
    current: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_RECONNECT_FLOOR, DEFAULT_RECONNECT_CEILING)
    }
}

impl Backoff {
    /// Create a backoff starting at `floor`.
    #[must_use]
    pub fn new(floor: Duration, ceiling: Duration) -> Self {
        let ceiling = ceiling.max(floor);
        Self {
            floor,
            ceiling,
            current: floor,
        }
    }

    /// Backoff bounds from configuration.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.reconnect_floor, config.reconnect_ceiling)
    }

    /// Delay for the next reconnect.
    #[must_use]
    pub const fn current(&self) -> Duration {
        self.current
    }

    /// Double the delay, capped at the ceiling.
    pub fn advance(&mut self) -> Duration {
        self.current = self.current.saturating_mul(2).min(self.ceiling);
        self.current
    }

    /// Back to the floor.
    pub fn reset(&mut self) {
        self.current = self.floor;
    }
}
