//! Throttle state for coordinated backoff.
//!
//! When the remote service answers `ServiceUnavailable`, both queues back off
//! together: the endpoint is one shared resource, so a single consecutive
//! throttle counter drives the delay for every retry.

use rand::Rng;
use std::time::Duration;

use super::config::SchedulerConfig;

/// Global throttle state shared by both queues.
#[derive(Debug)]
pub struct ThrottleController {
    /// Consecutive throttled responses, saturating at `max_count`.
    consecutive_throttles: u32,
    /// Count at which backoff stops growing.
    max_count: u32,
    /// Exclusive upper bound of the jitter, in milliseconds.
    max_jitter_ms: u64,
    /// Always return a zero delay.
    disable_throttling: bool,
}

impl ThrottleController {
    /// Create a controller from scheduler configuration.
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            consecutive_throttles: 0,
            max_count: config.max_throttle_count.max(1),
            max_jitter_ms: config.max_jitter_ms,
            disable_throttling: config.disable_throttling,
        }
    }

    /// Current consecutive throttle count.
    pub fn count(&self) -> u32 {
        self.consecutive_throttles
    }

    /// Backoff for a given count, without jitter: `2^(count-1)` seconds.
    pub fn base_delay(count: u32) -> Duration {
        let exponent = count.saturating_sub(1).min(63);
        Duration::from_secs(1u64 << exponent)
    }

    /// Record a throttled response and return how long to wait before the
    /// queue's loop runs again.
    pub fn on_throttled(&mut self) -> Duration {
        if self.consecutive_throttles < self.max_count {
            self.consecutive_throttles += 1;
        }

        if self.disable_throttling {
            return Duration::ZERO;
        }

        let jitter_ms = if self.max_jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..self.max_jitter_ms)
        };
        let delay = Self::base_delay(self.consecutive_throttles) + Duration::from_millis(jitter_ms);

        tracing::warn!(
            delay_ms = delay.as_millis() as u64,
            consecutive_throttles = self.consecutive_throttles,
            "Throttled, backing off globally"
        );
        delay
    }

    /// Record a success or terminal error; the next throttle starts over.
    pub fn on_succeeded_or_terminal_error(&mut self) {
        self.consecutive_throttles = 0;
    }
}
