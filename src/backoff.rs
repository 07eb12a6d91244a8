//! Reconnection backoff policy.
//!
//! Delays grow exponentially per scheduled attempt and are capped at a
//! ceiling. The attempt counter lives on the connection (it increments when
//! an attempt is *scheduled* and resets to zero on a successful open); this
//! module only maps an attempt number to a delay.

use std::time::Duration;

/// Exponential backoff with a ceiling: `min(ceiling, base * 2^attempt)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    base_ms: u64,
    ceiling_ms: u64,
}

impl ReconnectPolicy {
    /// Create a policy from a base delay and a ceiling.
    pub fn new(base: Duration, ceiling: Duration) -> Self {
        Self {
            base_ms: base.as_millis() as u64,
            ceiling_ms: ceiling.as_millis() as u64,
        }
    }

    /// Build the policy from reconnect options expressed in milliseconds.
    pub fn from_millis(base_ms: u64, ceiling_ms: u64) -> Self {
        Self { base_ms, ceiling_ms }
    }

    /// Delay before the given 0-indexed reconnect attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        let delay_ms = self
            .base_ms
            .saturating_mul(2u64.saturating_pow(attempt))
            .min(self.ceiling_ms);
        Duration::from_millis(delay_ms)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_ms: 1000,
            ceiling_ms: 30000,
        }
    }
}
