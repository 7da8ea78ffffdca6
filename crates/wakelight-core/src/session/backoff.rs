// ── Reconnect backoff ──
//
// Exponential delay between connection attempts, doubling per attempt and
// capped at `max`. The session re-arms it to `min` on every tick that
// finds the link up.

use std::time::{Duration, Instant};

use crate::config::ReconnectConfig;

#[derive(Debug, Clone)]
pub struct Backoff {
    min: Duration,
    max: Duration,
    current: Duration,
    last_attempt: Option<Instant>,
}

impl Backoff {
    /// A `max` below `min` is raised to `min`.
    pub fn new(min: Duration, max: Duration) -> Self {
        let max = max.max(min);
        Self {
            min,
            max,
            current: min,
            last_attempt: None,
        }
    }

    pub fn from_config(config: &ReconnectConfig) -> Self {
        Self::new(config.min_backoff, config.max_backoff)
    }

    /// Delay that must pass after the last attempt before the next one.
    pub fn current_delay(&self) -> Duration {
        self.current
    }

    /// The first attempt is always due.
    pub fn attempt_due(&self, now: Instant) -> bool {
        self.last_attempt
            .is_none_or(|last| now.saturating_duration_since(last) >= self.current)
    }

    /// Record an attempt at `now` and double the delay, up to `max`.
    pub fn record_attempt(&mut self, now: Instant) {
        self.last_attempt = Some(now);
        self.current = self.current.saturating_mul(2).min(self.max);
    }

    pub fn reset(&mut self) {
        self.current = self.min;
    }
}
