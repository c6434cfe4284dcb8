//! Retry budget for the database connect phase.
//!
//! The budget bounds both the number of attempts and the total wall-clock
//! time spent connecting. It lives only while connecting and is dropped once
//! the connection is up or the budget is spent.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::DatabaseConfig;
use crate::resilience::backoff::Backoff;

/// Attempt counter plus deadline.
#[derive(Debug)]
pub struct RetryBudget {
    max_attempts: u32,
    attempts: u32,
    started: Instant,
    max_total: Duration,
    backoff: Backoff,
}

impl RetryBudget {
    pub fn new(max_attempts: u32, max_total: Duration, backoff: Backoff) -> Self {
        Self {
            max_attempts,
            attempts: 0,
            started: Instant::now(),
            max_total,
            backoff,
        }
    }

    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.max_total_ms),
            Backoff::new(config.base_delay_ms, config.max_delay_ms),
        )
    }

    /// Record the start of an attempt. Returns its 1-based number, or `None`
    /// if no attempts are left.
    pub fn begin_attempt(&mut self) -> Option<u32> {
        if self.attempts >= self.max_attempts || self.remaining().is_zero() {
            return None;
        }
        self.attempts += 1;
        Some(self.attempts)
    }

    /// Delay before the next attempt, or `None` when the budget cannot afford
    /// another one (attempts spent or the wait would cross the deadline).
    pub fn next_delay(&self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        let delay = self.backoff.delay(self.attempts);
        if delay >= self.remaining() {
            return None;
        }
        Some(delay)
    }

    /// Time left before the deadline.
    pub fn remaining(&self) -> Duration {
        self.max_total.saturating_sub(self.started.elapsed())
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
