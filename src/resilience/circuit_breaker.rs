//! Circuit breaker for the database connection.
//!
//! # States
//! - Closed: normal operation, establishment attempts pass through
//! - Open: database assumed down, attempts fail fast until the deadline
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures >= threshold
//! Open → Closed: cooldown elapsed and a new attempt is admitted
//! ```
//!
//! There is no half-open probe state: the first attempt admitted after the
//! cooldown starts from a zeroed failure count, so it needs `threshold` fresh
//! failures to trip again.

use std::time::Duration;
use serde::Serialize;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakerState {
    Closed,
    Open { until: Instant },
}

/// Serializable breaker state for status reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerPhase {
    Closed,
    Open,
}

/// Outcome of asking the breaker whether an attempt may proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Breaker closed, go ahead.
    Allowed,
    /// Breaker was open, the cooldown elapsed and it just closed.
    Reclosed,
    /// Breaker open; retry after the given duration.
    Rejected { retry_after: Duration },
}

/// Consecutive-failure circuit breaker.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    threshold: u32,
    cooldown: Duration,
    consecutive_failures: u32,
    state: BreakerState,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold: threshold.max(1),
            cooldown,
            consecutive_failures: 0,
            state: BreakerState::Closed,
        }
    }

    /// Check whether an attempt may start at `now`, closing the breaker if
    /// its cooldown has elapsed.
    pub fn admit(&mut self, now: Instant) -> Admission {
        match self.state {
            BreakerState::Closed => Admission::Allowed,
            BreakerState::Open { until } if now < until => Admission::Rejected {
                retry_after: until - now,
            },
            BreakerState::Open { .. } => {
                self.state = BreakerState::Closed;
                self.consecutive_failures = 0;
                Admission::Reclosed
            }
        }
    }

    /// Record a failed try. Returns true if this failure opened the breaker.
    pub fn record_failure(&mut self, now: Instant) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        if matches!(self.state, BreakerState::Closed) && self.consecutive_failures >= self.threshold {
            self.state = BreakerState::Open { until: now + self.cooldown };
            return true;
        }
        false
    }

    /// Record a success (establishment or a passing probe).
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    pub fn phase(&self) -> BreakerPhase {
        match self.state {
            BreakerState::Closed => BreakerPhase::Closed,
            BreakerState::Open { .. } => BreakerPhase::Open,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Remaining cooldown at `now`, if open.
    pub fn retry_after(&self, now: Instant) -> Option<Duration> {
        match self.state {
            BreakerState::Open { until } if now < until => Some(until - now),
            _ => None,
        }
    }
}
