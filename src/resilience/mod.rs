//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Establishment try against the database:
//!     → timeouts.rs (enforce selection/connect/probe deadlines)
//!     → On failure: backoff.rs (exponential delay + bounded jitter)
//!     → circuit_breaker.rs (count consecutive failures, open at threshold)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Jittered backoff desynchronizes retries across instances
//! - Circuit breaker fails fast while the database is down

pub mod backoff;
pub mod circuit_breaker;
pub mod timeouts;

pub use backoff::BackoffPolicy;
pub use circuit_breaker::{Admission, BreakerPhase, CircuitBreaker};
pub use timeouts::{with_timeout, Elapsed};
