//! Failure taxonomy for connection acquisition.

use std::fmt;
use std::io;
use std::time::Duration;
use serde::Serialize;
use thiserror::Error;

use crate::resilience::Elapsed;

/// Errors raised by a [`Driver`](super::Driver) or its sessions.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("no reachable server: {0}")]
    Unreachable(String),

    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<Elapsed> for DriverError {
    fn from(e: Elapsed) -> Self {
        DriverError::Timeout(e.to_string())
    }
}

/// Classified cause of a failed acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Connect or server selection exceeded its budget.
    Timeout,
    /// Transport reset mid-handshake.
    ConnectionReset,
    /// Transport closed while writing.
    BrokenPipe,
    /// No reachable server.
    ServerUnreachable,
    /// Breaker tripped; wait out the cooldown.
    CircuitOpen,
    /// Anything else.
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::ConnectionReset => "connection_reset",
            ErrorKind::BrokenPipe => "broken_pipe",
            ErrorKind::ServerUnreachable => "server_unreachable",
            ErrorKind::CircuitOpen => "circuit_open",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// Extra settle time added before the regular backoff sleep.
    pub fn extra_delay(&self) -> Duration {
        match self {
            ErrorKind::ConnectionReset => Duration::from_millis(500),
            ErrorKind::BrokenPipe => Duration::from_millis(1_000),
            ErrorKind::ServerUnreachable | ErrorKind::Timeout | ErrorKind::Unknown => {
                Duration::from_millis(300)
            }
            ErrorKind::CircuitOpen => Duration::ZERO,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a driver failure.
pub fn classify(err: &DriverError) -> ErrorKind {
    match err {
        DriverError::Timeout(_) => ErrorKind::Timeout,
        DriverError::Unreachable(_) => ErrorKind::ServerUnreachable,
        DriverError::Io(e) => match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ErrorKind::Timeout,
            io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => {
                ErrorKind::ConnectionReset
            }
            io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof => ErrorKind::BrokenPipe,
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::NotConnected => ErrorKind::ServerUnreachable,
            _ => ErrorKind::Unknown,
        },
        DriverError::Other(_) => ErrorKind::Unknown,
    }
}

/// Failure returned by [`ConnectionManager::acquire_connection`](super::ConnectionManager::acquire_connection).
///
/// `Clone` so that one in-flight attempt can hand the same failure to every
/// waiter.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct ConnectionError {
    kind: ErrorKind,
    message: String,
    retry_after: Option<Duration>,
}

impl ConnectionError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), retry_after: None }
    }

    pub fn circuit_open(retry_after: Duration) -> Self {
        Self {
            kind: ErrorKind::CircuitOpen,
            message: format!(
                "circuit breaker open after repeated connection failures; retry in {}ms",
                retry_after.as_millis()
            ),
            retry_after: Some(retry_after),
        }
    }

    pub fn from_driver(err: &DriverError) -> Self {
        Self::new(classify(err), err.to_string())
    }

    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Hint for the caller's `Retry-After`, when one applies.
    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }
}
