//! Connection state machine.
//!
//! # States
//! - Disconnected: no usable handle
//! - Connecting: one establishment attempt in flight
//! - Connected: handle stored, subject to age and probe checks
//!
//! # State Transitions
//! ```text
//! Disconnected → Connecting: AttemptStarted
//! Connecting   → Connected:  Established
//! Connecting   → Disconnected: AttemptFailed
//! Connected    → Disconnected: Invalidated (stale, probe failed, transport error)
//! any          → Disconnected: Shutdown
//! ```
//! Any other (state, event) pair leaves the state unchanged.

use std::fmt;
use std::time::Duration;
use serde::Serialize;

use crate::connection::handle::HandleId;
use crate::resilience::BreakerPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Inputs driving [`ConnectionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    AttemptStarted,
    Established,
    AttemptFailed,
    Invalidated,
    Shutdown,
}

impl ConnectionState {
    /// Transition function.
    pub fn on(self, event: Event) -> ConnectionState {
        use ConnectionState::*;

        match (self, event) {
            (_, Event::Shutdown) => Disconnected,
            (Disconnected, Event::AttemptStarted) => Connecting,
            (Connecting, Event::Established) => Connected,
            (Connecting, Event::AttemptFailed) => Disconnected,
            (Connected, Event::Invalidated) => Disconnected,
            (state, _) => state,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        f.write_str(s)
    }
}

/// Point-in-time view of the manager for health endpoints and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerStatus {
    pub state: ConnectionState,
    pub breaker: BreakerPhase,
    pub consecutive_failures: u32,
    pub attempt_in_flight: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle_age_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
}

impl ManagerStatus {
    pub(crate) fn handle_fields(id: Option<HandleId>, age: Option<Duration>) -> (Option<u64>, Option<u64>) {
        (id.map(|id| id.as_u64()), age.map(|a| a.as_millis() as u64))
    }
}
