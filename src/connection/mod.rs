//! Database connection lifecycle subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP guard / collaborator
//!     → manager.rs (breaker check, freshness + probe, single-flight attempt)
//!     → driver.rs (Driver::connect, Session::ping / close)
//!     → tcp.rs (concrete TCP transport with pool-size cap)
//!
//! Failures:
//!     driver error → error.rs (classify into ErrorKind) → ConnectionError
//! ```
//!
//! # Design Decisions
//! - One shared handle per process; callers never construct or close it
//! - Concurrent requests join one in-flight attempt instead of racing
//! - State changes go through the explicit transition function in state.rs

pub mod driver;
pub mod error;
pub mod handle;
pub mod manager;
pub mod state;
pub mod tcp;

pub use driver::{ConnectOptions, Driver, Session};
pub use error::{classify, ConnectionError, DriverError, ErrorKind};
pub use handle::{ConnectionHandle, HandleId};
pub use manager::{redact_uri, ConnectionManager};
pub use state::{ConnectionState, Event, ManagerStatus};
pub use tcp::{TcpDriver, TcpSession};
