//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Request
//!     → server.rs (Axum setup, trace + timeout layers)
//!     → guard.rs (skip health/static paths, otherwise acquire the database
//!                 connection within the deadline)
//!         → failure: response.rs (503/500 JSON + Retry-After)
//!         → success: handle attached as DbConnection, route runs
//! ```

pub mod guard;
pub mod response;
pub mod server;

pub use guard::{db_guard, DbConnection};
pub use response::{status_for, ErrorResponse};
pub use server::{AppState, HttpServer};
