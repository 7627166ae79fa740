//! Database driver contract.
//!
//! The manager never talks to the network itself; it drives an
//! implementation of [`Driver`] and holds the [`Session`] it returns.

use std::any::Any;
use std::fmt::Debug;
use std::time::Duration;
use async_trait::async_trait;

use crate::config::DatabaseConfig;
use crate::connection::error::DriverError;

/// Options passed to every `connect` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub max_pool_size: u32,
    pub connect_timeout: Duration,
    pub server_selection_timeout: Duration,
    pub socket_timeout: Duration,
    pub wait_queue_timeout: Duration,
}

impl From<&DatabaseConfig> for ConnectOptions {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_pool_size: config.max_pool_size,
            connect_timeout: config.connect_timeout(),
            server_selection_timeout: config.server_selection_timeout(),
            socket_timeout: config.socket_timeout(),
            wait_queue_timeout: config.wait_queue_timeout(),
        }
    }
}

/// Establishes sessions with the database.
#[async_trait]
pub trait Driver: Send + Sync + Debug + 'static {
    /// Open a new session to `uri`.
    async fn connect(&self, uri: &str, options: &ConnectOptions) -> Result<Box<dyn Session>, DriverError>;
}

/// A live session returned by a [`Driver`].
#[async_trait]
pub trait Session: Send + Sync + Debug + 'static {
    /// Minimal round trip confirming the session is usable.
    async fn ping(&self, timeout: Duration) -> Result<(), DriverError>;

    /// Tear the session down. Must be safe to call more than once.
    async fn close(&self) -> Result<(), DriverError>;

    /// Downcast hook for collaborators that know the concrete driver.
    fn as_any(&self) -> &dyn Any;
}
