//! Storefront database connection lifecycle library.

pub mod config;
pub mod connection;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::AppConfig;
pub use connection::{
    ConnectionError, ConnectionHandle, ConnectionManager, ErrorKind, TcpDriver,
};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
