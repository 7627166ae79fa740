//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every section defaults, so an empty file is a valid configuration.

use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::resilience::BackoffPolicy;

/// Root configuration for the storefront database service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerConfig,

    /// Database connection lifecycle settings.
    pub database: DatabaseConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,

    /// Exact paths that never touch the database.
    pub skip_paths: Vec<String>,

    /// Path prefixes that never touch the database.
    pub skip_prefixes: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
            request_timeout_secs: 30,
            skip_paths: vec![
                "/api".to_string(),
                "/api/health".to_string(),
                "/api/db-health".to_string(),
            ],
            skip_prefixes: vec!["/uploads/".to_string()],
        }
    }
}

/// Connection lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URI, credentials included.
    pub uri: String,

    /// Maximum concurrently open sessions to the database.
    pub max_pool_size: u32,

    /// Budget for a single connect call, in milliseconds.
    pub connect_timeout_ms: u64,

    /// Budget for resolving a reachable server, in milliseconds.
    pub server_selection_timeout_ms: u64,

    /// Socket-level operation budget (graceful close), in milliseconds.
    pub socket_timeout_ms: u64,

    /// How long a connect may wait for a free pool slot, in milliseconds.
    pub wait_queue_timeout_ms: u64,

    /// Establishment tries per attempt.
    pub max_retries: u32,

    /// Consecutive failures before the breaker opens.
    pub breaker_threshold: u32,

    /// How long the breaker stays open, in milliseconds.
    pub breaker_cooldown_ms: u64,

    /// Handles older than this are re-established, in milliseconds.
    pub max_handle_age_ms: u64,

    /// Budget for the liveness probe, in milliseconds.
    pub probe_timeout_ms: u64,

    /// Base delay for exponential backoff in milliseconds.
    pub backoff_base_ms: u64,

    /// Cap on the exponential part of the backoff in milliseconds.
    pub backoff_max_ms: u64,

    /// Upper bound of the random jitter added to each backoff, in milliseconds.
    pub jitter_max_ms: u64,

    /// Overall deadline for one acquisition from the HTTP layer, in milliseconds.
    pub acquire_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017/sticker-shop".to_string(),
            max_pool_size: 1,
            connect_timeout_ms: 2_500,
            server_selection_timeout_ms: 2_500,
            socket_timeout_ms: 10_000,
            wait_queue_timeout_ms: 2_000,
            max_retries: 5,
            breaker_threshold: 3,
            breaker_cooldown_ms: 30_000,
            max_handle_age_ms: 30_000,
            probe_timeout_ms: 1_000,
            backoff_base_ms: 500,
            backoff_max_ms: 8_000,
            jitter_max_ms: 100,
            acquire_timeout_ms: 5_000,
        }
    }
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn server_selection_timeout(&self) -> Duration {
        Duration::from_millis(self.server_selection_timeout_ms)
    }

    pub fn socket_timeout(&self) -> Duration {
        Duration::from_millis(self.socket_timeout_ms)
    }

    pub fn wait_queue_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_queue_timeout_ms)
    }

    pub fn breaker_cooldown(&self) -> Duration {
        Duration::from_millis(self.breaker_cooldown_ms)
    }

    pub fn max_handle_age(&self) -> Duration {
        Duration::from_millis(self.max_handle_age_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy {
            base: Duration::from_millis(self.backoff_base_ms),
            max: Duration::from_millis(self.backoff_max_ms),
            jitter_max: Duration::from_millis(self.jitter_max_ms),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty for development, JSON for production.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.database, DatabaseConfig::default());
        assert_eq!(config.server.bind_address, "0.0.0.0:5000");
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [database]
            uri = "mongodb://db.internal:27018/shop"
            max_retries = 3

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.uri, "mongodb://db.internal:27018/shop");
        assert_eq!(config.database.max_retries, 3);
        assert_eq!(config.database.breaker_threshold, 3);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn duration_accessors() {
        let db = DatabaseConfig::default();
        assert_eq!(db.breaker_cooldown(), Duration::from_secs(30));
        assert_eq!(db.backoff().base, Duration::from_millis(500));
        assert_eq!(db.backoff().jitter_max, Duration::from_millis(100));
    }
}
