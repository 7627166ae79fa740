//! Configuration validation.
//!
//! Serde handles syntax; this checks value ranges and cross-field
//! constraints. Returns all validation errors, not just the first.

use std::fmt;
use std::net::SocketAddr;
use url::Url;

use crate::config::schema::AppConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let db = &config.database;

    match Url::parse(&db.uri) {
        Ok(url) if url.host_str().map_or(true, str::is_empty) => {
            errors.push(ValidationError::new("database.uri", "missing host"));
        }
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::new("database.uri", e.to_string())),
    }

    let positive = [
        ("database.max_pool_size", u64::from(db.max_pool_size)),
        ("database.connect_timeout_ms", db.connect_timeout_ms),
        ("database.server_selection_timeout_ms", db.server_selection_timeout_ms),
        ("database.socket_timeout_ms", db.socket_timeout_ms),
        ("database.wait_queue_timeout_ms", db.wait_queue_timeout_ms),
        ("database.max_retries", u64::from(db.max_retries)),
        ("database.breaker_threshold", u64::from(db.breaker_threshold)),
        ("database.max_handle_age_ms", db.max_handle_age_ms),
        ("database.probe_timeout_ms", db.probe_timeout_ms),
        ("database.acquire_timeout_ms", db.acquire_timeout_ms),
        ("server.request_timeout_secs", config.server.request_timeout_secs),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }

    if db.backoff_max_ms < db.backoff_base_ms {
        errors.push(ValidationError::new(
            "database.backoff_max_ms",
            format!("must be >= backoff_base_ms ({})", db.backoff_base_ms),
        ));
    }

    if db.probe_timeout_ms >= db.max_handle_age_ms && db.max_handle_age_ms > 0 {
        errors.push(ValidationError::new(
            "database.probe_timeout_ms",
            "must be shorter than max_handle_age_ms",
        ));
    }

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("invalid socket address '{}'", config.server.bind_address),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address '{}'", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
