//! Metrics collection and exposition.
//!
//! # Metrics
//! - `store_connection_attempts_total` (counter): connect calls issued
//! - `store_connections_established_total` (counter): successful connects
//! - `store_connection_failures_total` (counter): failures by `kind`
//! - `store_circuit_open` (gauge): 1=open, 0=closed
//! - `store_connection_state` (gauge): 0=disconnected, 1=connecting, 2=connected
//! - `store_acquire_duration_seconds` (histogram): acquisition latency by `outcome`
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus
//! recorder, so library users and tests pay nothing.

use std::net::SocketAddr;
use std::time::Duration;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::connection::{ConnectionState, ErrorKind};

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_connect_try() {
    counter!("store_connection_attempts_total").increment(1);
}

pub fn record_established() {
    counter!("store_connections_established_total").increment(1);
}

pub fn record_failure(kind: ErrorKind) {
    counter!("store_connection_failures_total", "kind" => kind.as_str()).increment(1);
}

pub fn record_circuit_state(open: bool) {
    gauge!("store_circuit_open").set(if open { 1.0 } else { 0.0 });
}

pub fn record_connection_state(state: ConnectionState) {
    let value = match state {
        ConnectionState::Disconnected => 0.0,
        ConnectionState::Connecting => 1.0,
        ConnectionState::Connected => 2.0,
    };
    gauge!("store_connection_state").set(value);
}

/// Record one acquisition; `failure` is `None` on success.
pub fn record_acquire(elapsed: Duration, failure: Option<ErrorKind>) {
    let outcome = failure.map_or("ok", |kind| kind.as_str());
    histogram!("store_acquire_duration_seconds", "outcome" => outcome).record(elapsed.as_secs_f64());
}
