//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_origin_decisions_total` (counter): origin checks by outcome
//! - `gateway_normalized_errors_total` (counter): error responses by code
//! - `gateway_connect_attempts_total` (counter): database attempts by result
//!
//! Recording is a no-op until a recorder is installed, so tests and
//! metrics-disabled deployments pay nothing.

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_origin_decision(allowed: bool) {
    let outcome = if allowed { "allowed" } else { "denied" };
    counter!("gateway_origin_decisions_total", "outcome" => outcome).increment(1);
}

pub fn record_normalized_error(code: &'static str) {
    counter!("gateway_normalized_errors_total", "code" => code).increment(1);
}

pub fn record_connect_attempt(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("gateway_connect_attempts_total", "result" => result).increment(1);
}
