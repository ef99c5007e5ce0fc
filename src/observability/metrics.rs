//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_requests_total` (counter): requests by route and status
//! - `edge_request_duration_seconds` (histogram): latency by route
//! - `edge_relay_events_total` (counter): collector hits by kind and outcome
//! - `edge_admission_blocked_total` (counter): refused relay requests by reason
//!
//! Recording is a no-op until a recorder is installed, so tests need no setup.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "edge_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("edge_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_relay(kind: &'static str, outcome: &'static str) {
    metrics::counter!("edge_relay_events_total", "kind" => kind, "outcome" => outcome).increment(1);
}

pub fn record_blocked(reason: &'static str) {
    metrics::counter!("edge_admission_blocked_total", "reason" => reason).increment(1);
}
