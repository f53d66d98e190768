//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define application metrics (requests, latency, recovered errors)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `cinder_requests_total` (counter): requests by method, status, route
//! - `cinder_request_duration_seconds` (histogram): latency distribution
//! - `cinder_recovered_total` (counter): errors and panics turned into pages
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Route label is the qualified route name, never the raw path

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics recorder"),
    }
}

/// Record one finished request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("route", route.to_string()),
    ];
    counter!("cinder_requests_total", &labels).increment(1);
    histogram!("cinder_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

/// Record an error or panic that was turned into an error page.
pub fn record_recovered(kind: &'static str) {
    counter!("cinder_recovered_total", "kind" => kind).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_request("GET", 200, "index", Instant::now());
        record_recovered("not_found");
    }
}
