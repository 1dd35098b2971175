//! Metrics collection and exposition.
//!
//! # Metrics
//! - `webrun_requests_total` (counter): requests by routing action
//! - `webrun_spawn_failures_total` (counter): commands that failed to start
//! - `webrun_dispatch_duration_seconds` (histogram): time from spawn to end of
//!   output, by outcome (`exhausted`, `disconnected`, `timed_out`)
//! - `webrun_routes` (gauge): routes in the current table
//!
//! Without an installed exporter every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter, serving `/metrics` on `addr`.
///
/// Must be called within a Tokio runtime. Failure is logged, not fatal.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(action: &'static str) {
    ::metrics::counter!("webrun_requests_total", "action" => action).increment(1);
}

pub fn record_spawn_failure() {
    ::metrics::counter!("webrun_spawn_failures_total").increment(1);
}

pub fn record_dispatch(outcome: &'static str, started: Instant) {
    ::metrics::histogram!("webrun_dispatch_duration_seconds", "outcome" => outcome)
        .record(started.elapsed().as_secs_f64());
}

pub fn set_route_count(count: usize) {
    ::metrics::gauge!("webrun_routes").set(count as f64);
}
