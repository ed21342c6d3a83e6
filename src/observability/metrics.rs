//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define service metrics (requests, fallbacks, upstream outcomes,
//!   breaker states)
//! - Expose a Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `feed_requests_total` (counter): requests by endpoint and outcome
//! - `feed_fallback_total` (counter): degraded responses served
//! - `upstream_calls_total` (counter): calls by dependency and outcome
//! - `breaker_state` (gauge): 0=closed, 1=open, 2=half_open per dependency
//!
//! # Design Decisions
//! - Facade functions so call sites never touch label plumbing
//! - Recording is a no-op until the exporter is installed, so unit tests
//!   stay free of metrics setup

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

use crate::resilience::BreakerState;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one handled feed request.
pub fn record_feed_request(endpoint: &'static str, outcome: &'static str) {
    counter!("feed_requests_total", "endpoint" => endpoint, "outcome" => outcome).increment(1);
}

/// Record one degraded response served.
pub fn record_fallback() {
    counter!("feed_fallback_total").increment(1);
}

/// Record the outcome of one upstream call (or its suppression).
pub fn record_upstream_call(dependency: &'static str, outcome: &'static str) {
    counter!("upstream_calls_total", "dependency" => dependency, "outcome" => outcome)
        .increment(1);
}

/// Record a breaker's current state.
pub fn record_breaker_state(dependency: &'static str, state: BreakerState) {
    let value = match state {
        BreakerState::Closed => 0.0,
        BreakerState::Open => 1.0,
        BreakerState::HalfOpen => 2.0,
    };
    gauge!("breaker_state", "dependency" => dependency).set(value);
}
