//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the feed
//! aggregation service. All types derive Serde traits for deserialization
//! from config files, and every section has defaults so a minimal config
//! still boots.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the feed aggregation service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FeedConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream dependency endpoints and call timeout.
    pub upstreams: UpstreamConfig,

    /// Circuit breaker thresholds.
    pub breaker: BreakerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8084").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8084".to_string(),
        }
    }
}

/// Upstream dependency configuration.
///
/// Base URLs stand in for service discovery: each logical dependency name
/// resolves to one configured endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the user directory service.
    pub directory_url: String,

    /// Base URL of the post store service.
    pub posts_url: String,

    /// Per-call timeout in milliseconds. An unresponsive upstream must
    /// never block an aggregation beyond this bound.
    pub request_timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            directory_url: "http://localhost:8081".to_string(),
            posts_url: "http://localhost:8082".to_string(),
            request_timeout_ms: 5_000,
        }
    }
}

impl UpstreamConfig {
    /// Per-call timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Circuit breaker thresholds.
///
/// These are policy knobs, not hardcoded behavior: failure rate over a
/// count-based sliding window trips the breaker, a cool-down gates the
/// half-open trial phase.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Failure-rate percentage (1-100) that trips the breaker once the
    /// sliding window is full.
    pub failure_rate_threshold: u32,

    /// Number of most recent call outcomes considered.
    pub sliding_window_size: usize,

    /// How long the breaker stays open before allowing trial calls, in
    /// milliseconds.
    pub wait_duration_in_open_state_ms: u64,

    /// Number of trial calls permitted while half-open.
    pub permitted_calls_in_half_open_state: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 50,
            sliding_window_size: 10,
            wait_duration_in_open_state_ms: 30_000,
            permitted_calls_in_half_open_state: 3,
        }
    }
}

impl BreakerConfig {
    /// Open-state cool-down as a `Duration`.
    pub fn wait_duration(&self) -> Duration {
        Duration::from_millis(self.wait_duration_in_open_state_ms)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
