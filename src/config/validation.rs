//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (threshold percentages, window sizes, timeouts)
//! - Check addresses and upstream URLs actually parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: FeedConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use url::Url;

use crate::config::schema::FeedConfig;

/// A single semantic configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn err(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Validate a loaded configuration, collecting every problem found.
pub fn validate_config(config: &FeedConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(err(
            "listener.bind_address",
            format!("not a valid socket address: {}", config.listener.bind_address),
        ));
    }

    for (field, value) in [
        ("upstreams.directory_url", &config.upstreams.directory_url),
        ("upstreams.posts_url", &config.upstreams.posts_url),
    ] {
        match Url::parse(value) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => errors.push(err(field, format!("unsupported scheme: {}", url.scheme()))),
            Err(e) => errors.push(err(field, format!("not a valid URL: {}", e))),
        }
    }

    if config.upstreams.request_timeout_ms == 0 {
        errors.push(err("upstreams.request_timeout_ms", "must be greater than 0"));
    }

    let breaker = &config.breaker;
    if breaker.failure_rate_threshold == 0 || breaker.failure_rate_threshold > 100 {
        errors.push(err(
            "breaker.failure_rate_threshold",
            format!("must be a percentage in 1-100, got {}", breaker.failure_rate_threshold),
        ));
    }
    if breaker.sliding_window_size == 0 {
        errors.push(err("breaker.sliding_window_size", "must be at least 1"));
    }
    if breaker.permitted_calls_in_half_open_state == 0 {
        errors.push(err(
            "breaker.permitted_calls_in_half_open_state",
            "must be at least 1",
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(err(
            "observability.metrics_address",
            format!(
                "not a valid socket address: {}",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
