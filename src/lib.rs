//! Resilient feed aggregation service.
//!
//! Fans out to the user directory and post store, joins their results into
//! composite feed entries, and degrades to a static fallback when either
//! dependency fails — gated by a per-dependency circuit breaker.

// Core subsystems
pub mod config;
pub mod feed;
pub mod http;
pub mod model;
pub mod upstream;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::FeedConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
