//! Upstream dependency access.
//!
//! # Data Flow
//! ```text
//! aggregator
//!     → client.rs (GET {base}{path}, bearer token forwarded)
//!     → JSON decode into model records
//!     → Result<records, UpstreamError>
//! ```
//!
//! # Design Decisions
//! - One logical name per dependency; endpoint resolution is config-driven
//! - Every call is timeout-bound; an unresponsive upstream cannot block
//!   the aggregator indefinitely

pub mod client;

pub use client::{Dependency, UpstreamClient, UpstreamError};
