//! Resilience subsystem: circuit breaking for upstream calls.
//!
//! # Data Flow
//! ```text
//! aggregator
//!     → registry.rs (look up breaker by dependency name)
//!     → breaker.rs (gate check, outcome recording, state machine)
//!     → allowed: call proceeds, outcome reported back
//!     → short-circuited: immediate failure, no network I/O
//! ```
//!
//! # Design Decisions
//! - Breaker state is process-local; no distributed coordination
//! - One registry per process, injected where needed

pub mod breaker;
pub mod registry;

pub use breaker::{BreakerState, CallGuard, CircuitBreaker};
pub use registry::BreakerRegistry;
