//! Feed aggregation core.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → aggregator.rs (breaker-gated fan-out to directory + posts)
//!     → join by user id → Vec<FeedEntry>
//!     → on any failure: fallback.rs (static degraded entries)
//! ```
//!
//! # Design Decisions
//! - All dependency failures are caught at this boundary; nothing
//!   upstream-specific leaks past it
//! - Unknown-user is the one honest error: a 404, never a fallback

pub mod aggregator;
pub mod fallback;

pub use aggregator::{FeedAggregator, FeedError};
pub use fallback::FallbackProvider;
