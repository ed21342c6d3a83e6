//! HTTP surface of the service.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → request.rs (ensure x-request-id)
//!     → server.rs handlers
//!     → aggregator, or fallback on failure
//!     → JSON response
//! ```

pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
