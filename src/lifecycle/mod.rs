//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build breakers/client/aggregator → Serve
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C → broadcast → stop accepting → drain in-flight requests
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
