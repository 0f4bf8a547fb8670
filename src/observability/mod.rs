//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! gateway, client, server
//!     → tracing events with structured fields
//!     → logging.rs subscriber (pretty or JSON on stdout)
//!
//! HTTP access logs:
//!     → tower_http TraceLayer spans carrying x-request-id
//! ```

pub mod logging;

pub use logging::{init_logging, init_with_filter, DEFAULT_FILTER};
