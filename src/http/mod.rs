//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace layer)
//!     → request.rs (strip prefix, stream body into a ProxyRequest)
//!     → ProxyGateway
//!     → response.rs (relay status, reason, headers, body; or tagged 502)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, RelayServer};
