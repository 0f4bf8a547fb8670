//! Relay subsystem.
//!
//! # Data Flow
//! ```text
//! ApiClient
//!     → Relay (in-process ProxyGateway, or RemoteRelay → relay server)
//!     → gateway.rs (resolve target, sanitize, stream body)
//!     → transport.rs (HttpTransport: reqwest in production)
//!     → backend
//! ```
//!
//! # Design Decisions
//! - The gateway is stateless per call: no caching, no retries
//! - Transport failures are never interpreted here; the client
//!   classifies them
//! - Only the outbound request is sanitized

pub mod gateway;
pub mod headers;
pub mod remote;
pub mod transport;
pub mod types;

use async_trait::async_trait;

pub use gateway::ProxyGateway;
pub use headers::{HeaderSanitizer, SANITIZED_HEADERS, X_BASE_URL};
pub use remote::RemoteRelay;
pub use transport::{HttpTransport, ReqwestTransport, TransportError};
pub use types::{ProxyRequest, RelayResponse, RequestBody};

/// Something that carries a [`ProxyRequest`] to the backend.
#[async_trait]
pub trait Relay: Send + Sync {
    async fn relay(&self, request: ProxyRequest) -> Result<RelayResponse, TransportError>;
}
