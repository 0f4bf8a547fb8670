//! Relay gateway and typed client for a note-indexing backend.

pub mod client;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;
pub mod target;

pub use client::{ApiClient, ApiError, UploadCoordinator};
pub use config::RelayConfig;
pub use http::RelayServer;
pub use lifecycle::Shutdown;
pub use relay::{ProxyGateway, RemoteRelay};
pub use target::TargetResolver;
