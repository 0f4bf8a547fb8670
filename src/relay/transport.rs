//! Outbound HTTP transport.
//!
//! # Responsibilities
//! - Send one outbound request and buffer the response body
//! - Stream request bodies instead of materializing them
//! - Report failures without interpreting them
//!
//! # Design Decisions
//! - The transport is a trait so the gateway and client can be tested
//!   against a fake
//! - No retries, no timeouts: a hung backend hangs the call

use async_trait::async_trait;
use axum::http::StatusCode;
use thiserror::Error;
use url::Url;

use crate::relay::types::{OutboundRequest, RelayResponse};

/// Failures that happen before a complete response is obtained.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The outbound URL could not be parsed.
    #[error("invalid target URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Connection refused, DNS failure, TLS failure.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Failed while streaming the request or reading the response body.
    #[error("body transfer failed: {0}")]
    Body(String),

    /// Any other failure of the underlying client.
    #[error("request failed: {0}")]
    Request(String),

    /// A remote relay reported that it could not reach the backend.
    #[error("upstream unreachable: {0}")]
    Upstream(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            TransportError::Body(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// Capability to perform one HTTP exchange.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<RelayResponse, TransportError>;
}

/// [`HttpTransport`] backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RelayResponse, TransportError> {
        let url = Url::parse(&request.url).map_err(|e| TransportError::InvalidUrl {
            url: request.url.clone(),
            reason: e.to_string(),
        })?;

        let mut builder = self
            .client
            .request(request.method, url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(reqwest::Body::from(body));
        }

        let response = builder.send().await?;
        let status = response.status();
        let status_text = reason_phrase(&response, status);
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(RelayResponse {
            status,
            status_text,
            headers,
            body,
        })
    }
}

/// The backend's own reason phrase when it differs from the canonical one.
fn reason_phrase(response: &reqwest::Response, status: StatusCode) -> String {
    response
        .extensions()
        .get::<hyper::ext::ReasonPhrase>()
        .and_then(|r| std::str::from_utf8(r.as_bytes()).ok())
        .or_else(|| status.canonical_reason())
        .unwrap_or_default()
        .to_string()
}
