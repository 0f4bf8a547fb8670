//! Same-origin forwarding gateway.
//!
//! # Data Flow
//! ```text
//! ProxyRequest
//!     → target from control header, else default target
//!     → target + "/" + path segments (+ "?" + query)
//!     → headers.rs (strip framing + control header)
//!     → body dropped for GET/HEAD, streamed otherwise
//!     → HttpTransport
//!     → RelayResponse (status, status text, headers unchanged)
//! ```
//!
//! Transport failures are returned to the caller as-is.

use async_trait::async_trait;
use axum::http::HeaderName;
use std::sync::Arc;

use crate::relay::headers::HeaderSanitizer;
use crate::relay::transport::{HttpTransport, TransportError};
use crate::relay::types::{is_read_only, OutboundRequest, ProxyRequest, RelayResponse};
use crate::relay::Relay;
use crate::target::{select_target, DEFAULT_TARGET};

/// Stateless relay from an inbound request to the resolved backend.
#[derive(Clone)]
pub struct ProxyGateway {
    transport: Arc<dyn HttpTransport>,
    sanitizer: HeaderSanitizer,
    default_target: String,
}

impl ProxyGateway {
    /// Create a gateway using the default control header and target.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            sanitizer: HeaderSanitizer::default(),
            default_target: DEFAULT_TARGET.to_string(),
        }
    }

    pub fn with_default_target(mut self, target: impl Into<String>) -> Self {
        self.default_target = target.into();
        self
    }

    pub fn with_control_header(mut self, name: HeaderName) -> Self {
        self.sanitizer = HeaderSanitizer::new(name);
        self
    }

    pub fn control_header(&self) -> &HeaderName {
        self.sanitizer.control_header()
    }

    /// Outbound URL for `request`.
    pub fn target_url(&self, request: &ProxyRequest) -> String {
        let requested = request
            .headers
            .get(self.sanitizer.control_header())
            .and_then(|v| v.to_str().ok());
        let target = select_target(requested, &self.default_target);

        let mut url = format!("{}{}", target, request.joined_path());
        if let Some(query) = request.query.as_deref().filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        url
    }

    /// Forward `request` and relay the backend's response.
    pub async fn forward(&self, request: ProxyRequest) -> Result<RelayResponse, TransportError> {
        let url = self.target_url(&request);
        let headers = self.sanitizer.sanitize(&request.headers);
        let body = if is_read_only(&request.method) {
            None
        } else {
            request.body
        };

        tracing::debug!(
            method = %request.method,
            url = %url,
            streaming = body.as_ref().is_some_and(|b| b.is_stream()),
            "Forwarding request"
        );

        let response = self
            .transport
            .send(OutboundRequest {
                method: request.method.clone(),
                url: url.clone(),
                headers,
                body,
            })
            .await
            .inspect_err(|e| {
                tracing::warn!(method = %request.method, url = %url, error = %e, "Backend unreachable");
            })?;

        tracing::debug!(
            method = %request.method,
            url = %url,
            status = response.status.as_u16(),
            bytes = response.body.len(),
            "Backend responded"
        );
        Ok(response)
    }
}

impl std::fmt::Debug for ProxyGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyGateway")
            .field("control_header", self.sanitizer.control_header())
            .field("default_target", &self.default_target)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Relay for ProxyGateway {
    async fn relay(&self, request: ProxyRequest) -> Result<RelayResponse, TransportError> {
        self.forward(request).await
    }
}
