//! Client side of a relay server reachable over HTTP.

use async_trait::async_trait;
use axum::http::StatusCode;
use std::sync::Arc;

use crate::relay::transport::{HttpTransport, ReqwestTransport, TransportError};
use crate::relay::types::{is_read_only, OutboundRequest, ProxyRequest, RelayResponse};
use crate::relay::Relay;
use crate::target::normalize_target;

/// Set by the relay server on responses it produced because the backend
/// could not be reached.
pub const X_RELAY_ERROR: &str = "x-relay-error";

/// Value of [`X_RELAY_ERROR`] for transport failures.
pub const UPSTREAM_UNREACHABLE: &str = "upstream-unreachable";

/// Sends relay requests to `{relay_url}{path_prefix}/...`.
///
/// The control header is left in place: the relay server strips it.
#[derive(Clone)]
pub struct RemoteRelay {
    transport: Arc<dyn HttpTransport>,
    endpoint: String,
}

impl RemoteRelay {
    pub fn new(relay_url: &str, path_prefix: &str) -> Self {
        Self::with_transport(Arc::new(ReqwestTransport::new()), relay_url, path_prefix)
    }

    pub fn with_transport(transport: Arc<dyn HttpTransport>, relay_url: &str, path_prefix: &str) -> Self {
        let endpoint = format!(
            "{}/{}",
            normalize_target(relay_url.trim()),
            path_prefix.trim_matches('/')
        );
        Self {
            transport,
            endpoint: normalize_target(&endpoint),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl std::fmt::Debug for RemoteRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteRelay")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Relay for RemoteRelay {
    async fn relay(&self, request: ProxyRequest) -> Result<RelayResponse, TransportError> {
        let mut url = format!("{}{}", self.endpoint, request.joined_path());
        if let Some(query) = request.query.as_deref().filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        let body = if is_read_only(&request.method) {
            None
        } else {
            request.body
        };

        let response = self
            .transport
            .send(OutboundRequest {
                method: request.method,
                url,
                headers: request.headers,
                body,
            })
            .await?;

        // The relay server turns its own transport failures into a tagged
        // 502; surface those as transport failures again.
        let tagged = response
            .headers
            .get(X_RELAY_ERROR)
            .is_some_and(|v| v == UPSTREAM_UNREACHABLE);
        if response.status == StatusCode::BAD_GATEWAY && tagged {
            return Err(TransportError::Upstream(
                String::from_utf8_lossy(&response.body).into_owned(),
            ));
        }
        Ok(response)
    }
}
