//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router for the relay prefix
//! - Wire up middleware (request ID, tracing)
//! - Reject methods the relay does not forward
//! - Hand every request to the [`ProxyGateway`]
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    extract::State,
    http::{header::ALLOW, HeaderName, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::RelaySettings;
use crate::http::request::{into_proxy_request, request_id, X_REQUEST_ID};
use crate::http::response::{into_response, upstream_unreachable};
use crate::lifecycle::shutdown;
use crate::relay::types::is_relay_method;
use crate::relay::{HttpTransport, ProxyGateway, ReqwestTransport};

const ALLOWED_METHODS: &str = "GET, HEAD, POST, PUT, PATCH, DELETE";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<ProxyGateway>,
    pub prefix: Arc<str>,
}

/// HTTP server exposing the relay.
pub struct RelayServer {
    router: Router,
    prefix: String,
}

impl RelayServer {
    /// Build a server that forwards with reqwest.
    pub fn new(settings: &RelaySettings) -> Result<Self, axum::http::header::InvalidHeaderName> {
        Self::with_transport(settings, Arc::new(ReqwestTransport::new()))
    }

    /// Build a server on top of an arbitrary transport.
    pub fn with_transport(
        settings: &RelaySettings,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, axum::http::header::InvalidHeaderName> {
        let control_header = HeaderName::from_bytes(settings.control_header.as_bytes())?;
        let gateway = ProxyGateway::new(transport)
            .with_control_header(control_header)
            .with_default_target(settings.default_target.clone());
        Ok(Self::with_gateway(gateway, &settings.path_prefix))
    }

    pub fn with_gateway(gateway: ProxyGateway, prefix: &str) -> Self {
        let state = AppState {
            gateway: Arc::new(gateway),
            prefix: Arc::from(prefix),
        };
        Self {
            router: Self::build_router(prefix, state),
            prefix: prefix.to_string(),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(prefix: &str, state: AppState) -> Router {
        let base = prefix.trim_end_matches('/');
        let mut router = Router::new()
            .route(if base.is_empty() { "/" } else { base }, any(relay_handler))
            .route(&format!("{}/{{*path}}", base), any(relay_handler));
        if !base.is_empty() {
            router = router.route(&format!("{}/", base), any(relay_handler));
        }

        let x_request_id = HeaderName::from_static(X_REQUEST_ID);
        router.with_state(state).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "relay",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id(request),
                    )
                }))
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
    }

    /// The router, for serving elsewhere or driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown_rx` fires.
    pub async fn run(self, listener: TcpListener, shutdown_rx: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            prefix = %self.prefix,
            "Relay server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("Relay server stopped");
        Ok(())
    }
}

/// Forward one request to its backend.
async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = request_id(&request);
    let method = request.method().clone();

    if !is_relay_method(&method) {
        tracing::debug!(request_id = %request_id, method = %method, "Method not relayed");
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(ALLOW, HeaderValue::from_static(ALLOWED_METHODS))],
            "Method not allowed",
        )
            .into_response();
    }

    let proxy_request = into_proxy_request(request, &state.prefix);
    let path = proxy_request.joined_path();
    match state.gateway.forward(proxy_request).await {
        Ok(relayed) => {
            tracing::debug!(
                request_id = %request_id,
                method = %method,
                path = %path,
                status = relayed.status.as_u16(),
                "Relayed"
            );
            into_response(relayed)
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, method = %method, path = %path, error = %e, "Upstream error");
            upstream_unreachable(&e)
        }
    }
}
