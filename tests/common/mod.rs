//! Shared utilities for integration testing.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{HeaderMap, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use bytes::Bytes;
use note_relay::config::RelaySettings;
use note_relay::lifecycle::Shutdown;
use note_relay::RelayServer;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// One request as the mock backend received it.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Captured {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

#[derive(Clone, Default)]
struct BackendState {
    responses: Arc<Mutex<HashMap<String, (u16, String)>>>,
    captured: Arc<Mutex<Vec<Captured>>>,
}

/// A programmable backend listening on an ephemeral port.
pub struct MockBackend {
    pub addr: SocketAddr,
    state: BackendState,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Answer requests for `path` with `status` and a JSON `body`.
    pub fn respond(&self, path: &str, status: u16, body: &str) {
        self.state
            .responses
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
    }

    pub fn captured(&self) -> Vec<Captured> {
        self.state.captured.lock().unwrap().clone()
    }
}

async fn backend_handler(State(state): State<BackendState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, usize::MAX).await.unwrap_or_default();
    let path = parts.uri.path().to_string();
    state.captured.lock().unwrap().push(Captured {
        method: parts.method,
        path: path.clone(),
        query: parts.uri.query().map(str::to_string),
        headers: parts.headers,
        body,
    });

    let scripted = state.responses.lock().unwrap().get(&path).cloned();
    match scripted {
        Some((status, body)) => (
            StatusCode::from_u16(status).unwrap(),
            [("content-type", "application/json")],
            body,
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Start a mock backend. Unscripted paths answer an empty 404.
pub async fn start_backend() -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = BackendState::default();
    let app = Router::new().fallback(backend_handler).with_state(state.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    MockBackend { addr, state }
}

/// A relay server running on an ephemeral port.
pub struct RunningRelay {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

impl RunningRelay {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Start the relay server with `default_target` as its fallback backend.
pub async fn start_relay(default_target: &str) -> RunningRelay {
    start_relay_with(RelaySettings {
        default_target: default_target.to_string(),
        ..RelaySettings::default()
    })
    .await
}

/// Start the relay server with explicit settings.
pub async fn start_relay_with(settings: RelaySettings) -> RunningRelay {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = RelayServer::new(&settings).unwrap();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));
    RunningRelay { addr, shutdown, handle }
}

/// An address nothing is listening on.
pub fn unused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
