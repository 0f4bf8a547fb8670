//! Scripted [`Relay`] for client tests.

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use bytes::Bytes;
use futures_util::TryStreamExt;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::relay::{ProxyRequest, Relay, RelayResponse, RequestBody, TransportError};

/// What the relay saw for one call.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl RecordedRequest {
    pub fn json_body(&self) -> Value {
        serde_json::from_slice(self.body.as_deref().unwrap_or_default()).unwrap()
    }
}

type Handler = Box<dyn Fn(&RecordedRequest) -> Result<RelayResponse, TransportError> + Send + Sync>;

/// Answers by path, or through a handler. Unknown paths get an empty 404.
pub struct ScriptedRelay {
    routes: Mutex<HashMap<String, RelayResponse>>,
    handler: Option<Handler>,
    seen: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedRelay {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            routes: Mutex::new(HashMap::new()),
            handler: None,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn with_handler<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&RecordedRequest) -> Result<RelayResponse, TransportError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            routes: Mutex::new(HashMap::new()),
            handler: Some(Box::new(handler)),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Every call fails as if the backend refused the connection.
    pub fn unreachable() -> Arc<Self> {
        Self::with_handler(|_| Err(TransportError::Connect("connection refused".into())))
    }

    pub fn respond(self: Arc<Self>, path: &str, response: RelayResponse) -> Arc<Self> {
        self.routes.lock().unwrap().insert(path.to_string(), response);
        self
    }

    pub fn json(self: Arc<Self>, path: &str, status: StatusCode, body: Value) -> Arc<Self> {
        let response = RelayResponse::new(status, serde_json::to_vec(&body).unwrap())
            .with_header(axum::http::header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.respond(path, response)
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn last(&self) -> RecordedRequest {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }

    pub fn all(&self) -> Vec<RecordedRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Relay for ScriptedRelay {
    async fn relay(&self, request: ProxyRequest) -> Result<RelayResponse, TransportError> {
        let path = request.joined_path();
        let body = match request.body {
            None => None,
            Some(RequestBody::Buffered(bytes)) => Some(bytes),
            Some(RequestBody::Stream(mut stream)) => {
                let mut collected = Vec::new();
                while let Some(chunk) = stream
                    .try_next()
                    .await
                    .map_err(|e| TransportError::Body(e.to_string()))?
                {
                    collected.extend_from_slice(&chunk);
                }
                Some(Bytes::from(collected))
            }
        };
        let recorded = RecordedRequest {
            method: request.method,
            path: path.clone(),
            headers: request.headers,
            body,
        };
        self.seen.lock().unwrap().push(recorded.clone());

        if let Some(handler) = &self.handler {
            return handler(&recorded);
        }
        let routed = self.routes.lock().unwrap().get(&path).cloned();
        Ok(routed.unwrap_or_else(|| RelayResponse::new(StatusCode::NOT_FOUND, "")))
    }
}
