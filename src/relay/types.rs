//! Request and response shapes passed through the relay.

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};
use std::fmt;
use std::pin::Pin;

/// Boxed error carried by streaming bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A request body that is produced while it is being sent.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>;

/// Returns true for the verbs the relay forwards.
pub fn is_relay_method(method: &Method) -> bool {
    [
        Method::GET,
        Method::HEAD,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
    ]
    .contains(method)
}

/// Returns true for methods whose requests never carry a body.
pub fn is_read_only(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

/// Body of a relayed request.
pub enum RequestBody {
    /// Fully materialized bytes.
    Buffered(Bytes),
    /// Live stream, forwarded chunk by chunk.
    Stream(BodyStream),
}

impl RequestBody {
    /// Wrap any fallible byte stream.
    pub fn from_stream<S, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        Self::Stream(Box::pin(stream.map_err(|e| -> BoxError { e.into() })))
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffered(bytes) => f.debug_tuple("Buffered").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        Self::Buffered(bytes)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Buffered(Bytes::from(bytes))
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        Self::Buffered(Bytes::from(text))
    }
}

impl From<RequestBody> for reqwest::Body {
    fn from(body: RequestBody) -> Self {
        match body {
            RequestBody::Buffered(bytes) => reqwest::Body::from(bytes),
            RequestBody::Stream(stream) => reqwest::Body::wrap_stream(stream),
        }
    }
}

/// An inbound request addressed to the relay.
#[derive(Debug)]
pub struct ProxyRequest {
    pub method: Method,
    /// Path below the relay prefix, split on `/`. Empty means the target root.
    pub path: Vec<String>,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
}

impl ProxyRequest {
    pub fn new(method: Method, path: Vec<String>) -> Self {
        Self {
            method,
            path,
            query: None,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Build a request from a slash-separated path such as `/v1/search`.
    pub fn from_path(method: Method, path: &str) -> Self {
        Self::new(method, split_path(path))
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// The path segments joined back into `/a/b`, or an empty string.
    pub fn joined_path(&self) -> String {
        if self.path.is_empty() {
            String::new()
        } else {
            format!("/{}", self.path.join("/"))
        }
    }
}

/// Split a path below the relay prefix into segments.
///
/// A single leading `/` is dropped; an empty remainder yields no segments.
pub fn split_path(path: &str) -> Vec<String> {
    let rest = path.strip_prefix('/').unwrap_or(path);
    if rest.is_empty() {
        Vec::new()
    } else {
        rest.split('/').map(str::to_string).collect()
    }
}

/// A request ready to go out on the wire.
#[derive(Debug)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
}

/// A backend response with its body read into memory.
#[derive(Debug, Clone)]
pub struct RelayResponse {
    pub status: StatusCode,
    /// Reason phrase as sent by the backend, or the canonical one.
    pub status_text: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RelayResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = status_text.into();
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path() {
        assert!(split_path("").is_empty());
        assert!(split_path("/").is_empty());
        assert_eq!(split_path("/v1/search"), vec!["v1", "search"]);
        assert_eq!(split_path("v1/stats"), vec!["v1", "stats"]);
        assert_eq!(split_path("/a//b/"), vec!["a", "", "b", ""]);
    }

    #[test]
    fn test_joined_path() {
        assert_eq!(ProxyRequest::new(Method::GET, vec![]).joined_path(), "");
        assert_eq!(
            ProxyRequest::from_path(Method::POST, "/v1/ingest").joined_path(),
            "/v1/ingest"
        );
    }

    #[test]
    fn test_read_only_methods() {
        assert!(is_read_only(&Method::GET));
        assert!(is_read_only(&Method::HEAD));
        assert!(!is_read_only(&Method::POST));
        assert!(!is_read_only(&Method::DELETE));
    }

    #[test]
    fn test_relay_methods() {
        assert!(is_relay_method(&Method::PATCH));
        assert!(!is_relay_method(&Method::OPTIONS));
        assert!(!is_relay_method(&Method::TRACE));
    }

    #[test]
    fn test_relay_response_defaults_status_text() {
        let response = RelayResponse::new(StatusCode::NOT_FOUND, "missing");
        assert_eq!(response.status_text, "Not Found");
        assert!(!response.is_success());
    }
}
