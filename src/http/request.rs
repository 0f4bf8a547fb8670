//! Inbound request conversion.
//!
//! # Responsibilities
//! - Strip the relay prefix from the raw request path
//! - Keep the query string and every header for the gateway to sanitize
//! - Hand the body over as a stream, never buffered
//!
//! # Design Decisions
//! - Path segments are taken from the raw URI, not percent-decoded, so
//!   the backend sees exactly what the caller sent

use axum::body::{Body, HttpBody};
use axum::http::Request;

use crate::relay::types::{is_read_only, split_path, ProxyRequest, RequestBody};

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Path below `prefix`, or the whole path when it does not start with it.
pub fn strip_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    let base = prefix.trim_end_matches('/');
    match path.strip_prefix(base) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    }
}

/// Convert an axum request received under `prefix` into a [`ProxyRequest`].
pub fn into_proxy_request(request: Request<Body>, prefix: &str) -> ProxyRequest {
    let (parts, body) = request.into_parts();
    let path = split_path(strip_prefix(parts.uri.path(), prefix));
    let empty = body.size_hint().exact() == Some(0);

    let mut proxy = ProxyRequest::new(parts.method, path);
    proxy.headers = parts.headers;
    proxy.query = parts.uri.query().map(str::to_string);
    if !is_read_only(&proxy.method) && !empty {
        proxy.body = Some(RequestBody::from_stream(body.into_data_stream()));
    }
    proxy
}

/// The request ID set by the request-id layer, or `"unknown"`.
pub fn request_id<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}
