//! Header sanitization for the inbound → outbound direction.
//!
//! # Responsibilities
//! - Strip hop-by-hop and framing headers before forwarding
//! - Strip the control header that carries the per-call target
//!
//! # Design Decisions
//! - Matching is case-insensitive (`HeaderName` is always lowercase)
//! - Backend response headers are relayed as received; only the
//!   outbound request is sanitized

use axum::http::{HeaderMap, HeaderName};

/// Header carrying the per-call backend target override.
pub const X_BASE_URL: &str = "x-base-url";

/// Headers that are never forwarded to the backend.
pub const SANITIZED_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

/// Returns true if `name` is in the fixed never-forwarded set.
pub fn is_sanitized(name: &str) -> bool {
    SANITIZED_HEADERS
        .iter()
        .any(|h| h.eq_ignore_ascii_case(name))
}

/// Strips framing headers and the control header from an outbound header set.
#[derive(Debug, Clone)]
pub struct HeaderSanitizer {
    control_header: HeaderName,
}

impl HeaderSanitizer {
    /// Create a sanitizer that also strips `control_header`.
    pub fn new(control_header: HeaderName) -> Self {
        Self { control_header }
    }

    /// The control header this sanitizer removes.
    pub fn control_header(&self) -> &HeaderName {
        &self.control_header
    }

    /// Returns a copy of `headers` without any never-forwarded header.
    ///
    /// Duplicate values of surviving headers are preserved in order.
    pub fn sanitize(&self, headers: &HeaderMap) -> HeaderMap {
        let mut out = HeaderMap::with_capacity(headers.len());
        for (name, value) in headers {
            if name == self.control_header || is_sanitized(name.as_str()) {
                continue;
            }
            out.append(name.clone(), value.clone());
        }
        out
    }
}

impl Default for HeaderSanitizer {
    fn default() -> Self {
        Self::new(HeaderName::from_static(X_BASE_URL))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn inbound() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("connection", HeaderValue::from_static("keep-alive"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("proxy-connection", HeaderValue::from_static("close"));
        headers.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        headers.insert("upgrade", HeaderValue::from_static("websocket"));
        headers.insert("host", HeaderValue::from_static("localhost:3000"));
        headers.insert("content-length", HeaderValue::from_static("42"));
        headers.insert("x-base-url", HeaderValue::from_static("http://10.0.0.2:8080"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.append("accept", HeaderValue::from_static("application/json"));
        headers.append("accept", HeaderValue::from_static("text/plain"));
        headers
    }

    #[test]
    fn test_strips_every_sanitized_header() {
        let out = HeaderSanitizer::default().sanitize(&inbound());

        for name in SANITIZED_HEADERS {
            assert!(out.get(*name).is_none(), "{} should be stripped", name);
        }
        assert!(out.get(X_BASE_URL).is_none());
    }

    #[test]
    fn test_keeps_end_to_end_headers_and_duplicates() {
        let out = HeaderSanitizer::default().sanitize(&inbound());

        assert_eq!(out.get("content-type").unwrap(), "application/json");
        let accept: Vec<_> = out.get_all("accept").iter().collect();
        assert_eq!(accept.len(), 2);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_custom_control_header() {
        let sanitizer = HeaderSanitizer::new(HeaderName::from_static("x-target"));
        let mut headers = HeaderMap::new();
        headers.insert("x-target", HeaderValue::from_static("http://a"));
        headers.insert("x-base-url", HeaderValue::from_static("http://b"));

        let out = sanitizer.sanitize(&headers);
        assert!(out.get("x-target").is_none());
        // Only the configured control header is special.
        assert!(out.get("x-base-url").is_some());
    }

    #[test]
    fn test_is_sanitized_case_insensitive() {
        assert!(is_sanitized("Transfer-Encoding"));
        assert!(is_sanitized("HOST"));
        assert!(!is_sanitized("x-request-id"));
        assert!(!is_sanitized("authorization"));
    }
}
