//! Outbound response conversion.
//!
//! # Responsibilities
//! - Relay status, reason phrase, headers and body exactly as received
//! - Turn transport failures into a tagged `502 Bad Gateway`

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use hyper::ext::ReasonPhrase;

use crate::relay::remote::{UPSTREAM_UNREACHABLE, X_RELAY_ERROR};
use crate::relay::{RelayResponse, TransportError};

/// Build the HTTP response for a relayed backend answer.
pub fn into_response(relayed: RelayResponse) -> Response {
    let RelayResponse {
        status,
        status_text,
        headers,
        body,
    } = relayed;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;

    // Only a non-canonical reason needs carrying.
    if !status_text.is_empty() && status.canonical_reason() != Some(status_text.as_str()) {
        match ReasonPhrase::try_from(status_text) {
            Ok(reason) => {
                response.extensions_mut().insert(reason);
            }
            Err(e) => tracing::debug!(status = status.as_u16(), error = %e, "Dropping invalid reason phrase"),
        }
    }
    response
}

/// The relay's own answer when the backend could not be reached.
pub fn upstream_unreachable(error: &TransportError) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        [(
            HeaderName::from_static(X_RELAY_ERROR),
            HeaderValue::from_static(UPSTREAM_UNREACHABLE),
        )],
        format!("Upstream request failed: {}", error),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::CONTENT_LENGTH;

    #[tokio::test]
    async fn test_relayed_unchanged() {
        let relayed = RelayResponse::new(StatusCode::CREATED, "{\"ok\":true}")
            .with_header(CONTENT_LENGTH, HeaderValue::from_static("11"))
            .with_header(HeaderName::from_static("set-cookie"), HeaderValue::from_static("a=1"))
            .with_header(HeaderName::from_static("set-cookie"), HeaderValue::from_static("b=2"));

        let response = into_response(relayed);
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers().get(CONTENT_LENGTH).unwrap(), "11");
        assert_eq!(response.headers().get_all("set-cookie").iter().count(), 2);
        assert!(response.extensions().get::<ReasonPhrase>().is_none());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"{\"ok\":true}");
    }

    #[test]
    fn test_custom_reason_phrase_kept() {
        let relayed = RelayResponse::new(StatusCode::BAD_REQUEST, "").with_status_text("Query Too Vague");
        let response = into_response(relayed);
        let reason = response.extensions().get::<ReasonPhrase>().unwrap();
        assert_eq!(reason.as_bytes(), b"Query Too Vague");
    }

    #[test]
    fn test_upstream_unreachable_is_tagged() {
        let response = upstream_unreachable(&TransportError::Connect("refused".into()));
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(response.headers().get(X_RELAY_ERROR).unwrap(), UPSTREAM_UNREACHABLE);
    }
}
