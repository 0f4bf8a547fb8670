//! Error model for backend calls.
//!
//! Every failure of an [`ApiClient`](crate::client::ApiClient) call is an
//! [`ApiError`]. The `code` field carries one of:
//! - [`NETWORK_ERROR`]: no response was obtained at all
//! - [`HTTP_ERROR`]: non-2xx response without a well-formed error payload
//! - any code the backend declared in its error payload, verbatim

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::relay::RelayResponse;

/// The relay call never produced a response.
pub const NETWORK_ERROR: &str = "NETWORK_ERROR";

/// Non-2xx response whose body is not an error payload.
pub const HTTP_ERROR: &str = "HTTP_ERROR";

/// Codes the backend is known to declare. Others pass through unchanged.
pub mod codes {
    pub const INVALID_ARGUMENT: &str = "INVALID_ARGUMENT";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const INTERNAL: &str = "INTERNAL";
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const INDEX_ERROR: &str = "INDEX_ERROR";
    pub const CACHE_ERROR: &str = "CACHE_ERROR";
}

const NETWORK_MESSAGE: &str = "Server not reachable.";
const FALLBACK_MESSAGE: &str = "Request failed";

/// Wire shape `{ "error": { "code", "message", "details"? } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

impl ErrorPayload {
    /// Parse `body`, returning `None` unless it is a well-formed payload.
    ///
    /// Well-formed means `code` and `message` are non-empty strings and
    /// `details`, when present and not null, is an object.
    pub fn parse(body: &[u8]) -> Option<Self> {
        let payload: ErrorPayload = serde_json::from_slice(body).ok()?;
        if payload.error.code.is_empty() || payload.error.message.is_empty() {
            return None;
        }
        Some(payload)
    }
}

/// A classified failure of a backend call.
///
/// Constructed once, when a response or transport failure is classified,
/// and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} ({code})")]
pub struct ApiError {
    message: String,
    code: String,
    details: Option<Map<String, Value>>,
    status: Option<u16>,
}

impl ApiError {
    pub fn new(
        message: impl Into<String>,
        code: impl Into<String>,
        details: Option<Map<String, Value>>,
        status: Option<u16>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details,
            status,
        }
    }

    /// No response was obtained.
    pub fn network() -> Self {
        Self::new(NETWORK_MESSAGE, NETWORK_ERROR, None, None)
    }

    /// Classify a non-2xx response.
    pub fn from_response(response: &RelayResponse) -> Self {
        let status = Some(response.status.as_u16());
        match ErrorPayload::parse(&response.body) {
            Some(ErrorPayload { error }) => Self::new(error.message, error.code, error.details, status),
            None => {
                let message = if response.status_text.is_empty() {
                    FALLBACK_MESSAGE.to_string()
                } else {
                    response.status_text.clone()
                };
                Self::new(message, HTTP_ERROR, None, status)
            }
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn details(&self) -> Option<&Map<String, Value>> {
        self.details.as_ref()
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn is_network(&self) -> bool {
        self.code == NETWORK_ERROR
    }

    /// Message suitable for showing to a person, never empty.
    pub fn user_message(&self) -> String {
        if self.is_network() {
            return "Server not reachable. Check the base URL in Settings.".to_string();
        }
        if self.message.trim().is_empty() {
            return format!("{}.", FALLBACK_MESSAGE);
        }
        self.message.clone()
    }
}
