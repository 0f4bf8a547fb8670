//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, URLs and header names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::HeaderName;
use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::RelayConfig;

/// One semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Check `config`, collecting every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let prefix = &config.relay.path_prefix;
    if !prefix.starts_with('/') {
        errors.push(ValidationError::new("relay.path_prefix", "must start with '/'"));
    }
    if prefix.len() > 1 && prefix.ends_with('/') {
        errors.push(ValidationError::new("relay.path_prefix", "must not end with '/'"));
    }
    if prefix.contains('{') || prefix.contains('}') {
        errors.push(ValidationError::new("relay.path_prefix", "must not contain route parameters"));
    }

    if HeaderName::from_bytes(config.relay.control_header.as_bytes()).is_err() {
        errors.push(ValidationError::new(
            "relay.control_header",
            format!("'{}' is not a valid header name", config.relay.control_header),
        ));
    }

    if let Err(reason) = check_http_url(&config.relay.default_target) {
        errors.push(ValidationError::new("relay.default_target", reason));
    }
    if let Err(reason) = check_http_url(&config.client.relay_url) {
        errors.push(ValidationError::new("client.relay_url", reason));
    }

    if config.client.state_path.trim().is_empty() {
        errors.push(ValidationError::new("client.state_path", "must not be empty"));
    }
    for ext in &config.client.allowed_extensions {
        if !ext.starts_with('.') || ext.len() < 2 {
            errors.push(ValidationError::new(
                "client.allowed_extensions",
                format!("'{}' must look like '.md'", ext),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_http_url(value: &str) -> Result<(), String> {
    let url = Url::parse(value).map_err(|e| format!("'{}' is not a URL: {}", value, e))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported scheme '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&RelayConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = RelayConfig::default();
        config.listener.bind_address = "localhost".into();
        config.relay.path_prefix = "api/".into();
        config.relay.control_header = "bad header".into();
        config.relay.default_target = "ftp://notes".into();
        config.client.allowed_extensions = vec!["md".into()];

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "relay.path_prefix",
                "relay.path_prefix",
                "relay.control_header",
                "relay.default_target",
                "client.allowed_extensions",
            ]
        );
    }

    #[test]
    fn test_root_prefix_allowed() {
        let mut config = RelayConfig::default();
        config.relay.path_prefix = "/".into();
        assert!(validate_config(&config).is_ok());
    }
}
