//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML, and every
//! section defaults so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::client::ALLOWED_EXTENSIONS;
use crate::relay::X_BASE_URL;
use crate::target::DEFAULT_TARGET;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct RelayConfig {
    /// Where the relay server listens.
    pub listener: ListenerConfig,

    /// Relay path and target settings.
    pub relay: RelaySettings,

    /// Settings used by the command-line client.
    pub client: ClientConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RelaySettings {
    /// Path prefix the relay is mounted under.
    pub path_prefix: String,

    /// Request header that selects the backend.
    pub control_header: String,

    /// Backend used when a request names none.
    pub default_target: String,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            path_prefix: "/api/proxy".to_string(),
            control_header: X_BASE_URL.to_string(),
            default_target: DEFAULT_TARGET.to_string(),
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of a running relay server.
    pub relay_url: String,

    /// File holding the persisted backend target.
    pub state_path: String,

    /// File extensions accepted for upload, with the leading dot.
    pub allowed_extensions: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: "http://127.0.0.1:3000".to_string(),
            state_path: "note-relay-state.json".to_string(),
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
}
