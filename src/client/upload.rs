//! Batch upload of note files.
//!
//! Each file is an [`UploadItem`] moving through [`UploadState`]:
//!
//! ```text
//! Queued ─┬─> Invalid
//!         └─> Uploading ─┬─> Uploaded
//!                        ├─> Indexed
//!                        ├─> Failed
//!                        └─> EndpointUnsupported
//! ```
//!
//! The [`UploadCoordinator`] validates extensions up front and then runs
//! every valid item concurrently. One item failing never stops the rest.

use bytes::Bytes;
use futures_util::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

use crate::client::api::ApiClient;
use crate::client::error::ApiError;
use crate::client::types::UploadResponse;

/// Backend path for single-file uploads.
pub const UPLOAD_PATH: &str = "/v1/upload";

/// Extensions accepted when none are configured.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".fyi", ".md", ".notes"];

/// A file selected for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub name: String,
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk, keeping only its file name.
    pub async fn read(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, data))
    }

    /// Lowercased extension including the dot, or an empty string.
    pub fn extension(&self) -> String {
        extension_of(&self.name)
    }
}

fn extension_of(name: &str) -> String {
    match name.rfind('.') {
        Some(idx) => name[idx..].to_ascii_lowercase(),
        None => String::new(),
    }
}

/// What a successful-transport upload call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// Stored; the response carried no ingest summary (or no parseable body).
    Uploaded { response: Option<UploadResponse> },
    /// Stored and ingested without failures.
    Indexed { response: UploadResponse },
    /// Stored, but ingest reported failures.
    IngestFailed { response: UploadResponse, message: String },
    /// The backend answered 404 or 405.
    EndpointUnsupported { status: u16 },
}

impl UploadOutcome {
    /// Interpret the body of a 2xx upload response.
    pub fn from_payload(payload: Option<UploadResponse>) -> Self {
        let Some(response) = payload else {
            return Self::Uploaded { response: None };
        };
        let Some(ingest) = &response.ingest else {
            return Self::Uploaded {
                response: Some(response),
            };
        };

        if ingest.counts.failures() > 0 {
            let message = match &ingest.errors {
                Some(errors) if !errors.is_empty() => errors.join(", "),
                _ => "Ingest failed.".to_string(),
            };
            Self::IngestFailed { response, message }
        } else {
            Self::Indexed { response }
        }
    }
}

/// Lifecycle of one upload item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UploadState {
    Queued,
    Invalid { message: String },
    Uploading,
    Uploaded { message: String },
    Indexed { message: String },
    Failed { message: String, code: Option<String> },
    EndpointUnsupported { message: String },
}

impl UploadState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Invalid { .. } => "invalid",
            Self::Uploading => "uploading",
            Self::Uploaded { .. } => "uploaded",
            Self::Indexed { .. } => "indexed",
            Self::Failed { .. } => "failed",
            Self::EndpointUnsupported { .. } => "endpoint_unsupported",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Queued | Self::Uploading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Uploaded { .. } | Self::Indexed { .. })
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Queued | Self::Uploading => None,
            Self::Invalid { message }
            | Self::Uploaded { message }
            | Self::Indexed { message }
            | Self::Failed { message, .. }
            | Self::EndpointUnsupported { message } => Some(message),
        }
    }

    fn can_transition_to(&self, next: &UploadState) -> bool {
        match self {
            Self::Queued => matches!(next, Self::Invalid { .. } | Self::Uploading),
            Self::Uploading => next.is_terminal() && !matches!(next, Self::Invalid { .. }),
            _ => false,
        }
    }

    /// Terminal state for a finished upload call.
    pub fn settled(result: Result<UploadOutcome, ApiError>) -> Self {
        match result {
            Ok(UploadOutcome::Uploaded { .. }) => Self::Uploaded {
                message: "Upload succeeded.".to_string(),
            },
            Ok(UploadOutcome::Indexed { response }) => {
                let counts = response.ingest.map(|i| i.counts).unwrap_or_default();
                Self::Indexed {
                    message: format!(
                        "Indexed {}, updated {}.",
                        counts.indexed.unwrap_or(0),
                        counts.updated.unwrap_or(0)
                    ),
                }
            }
            Ok(UploadOutcome::IngestFailed { message, .. }) => Self::Failed { message, code: None },
            Ok(UploadOutcome::EndpointUnsupported { .. }) => Self::EndpointUnsupported {
                message: format!("Server does not support {}.", UPLOAD_PATH),
            },
            Err(err) => Self::Failed {
                message: err.user_message(),
                code: Some(err.code().to_string()),
            },
        }
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("invalid upload transition from {from} to {to}")]
pub struct TransitionError {
    pub from: &'static str,
    pub to: &'static str,
}

/// One file in a batch.
#[derive(Debug, Clone, Serialize)]
pub struct UploadItem {
    pub id: Uuid,
    pub name: String,
    pub size: u64,
    #[serde(flatten)]
    state: UploadState,
    #[serde(skip)]
    data: Bytes,
}

impl UploadItem {
    pub fn new(file: UploadFile) -> Self {
        Self {
            id: Uuid::new_v4(),
            size: file.data.len() as u64,
            name: file.name,
            state: UploadState::Queued,
            data: file.data,
        }
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn transition(&mut self, next: UploadState) -> Result<(), TransitionError> {
        if !self.state.can_transition_to(&next) {
            return Err(TransitionError {
                from: self.state.name(),
                to: next.name(),
            });
        }
        tracing::debug!(id = %self.id, file = %self.name, from = self.state.name(), to = next.name(), "Upload state change");
        self.state = next;
        Ok(())
    }

    fn file(&self) -> UploadFile {
        UploadFile::new(self.name.clone(), self.data.clone())
    }
}

/// Outcome of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub items: Vec<UploadItem>,
}

impl UploadReport {
    /// Item count per state name.
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for item in &self.items {
            *counts.entry(item.state().name()).or_insert(0) += 1;
        }
        counts
    }

    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.state().is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }

    /// True when any item found the backend without an upload endpoint.
    pub fn endpoint_unsupported(&self) -> bool {
        self.items
            .iter()
            .any(|i| matches!(i.state(), UploadState::EndpointUnsupported { .. }))
    }
}

/// Runs a batch of uploads through an [`ApiClient`].
#[derive(Debug, Clone)]
pub struct UploadCoordinator {
    client: ApiClient,
    allowed_extensions: Vec<String>,
}

impl UploadCoordinator {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn with_allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().to_ascii_lowercase())
            .collect();
        self
    }

    /// Create items for `files`, marking unsupported extensions invalid.
    pub fn enqueue(&self, files: Vec<UploadFile>) -> Vec<UploadItem> {
        files
            .into_iter()
            .map(|file| {
                let extension = file.extension();
                let mut item = UploadItem::new(file);
                if !self.allowed_extensions.contains(&extension) {
                    let shown = if extension.is_empty() { "unknown" } else { extension.as_str() };
                    let invalid = UploadState::Invalid {
                        message: format!("Unsupported file type ({}).", shown),
                    };
                    if let Err(e) = item.transition(invalid) {
                        tracing::error!(error = %e, "Unexpected upload state");
                    }
                }
                item
            })
            .collect()
    }

    /// Upload every valid file concurrently and wait for all of them.
    ///
    /// The target is resolved once so the whole batch goes to one backend.
    pub async fn upload_all(&self, files: Vec<UploadFile>, target_override: Option<&str>) -> UploadReport {
        let items = self.enqueue(files);
        let target = self.client.resolver().resolve(target_override);
        tracing::info!(count = items.len(), target = %target, "Starting upload batch");

        let items = join_all(items.into_iter().map(|item| self.run(item, &target))).await;
        let report = UploadReport { items };
        tracing::info!(succeeded = report.succeeded(), failed = report.failed(), "Upload batch finished");
        report
    }

    async fn run(&self, mut item: UploadItem, target: &str) -> UploadItem {
        if item.state() != &UploadState::Queued {
            return item;
        }
        if let Err(e) = item.transition(UploadState::Uploading) {
            tracing::error!(error = %e, "Unexpected upload state");
            return item;
        }

        let result = self.client.upload(&item.file(), Some(target)).await;
        if let Err(e) = &result {
            tracing::warn!(file = %item.name, code = %e.code(), error = %e, "Upload failed");
        }
        if let Err(e) = item.transition(UploadState::settled(result)) {
            tracing::error!(error = %e, "Unexpected upload state");
        }
        item
    }
}
