//! Backend target resolution.

use std::sync::Arc;
use url::Url;

use crate::target::store::TargetStore;

/// Target used when neither an override nor a stored value is usable.
pub const DEFAULT_TARGET: &str = "http://127.0.0.1:8080";

/// Strip every trailing `/` so the target can be concatenated with a path.
pub fn normalize_target(target: &str) -> String {
    target.trim_end_matches('/').to_string()
}

/// Pick `candidate` if it is non-empty after trimming, otherwise `fallback`.
///
/// The result is always normalized.
pub fn select_target(candidate: Option<&str>, fallback: &str) -> String {
    match candidate.map(str::trim).filter(|c| !c.is_empty()) {
        Some(target) => normalize_target(target),
        None => normalize_target(fallback.trim()),
    }
}

/// Returns true when `target` points at the local machine.
pub fn is_local(target: &str) -> bool {
    match Url::parse(target) {
        Ok(url) => matches!(
            url.host_str(),
            Some("127.0.0.1") | Some("localhost") | Some("[::1]")
        ),
        Err(_) => false,
    }
}

/// Resolves the backend a call should reach.
///
/// Storage failures are logged and treated as "nothing stored"; neither
/// [`resolve`](Self::resolve) nor [`store`](Self::store) can fail.
#[derive(Clone)]
pub struct TargetResolver {
    store: Arc<dyn TargetStore>,
    default_target: String,
}

impl TargetResolver {
    pub fn new(store: Arc<dyn TargetStore>) -> Self {
        Self::with_default(store, DEFAULT_TARGET)
    }

    pub fn with_default(store: Arc<dyn TargetStore>, default_target: impl Into<String>) -> Self {
        Self {
            store,
            default_target: default_target.into(),
        }
    }

    /// Resolve the target for one call.
    pub fn resolve(&self, explicit_override: Option<&str>) -> String {
        if let Some(target) = explicit_override.map(str::trim).filter(|t| !t.is_empty()) {
            return normalize_target(target);
        }
        select_target(self.stored().as_deref(), &self.default_target)
    }

    /// Persist a new target. Empty input is ignored.
    pub fn store(&self, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            tracing::debug!("Ignoring empty backend target");
            return;
        }
        if let Err(e) = self.store.save(value) {
            tracing::warn!(error = %e, "Failed to persist backend target");
        }
    }

    fn stored(&self) -> Option<String> {
        match self.store.load() {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored backend target");
                None
            }
        }
    }
}

impl std::fmt::Debug for TargetResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetResolver")
            .field("default_target", &self.default_target)
            .finish_non_exhaustive()
    }
}
