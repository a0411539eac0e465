//! Validation backend seam
//!
//! The backend is an external service that inspects a document and returns
//! an issue list. Anything other than a usable list means "no issues
//! available yet"; it never fails a review.

use crate::store::IssueStore;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait ValidationBackend: Send + Sync {
    /// Backend identifier for logs
    fn name(&self) -> &str;

    /// Ask the backend to check the document at `path`
    async fn check_document(&self, path: &Path) -> Result<Value, BackendError>;

    /// Whether the backend answers at all
    async fn is_online(&self) -> bool;
}

/// Turn a backend reply into an issue set.
///
/// A reply is a failure when it carries `"status"` other than `"success"`
/// together with an `error` or `detail` message, or when it has no
/// recognizable issue list.
pub fn interpret_response(response: Value) -> Result<IssueStore, String> {
    if let Value::Object(map) = &response {
        let succeeded = map.get("status").and_then(Value::as_str) == Some("success");
        let reason = map
            .get("error")
            .or_else(|| map.get("detail"))
            .filter(|v| !v.is_null());
        if let (false, Some(reason)) = (succeeded, reason) {
            return Err(match reason {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
        }
    }
    IssueStore::load(response).map_err(|e| e.to_string())
}

/// Run a check, logging and swallowing every non-success outcome
pub async fn check_document<B: ValidationBackend + ?Sized>(
    backend: &B,
    path: &Path,
) -> Option<IssueStore> {
    let response = match backend.check_document(path).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(backend = backend.name(), error = %e, "Validation backend call failed");
            return None;
        }
    };

    match interpret_response(response) {
        Ok(store) => Some(store),
        Err(reason) => {
            tracing::warn!(backend = backend.name(), %reason, "Validation backend reported no issues");
            None
        }
    }
}
