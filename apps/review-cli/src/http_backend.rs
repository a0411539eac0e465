//! HTTP client for the validation backend

use async_trait::async_trait;
use review_core::{BackendError, ValidationBackend};
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn check_url(&self) -> String {
        format!("{}/check_local_pdf", self.base_url)
    }
}

#[async_trait]
impl ValidationBackend for HttpBackend {
    fn name(&self) -> &str {
        &self.base_url
    }

    async fn check_document(&self, path: &Path) -> Result<Value, BackendError> {
        let response = self
            .client
            .post(self.check_url())
            .json(&json!({ "file_path": path.to_string_lossy() }))
            .send()
            .await
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }

    async fn is_online(&self) -> bool {
        match self.client.get(format!("{}/", self.base_url)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_url_strips_trailing_slash() {
        let backend = HttpBackend::new("http://127.0.0.1:8002/", Duration::from_secs(1)).unwrap();
        assert_eq!(backend.check_url(), "http://127.0.0.1:8002/check_local_pdf");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_offline() {
        // Port 9 (discard) is not expected to run an HTTP server
        let backend = HttpBackend::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        assert!(!backend.is_online().await);
        assert!(matches!(
            backend.check_document(Path::new("/tmp/missing.pdf")).await,
            Err(BackendError::Unreachable(_))
        ));
    }
}
