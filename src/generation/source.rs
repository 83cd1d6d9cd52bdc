//! Image inputs given by reference: stored artifacts and remote URLs

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::artifact::{base64, ArtifactStore};
use crate::error::{AppError, Result};

/// Turns image references into inline base64 before validation
pub struct ImageResolver {
    artifacts: Arc<ArtifactStore>,
    client: Client,
}

impl ImageResolver {
    pub fn new(artifacts: Arc<ArtifactStore>, fetch_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { artifacts, client })
    }

    /// Inline base64 for `image`. Stored references are read back from disk,
    /// http(s) URLs are downloaded, anything else passes through untouched.
    pub async fn resolve(&self, field: &str, image: Option<&str>) -> Result<Option<String>> {
        let Some(image) = image.map(str::trim).filter(|i| !i.is_empty()) else {
            return Ok(None);
        };

        if self.artifacts.is_reference(image) {
            let bytes = self.artifacts.load(image).await?;
            debug!(field, reference = %image, size = bytes.len(), "Resolved stored image");
            return Ok(Some(base64::encode(&bytes)));
        }

        if image.starts_with("http://") || image.starts_with("https://") {
            let bytes = self.fetch(field, image).await?;
            debug!(field, url = %image, size = bytes.len(), "Fetched remote image");
            return Ok(Some(base64::encode(&bytes)));
        }

        Ok(Some(image.to_string()))
    }

    async fn fetch(&self, field: &str, url: &str) -> Result<Vec<u8>> {
        let unreachable = |reason: String| {
            AppError::InvalidRequest(format!("Could not fetch {} from {}: {}", field, url, reason))
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(unreachable(format!("status {}", response.status())));
        }

        let bytes = response.bytes().await.map_err(|e| unreachable(e.to_string()))?;
        if bytes.is_empty() {
            return Err(unreachable("empty body".to_string()));
        }
        Ok(bytes.to_vec())
    }
}
