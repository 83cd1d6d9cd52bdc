//! HTTP client for an sdapi-compatible render service

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::backend::traits::{RenderOutput, RenderService};
use crate::config::RenderConfig;
use crate::error::{AppError, Result};
use crate::queue::task::TaskKind;

/// Render service reached over HTTP at a fixed base URL
pub struct HttpRenderService {
    base_url: String,
    client: Client,
    progress_timeout: Duration,
    health_check_path: String,
}

/// Response body of txt2img / img2img
#[derive(Debug, Deserialize)]
struct ApiRenderResponse {
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    info: Option<serde_json::Value>,
}

impl HttpRenderService {
    /// Create a new HTTP render service from configuration
    pub fn new(config: &RenderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            progress_timeout: Duration::from_millis(config.progress_timeout_ms),
            health_check_path: config.health_check_path.clone(),
        })
    }

    fn render_url(&self, kind: TaskKind) -> String {
        format!("{}/sdapi/v1/{}", self.base_url, kind.endpoint())
    }
}

#[async_trait]
impl RenderService for HttpRenderService {
    fn name(&self) -> &str {
        &self.base_url
    }

    async fn render(&self, kind: TaskKind, parameters: &serde_json::Value) -> Result<RenderOutput> {
        let url = self.render_url(kind);
        debug!(url = %url, "Sending render request");

        let response = self
            .client
            .post(&url)
            .json(parameters)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    AppError::BackendError(format!("Connection failed to {}: {}", url, e))
                } else {
                    AppError::HttpClient(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::BackendError(format!(
                "Render service returned {}: {}",
                status, body
            )));
        }

        let api_response = response
            .json::<ApiRenderResponse>()
            .await
            .map_err(|e| AppError::BackendError(format!("Failed to parse response: {}", e)))?;

        if api_response.images.is_empty() {
            return Err(AppError::BackendError(
                "Render service response contained no images".to_string(),
            ));
        }

        debug!(images = api_response.images.len(), "Render request succeeded");
        Ok(RenderOutput {
            images: api_response.images,
            info: api_response.info,
        })
    }

    async fn progress(&self) -> Result<serde_json::Map<String, serde_json::Value>> {
        let url = format!("{}/sdapi/v1/progress", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("skip_current_image", "false")])
            .timeout(self.progress_timeout)
            .send()
            .await
            .map_err(|e| AppError::ProgressUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Error fetching progress");
            return Err(AppError::ProgressUnavailable(format!(
                "Render service returned {}",
                status
            )));
        }

        response
            .json::<serde_json::Map<String, serde_json::Value>>()
            .await
            .map_err(|e| AppError::ProgressUnavailable(format!("Malformed progress report: {}", e)))
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}{}", self.base_url, self.health_check_path);

        match self
            .client
            .get(&url)
            .timeout(self.progress_timeout)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!(url = %url, status = %response.status(), "Health check failed");
                false
            }
            Err(e) => {
                debug!(url = %url, error = %e, "Health check failed");
                false
            }
        }
    }
}
