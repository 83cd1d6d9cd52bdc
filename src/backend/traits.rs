//! Common traits and types for the external render service

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::queue::task::TaskKind;

/// Artifacts returned by one successful render call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderOutput {
    /// Base64 encoded images, in the order the service produced them
    pub images: Vec<String>,

    /// Free-form generation info reported by the service
    pub info: Option<serde_json::Value>,
}

/// Synchronous image-synthesis backend
#[async_trait]
pub trait RenderService: Send + Sync {
    /// Get the service name
    fn name(&self) -> &str;

    /// Execute one render job and wait for its artifacts
    async fn render(&self, kind: TaskKind, parameters: &serde_json::Value) -> Result<RenderOutput>;

    /// Fetch the service's live progress report
    async fn progress(&self) -> Result<serde_json::Map<String, serde_json::Value>>;

    /// Check if the service is reachable
    async fn health_check(&self) -> bool;
}
