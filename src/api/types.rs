//! Request and response bodies of the HTTP API

use serde::{Deserialize, Serialize};

use crate::backend::health::HealthStatus;
use crate::queue::{QueueStats, TaskKind, TaskRecord};

/// `?task_id=` query parameter shared by the lookup routes
#[derive(Debug, Deserialize)]
pub struct TaskIdQuery {
    pub task_id: Option<String>,
}

/// Raw submission of an already-built render payload
#[derive(Debug, Deserialize)]
pub struct SubmitTaskRequest {
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitTaskResponse {
    pub task: TaskRecord,
}

#[derive(Debug, Serialize)]
pub struct ResultsReadyResponse {
    pub message: String,
    pub image_paths: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ResultsFailedResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResultsPendingResponse {
    pub message: String,
    pub task: TaskRecord,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub render_service: HealthStatus,
    pub queue: QueueStats,
}
