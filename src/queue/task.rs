//! Render task records and their lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TaskId = Uuid;

/// Lifecycle state of a render task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Success,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Failed)
    }

    /// Allowed moves: pending -> running -> {success, failed}
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Running)
                | (TaskStatus::Running, TaskStatus::Success)
                | (TaskStatus::Running, TaskStatus::Failed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Success => "success",
            TaskStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which render-service operation a task invokes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    #[serde(rename = "txt2img", alias = "text-to-image")]
    TextToImage,
    #[serde(rename = "img2img", alias = "image-to-image")]
    ImageToImage,
}

impl TaskKind {
    /// Path segment of the render-service endpoint
    pub fn endpoint(self) -> &'static str {
        match self {
            TaskKind::TextToImage => "txt2img",
            TaskKind::ImageToImage => "img2img",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.endpoint())
    }
}

/// How a dispatched task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Ordered artifact references
    Success(Vec<String>),
    Failed(String),
}

/// One unit of render work, from submission to terminal state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(rename = "task_id")]
    pub id: TaskId,
    pub status: TaskStatus,
    pub position: u32,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub parameters: serde_json::Value,
    pub queued_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub result: Option<Vec<String>>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskRecord {
    pub fn new(kind: TaskKind, parameters: serde_json::Value, position: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: TaskStatus::Pending,
            position,
            kind,
            parameters,
            queued_at: Utc::now(),
            finished_at: None,
            result: None,
            attempts: 0,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply a terminal outcome. Only valid for a running task.
    pub(crate) fn finish(&mut self, outcome: TaskOutcome) {
        let next = match outcome {
            TaskOutcome::Success(_) => TaskStatus::Success,
            TaskOutcome::Failed(_) => TaskStatus::Failed,
        };
        debug_assert!(self.status.can_transition_to(next));

        match outcome {
            TaskOutcome::Success(artifacts) => {
                self.status = TaskStatus::Success;
                self.result = Some(artifacts);
                self.error = None;
            }
            TaskOutcome::Failed(error) => {
                self.status = TaskStatus::Failed;
                self.result = None;
                self.error = Some(error);
            }
        }
        self.finished_at = Some(Utc::now());
    }
}
