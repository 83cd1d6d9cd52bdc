//! Read-only task lookups: status, result and live progress

use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::warn;

use crate::backend::traits::RenderService;
use crate::error::{AppError, Result};
use crate::queue::store::TaskStore;
use crate::queue::task::{TaskId, TaskRecord, TaskStatus};

/// Observable result of a task
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TaskResult {
    Ready { artifacts: Vec<String> },
    Failed { error: Option<String> },
    InProgress { status: TaskStatus, position: u32 },
}

impl From<&TaskRecord> for TaskResult {
    fn from(task: &TaskRecord) -> Self {
        match task.status {
            TaskStatus::Success => TaskResult::Ready {
                artifacts: task.result.clone().unwrap_or_default(),
            },
            TaskStatus::Failed => TaskResult::Failed {
                error: task.error.clone(),
            },
            status => TaskResult::InProgress {
                status,
                position: task.position,
            },
        }
    }
}

/// Task status merged with the render service's live progress fields
#[derive(Debug, Clone)]
pub struct TaskProgress {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub position: u32,
    pub live: Map<String, Value>,
}

impl TaskProgress {
    /// Flatten into one JSON object; task fields win over upstream keys
    pub fn into_json(self) -> Value {
        let mut merged = self.live;
        merged.insert("task_id".to_string(), Value::String(self.task_id.to_string()));
        merged.insert("status".to_string(), Value::String(self.status.to_string()));
        merged.insert("position".to_string(), Value::from(self.position));
        Value::Object(merged)
    }
}

/// Query facade over the task store
#[derive(Clone)]
pub struct TaskQueries {
    store: Arc<TaskStore>,
    service: Arc<dyn RenderService>,
}

impl TaskQueries {
    pub fn new(store: Arc<TaskStore>, service: Arc<dyn RenderService>) -> Self {
        Self { store, service }
    }

    /// Full record, pending or historical
    pub fn get_status(&self, id: &TaskId) -> Result<TaskRecord> {
        self.store
            .find(id)
            .ok_or_else(|| AppError::TaskNotFound(id.to_string()))
    }

    pub fn get_result(&self, id: &TaskId) -> Result<TaskResult> {
        self.get_status(id).map(|task| TaskResult::from(&task))
    }

    /// Status enriched with the render service's progress report
    pub async fn get_progress(&self, id: &TaskId) -> Result<TaskProgress> {
        let task = self.get_status(id)?;

        let live = self.service.progress().await.map_err(|e| {
            warn!(task_id = %id, error = %e, "Error fetching progress");
            match e {
                AppError::ProgressUnavailable(_) => e,
                other => AppError::ProgressUnavailable(other.to_string()),
            }
        })?;

        Ok(TaskProgress {
            task_id: task.id,
            status: task.status,
            position: task.position,
            live,
        })
    }
}
