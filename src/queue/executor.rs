//! Executes one claimed task against the render service

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::artifact::ArtifactStore;
use crate::backend::traits::RenderService;
use crate::error::{AppError, Result};
use crate::queue::retry::RetryPolicy;
use crate::queue::store::TaskStore;
use crate::queue::task::{TaskOutcome, TaskRecord};

/// Runs render attempts for a task and commits the outcome to the store
pub struct Executor {
    store: Arc<TaskStore>,
    service: Arc<dyn RenderService>,
    artifacts: Arc<ArtifactStore>,
    retry: RetryPolicy,
    attempt_timeout: Duration,
}

impl Executor {
    pub fn new(
        store: Arc<TaskStore>,
        service: Arc<dyn RenderService>,
        artifacts: Arc<ArtifactStore>,
        retry: RetryPolicy,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            store,
            service,
            artifacts,
            retry,
            attempt_timeout,
        }
    }

    /// Execute a task that `TaskStore::claim_next` has marked running.
    /// Returns the record as committed to history.
    #[instrument(skip(self, task), fields(task_id = %task.id, kind = %task.kind))]
    pub async fn execute(&self, task: TaskRecord) -> Result<TaskRecord> {
        info!("Executing task");

        let claimed = &task;
        let result = self
            .retry
            .run("render", move |attempt| self.attempt(claimed, attempt))
            .await;

        let outcome = match result {
            Ok(artifacts) => {
                info!(artifacts = artifacts.len(), "Task succeeded");
                TaskOutcome::Success(artifacts)
            }
            Err(e) => {
                warn!(
                    attempts = self.retry.max_attempts.max(1),
                    error = %e,
                    "Task failed after all attempts"
                );
                TaskOutcome::Failed(e.to_string())
            }
        };

        self.store.complete(&task.id, outcome).map_err(|e| {
            error!(error = %e, "Failed to commit task outcome");
            e
        })
    }

    async fn attempt(&self, task: &TaskRecord, attempt: u32) -> Result<Vec<String>> {
        match self.store.record_attempt(&task.id) {
            Some(recorded) => debug!(attempt, recorded, "Render attempt started"),
            None => warn!(attempt, "Render attempt for a task no longer in the queue"),
        }

        let output = tokio::time::timeout(
            self.attempt_timeout,
            self.service.render(task.kind, &task.parameters),
        )
        .await
        .map_err(|_| {
            AppError::Timeout(format!(
                "attempt {} exceeded {} ms",
                attempt,
                self.attempt_timeout.as_millis()
            ))
        })??;

        if output.images.is_empty() {
            return Err(AppError::BackendError(
                "Render service returned no images".to_string(),
            ));
        }

        self.artifacts.save_all(&output.images).await
    }
}
