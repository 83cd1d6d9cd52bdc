//! Shared task store: the pending queue and the completed history
//!
//! Every operation takes the single store lock, so appending, claiming,
//! removal and position renumbering are never observed half-done.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::Notify;
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::queue::task::{TaskId, TaskKind, TaskOutcome, TaskRecord, TaskStatus};

#[derive(Default)]
struct StoreInner {
    /// Ordered by position, 1..=len
    pending: Vec<TaskRecord>,
    history: Vec<TaskRecord>,
    history_index: HashMap<TaskId, usize>,
}

/// Queue statistics
#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    pub pending: usize,
    pub running: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub max_queue_size: usize,
}

/// Task store shared by submission, the scheduler, executors and queries
///
/// ```
/// use render_queue_gateway::queue::{TaskKind, TaskOutcome, TaskStatus, TaskStore};
///
/// # tokio_test::block_on(async {
/// let store = TaskStore::default();
/// let task = store
///     .enqueue(TaskKind::TextToImage, serde_json::json!({"prompt": "a lamp"}))
///     .unwrap();
/// assert_eq!(task.position, 1);
///
/// // Enqueue leaves a wakeup for the scheduler
/// store.notified().await;
///
/// let claimed = store.claim_next().unwrap();
/// let done = store
///     .complete(&claimed.id, TaskOutcome::Success(vec!["/static/images/lamp.png".into()]))
///     .unwrap();
/// assert_eq!(done.status, TaskStatus::Success);
/// # });
/// ```
pub struct TaskStore {
    inner: Mutex<StoreInner>,
    max_queue_size: usize,
    wakeup: Notify,
}

impl TaskStore {
    pub fn new(max_queue_size: usize) -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
            max_queue_size,
            wakeup: Notify::new(),
        }
    }

    /// Append a new pending task at the back of the queue
    pub fn enqueue(&self, kind: TaskKind, parameters: serde_json::Value) -> Result<TaskRecord> {
        let record = {
            let mut inner = self.inner.lock();
            let queued = inner.pending.len();
            if queued >= self.max_queue_size {
                return Err(AppError::QueueFull(queued));
            }

            let position = u32::try_from(queued + 1)
                .map_err(|_| AppError::Internal("queue position overflow".to_string()))?;
            let record = TaskRecord::new(kind, parameters, position);
            inner.pending.push(record.clone());
            record
        };

        info!(task_id = %record.id, kind = %record.kind, position = record.position, "Task queued");
        self.wakeup.notify_one();
        Ok(record)
    }

    /// Look a task up in the pending queue, then in history
    pub fn find(&self, id: &TaskId) -> Option<TaskRecord> {
        let inner = self.inner.lock();
        if let Some(record) = inner.pending.iter().find(|t| t.id == *id) {
            return Some(record.clone());
        }
        inner
            .history_index
            .get(id)
            .map(|&index| inner.history[index].clone())
    }

    /// Whether the task is still in the pending queue (pending or running)
    pub fn is_pending(&self, id: &TaskId) -> bool {
        self.inner.lock().pending.iter().any(|t| t.id == *id)
    }

    /// Claim the task at position 1 if it is still waiting, marking it running
    pub fn claim_next(&self) -> Option<TaskRecord> {
        let mut inner = self.inner.lock();
        let record = inner
            .pending
            .iter_mut()
            .find(|t| t.position == 1 && t.status == TaskStatus::Pending)?;

        record.status = TaskStatus::Running;
        debug!(task_id = %record.id, "Task claimed for execution");
        Some(record.clone())
    }

    /// Count one render attempt against a queued task
    pub fn record_attempt(&self, id: &TaskId) -> Option<u32> {
        let mut inner = self.inner.lock();
        let record = inner.pending.iter_mut().find(|t| t.id == *id)?;
        record.attempts += 1;
        Some(record.attempts)
    }

    /// Move a running task to history with its outcome and close the gap it leaves
    pub fn complete(&self, id: &TaskId, outcome: TaskOutcome) -> Result<TaskRecord> {
        let finished = {
            let mut inner = self.inner.lock();
            let index = inner
                .pending
                .iter()
                .position(|t| t.id == *id)
                .ok_or_else(|| AppError::TaskNotFound(id.to_string()))?;

            let status = inner.pending[index].status;
            if status != TaskStatus::Running {
                return Err(AppError::Internal(format!(
                    "task {} cannot complete from status {}",
                    id, status
                )));
            }

            let mut record = inner.pending.remove(index);
            record.finish(outcome);

            for remaining in inner.pending.iter_mut() {
                if remaining.position > record.position {
                    remaining.position -= 1;
                }
            }

            let slot = inner.history.len();
            inner.history_index.insert(record.id, slot);
            inner.history.push(record.clone());
            record
        };

        info!(
            task_id = %finished.id,
            status = %finished.status,
            attempts = finished.attempts,
            "Task moved to history"
        );
        self.wakeup.notify_one();
        Ok(finished)
    }

    /// Wait until a task is queued or completed
    pub async fn notified(&self) {
        self.wakeup.notified().await
    }

    pub fn pending_snapshot(&self) -> Vec<TaskRecord> {
        self.inner.lock().pending.clone()
    }

    pub fn history_snapshot(&self) -> Vec<TaskRecord> {
        self.inner.lock().history.clone()
    }

    pub fn stats(&self) -> QueueStats {
        let inner = self.inner.lock();
        let running = inner
            .pending
            .iter()
            .filter(|t| t.status == TaskStatus::Running)
            .count();
        let succeeded = inner
            .history
            .iter()
            .filter(|t| t.status == TaskStatus::Success)
            .count();

        QueueStats {
            pending: inner.pending.len() - running,
            running,
            succeeded,
            failed: inner.history.len() - succeeded,
            max_queue_size: self.max_queue_size,
        }
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new(1000)
    }
}
