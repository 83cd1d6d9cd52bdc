//! Background scheduler dispatching queued tasks one at a time

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::queue::executor::Executor;
use crate::queue::store::TaskStore;
use crate::queue::task::{TaskId, TaskOutcome};

/// The single in-flight execution worker
struct InFlight {
    task_id: TaskId,
    handle: JoinHandle<()>,
}

/// Polls the store and hands the position-1 task to the executor
pub struct Scheduler {
    store: Arc<TaskStore>,
    executor: Arc<Executor>,
    poll_interval: Duration,
    in_flight: Option<InFlight>,
}

impl Scheduler {
    pub fn new(store: Arc<TaskStore>, executor: Arc<Executor>, poll_interval: Duration) -> Self {
        Self {
            store,
            executor,
            poll_interval,
            in_flight: None,
        }
    }

    /// Run the scheduling loop on its own tokio task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Scheduling loop; wakes on every tick and whenever the store signals
    pub async fn run(mut self) {
        info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Task scheduler started"
        );

        loop {
            self.tick();

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = self.store.notified() => {}
            }
        }
    }

    /// One scheduling pass. Returns true if a task was dispatched.
    pub fn tick(&mut self) -> bool {
        if let Some(in_flight) = self.in_flight.take() {
            if in_flight.handle.is_finished() {
                self.reap(in_flight.task_id);
            } else if self.store.is_pending(&in_flight.task_id) {
                self.in_flight = Some(in_flight);
                return false;
            }
            // Otherwise the worker has committed and is only unwinding
        }

        let Some(task) = self.store.claim_next() else {
            return false;
        };

        let task_id = task.id;
        debug!(task_id = %task_id, "Dispatching task");

        let executor = self.executor.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = executor.execute(task).await {
                error!(task_id = %task_id, error = %e, "Task execution ended with an error");
            }
        });

        self.in_flight = Some(InFlight { task_id, handle });
        true
    }

    /// A finished worker must have moved its task to history; fail any orphan
    fn reap(&self, task_id: TaskId) {
        if !self.store.is_pending(&task_id) {
            return;
        }

        warn!(task_id = %task_id, "Execution worker exited without committing its task");
        let outcome = TaskOutcome::Failed("execution worker exited before completing".to_string());
        if let Err(e) = self.store.complete(&task_id, outcome) {
            error!(task_id = %task_id, error = %e, "Failed to fail orphaned task");
        }
    }
}
