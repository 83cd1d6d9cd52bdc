//! Task queue - records, store, scheduler, executor and queries

pub mod executor;
pub mod query;
pub mod retry;
pub mod scheduler;
pub mod store;
pub mod task;

pub use executor::Executor;
pub use query::{TaskProgress, TaskQueries, TaskResult};
pub use retry::RetryPolicy;
pub use scheduler::Scheduler;
pub use store::{QueueStats, TaskStore};
pub use task::{TaskId, TaskKind, TaskOutcome, TaskRecord, TaskStatus};
