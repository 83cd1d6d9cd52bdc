//! Render Queue Gateway
//!
//! Accepts image-generation requests, queues them as render tasks and executes
//! them one at a time against an external sdapi-compatible render service.
//! Clients poll task status, live progress and results by task id.

pub mod api;
pub mod artifact;
pub mod backend;
pub mod config;
pub mod error;
pub mod generation;
pub mod middleware;
pub mod queue;

pub use error::{AppError, Result};

use std::sync::Arc;
use std::time::Duration;

use artifact::ArtifactStore;
use backend::{health::HealthMonitor, traits::RenderService};
use generation::{color::ColorNamer, source::ImageResolver, style::StyleCatalog, GenerationService};
use queue::{Executor, RetryPolicy, Scheduler, TaskQueries, TaskStore};

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<config::Settings>,
    pub store: Arc<TaskStore>,
    pub queries: TaskQueries,
    pub generation: Arc<GenerationService>,
    pub artifacts: Arc<ArtifactStore>,
    pub health_monitor: Arc<HealthMonitor>,
    pub executor: Arc<Executor>,
}

impl AppState {
    /// Wire every component around the given render service
    pub fn new(settings: config::Settings, render_service: Arc<dyn RenderService>) -> Result<Self> {
        let settings = Arc::new(settings);
        let store = Arc::new(TaskStore::new(settings.scheduler.max_queue_size));
        let artifacts = Arc::new(ArtifactStore::from_config(&settings.storage));

        let executor = Arc::new(Executor::new(
            store.clone(),
            render_service.clone(),
            artifacts.clone(),
            RetryPolicy::from(&settings.scheduler),
            settings.render.timeout(),
        ));

        let generation = Arc::new(GenerationService::new(
            StyleCatalog::default(),
            ColorNamer::new(&settings.colors)?,
            ImageResolver::new(artifacts.clone(), settings.generation.image_fetch_timeout())?,
            settings.generation.clone(),
        ));

        Ok(Self {
            queries: TaskQueries::new(store.clone(), render_service.clone()),
            health_monitor: Arc::new(HealthMonitor::new(render_service)),
            settings,
            store,
            generation,
            artifacts,
            executor,
        })
    }

    /// Scheduler bound to this state's store and executor
    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(
            self.store.clone(),
            self.executor.clone(),
            Duration::from_millis(self.settings.scheduler.poll_interval_ms),
        )
    }
}
