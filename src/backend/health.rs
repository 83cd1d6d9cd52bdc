//! Background health monitoring of the render service

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::traits::RenderService;

/// Health status of the render service
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub last_check: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            healthy: true, // Assume healthy until proven otherwise
            last_check: None,
            consecutive_failures: 0,
            consecutive_successes: 0,
        }
    }
}

impl HealthStatus {
    /// Fold one health-check result into the status
    fn observe(&mut self, ok: bool, failure_threshold: u32, recovery_threshold: u32) {
        self.last_check = Some(Utc::now());

        if ok {
            self.consecutive_failures = 0;
            self.consecutive_successes += 1;

            if !self.healthy && self.consecutive_successes >= recovery_threshold {
                self.healthy = true;
                info!("Render service recovered and marked healthy");
            }
        } else {
            self.consecutive_successes = 0;
            self.consecutive_failures += 1;

            if self.healthy && self.consecutive_failures >= failure_threshold {
                self.healthy = false;
                warn!(
                    failures = self.consecutive_failures,
                    "Render service marked unhealthy after consecutive failures"
                );
            }
        }
    }
}

/// Periodically checks the render service and keeps the latest status
pub struct HealthMonitor {
    service: Arc<dyn RenderService>,
    status: Arc<RwLock<HealthStatus>>,
    check_task: RwLock<Option<JoinHandle<()>>>,
    /// Number of consecutive failures before marking unhealthy
    failure_threshold: u32,
    /// Number of consecutive successes before marking healthy again
    recovery_threshold: u32,
}

impl HealthMonitor {
    pub fn new(service: Arc<dyn RenderService>) -> Self {
        Self {
            service,
            status: Arc::new(RwLock::new(HealthStatus::default())),
            check_task: RwLock::new(None),
            failure_threshold: 3,
            recovery_threshold: 2,
        }
    }

    /// Start the background health-check loop
    pub fn start(&self, interval_secs: u64) {
        let service = self.service.clone();
        let status = self.status.clone();
        let failure_threshold = self.failure_threshold;
        let recovery_threshold = self.recovery_threshold;
        let interval = Duration::from_secs(interval_secs.max(1));

        let handle = tokio::spawn(async move {
            loop {
                let ok = service.health_check().await;
                {
                    let mut status = status.write();
                    status.observe(ok, failure_threshold, recovery_threshold);
                    debug!(
                        service = %service.name(),
                        healthy = status.healthy,
                        consecutive_failures = status.consecutive_failures,
                        "Health check completed"
                    );
                }
                tokio::time::sleep(interval).await;
            }
        });

        if let Some(previous) = self.check_task.write().replace(handle) {
            previous.abort();
        }
        info!(interval_secs = interval_secs, "Started render service health checks");
    }

    /// Stop the background health-check loop
    pub fn stop(&self) {
        if let Some(handle) = self.check_task.write().take() {
            handle.abort();
            info!("Stopped render service health checks");
        }
    }

    pub fn status(&self) -> HealthStatus {
        self.status.read().clone()
    }

    pub fn is_healthy(&self) -> bool {
        self.status.read().healthy
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
