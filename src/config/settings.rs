//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub render: RenderConfig,
    pub scheduler: SchedulerConfig,
    pub storage: StorageConfig,
    pub generation: GenerationConfig,
    pub colors: ColorConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins; empty means any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3500
}

/// External render service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderConfig {
    #[serde(default = "default_render_url")]
    pub base_url: String,
    /// Upper bound for a single render attempt
    #[serde(default = "default_render_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_progress_timeout")]
    pub progress_timeout_ms: u64,
    #[serde(default = "default_health_check_path")]
    pub health_check_path: String,
    #[serde(default = "default_health_check_interval")]
    pub health_check_interval_secs: u64,
}

fn default_render_url() -> String {
    "http://127.0.0.1:7860".to_string()
}

fn default_render_timeout() -> u64 {
    120_000
}

fn default_progress_timeout() -> u64 {
    10_000
}

fn default_health_check_path() -> String {
    "/internal/ping".to_string()
}

fn default_health_check_interval() -> u64 {
    30
}

impl RenderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Task scheduler configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Total render attempts per task, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub retry_backoff_ms: u64,
    #[serde(default)]
    pub retry_jitter_ms: u64,
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,
}

fn default_poll_interval() -> u64 {
    500
}

fn default_max_attempts() -> u32 {
    2
}

fn default_max_queue_size() -> usize {
    1000
}

/// Artifact storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub base_path: String,
    /// Path prefix under which stored artifacts are served and referenced
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
}

fn default_storage_path() -> String {
    "static/images".to_string()
}

fn default_url_prefix() -> String {
    "/static/images".to_string()
}

/// Generation request limits and defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    #[serde(default = "default_style")]
    pub default_style: String,
    #[serde(default = "default_max_images")]
    pub max_images: u32,
    /// Timeout for downloading image inputs given as URLs
    #[serde(default = "default_image_fetch_timeout")]
    pub image_fetch_timeout_ms: u64,
}

impl GenerationConfig {
    pub fn image_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.image_fetch_timeout_ms)
    }
}

fn default_style() -> String {
    "3D Model".to_string()
}

fn default_max_images() -> u32 {
    4
}

fn default_image_fetch_timeout() -> u64 {
    10_000
}

/// Colour-name lookup configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_color_api")]
    pub api_url: String,
    #[serde(default = "default_color_timeout")]
    pub timeout_ms: u64,
}

fn default_color_api() -> String {
    "https://www.thecolorapi.com".to_string()
}

fn default_color_timeout() -> u64 {
    5_000
}

/// Submission rate limiting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst")]
    pub burst_size: u32,
}

fn default_true() -> bool {
    true
}

fn default_rps() -> u32 {
    5
}

fn default_burst() -> u32 {
    20
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/default.toml")
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let defaults = Settings::default();
        let config = Config::builder()
            .add_source(Config::try_from(&defaults)?)
            .add_source(File::with_name(path.as_ref().to_str().unwrap_or("config/default")).required(false))
            // Override with environment variables (prefixed with RENDER_GATEWAY_)
            .add_source(
                Environment::with_prefix("RENDER_GATEWAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("Server port cannot be 0"));
        }

        if !self.render.base_url.starts_with("http://") && !self.render.base_url.starts_with("https://") {
            return Err(invalid(format!(
                "Render base URL '{}' must be an http(s) URL",
                self.render.base_url
            )));
        }

        if self.scheduler.max_attempts == 0 {
            return Err(invalid("scheduler.max_attempts must be at least 1"));
        }

        if self.scheduler.poll_interval_ms == 0 {
            return Err(invalid("scheduler.poll_interval_ms cannot be 0"));
        }

        if self.scheduler.max_queue_size == 0 {
            return Err(invalid("scheduler.max_queue_size cannot be 0"));
        }

        if !self.storage.url_prefix.starts_with('/') || self.storage.url_prefix.len() < 2 {
            return Err(invalid(format!(
                "storage.url_prefix '{}' must be an absolute path such as /static/images",
                self.storage.url_prefix
            )));
        }

        if self.generation.max_images == 0 {
            return Err(invalid("generation.max_images must be at least 1"));
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::Config(config::ConfigError::Message(message.into()))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                cors_origins: vec![],
            },
            render: RenderConfig {
                base_url: default_render_url(),
                timeout_ms: default_render_timeout(),
                progress_timeout_ms: default_progress_timeout(),
                health_check_path: default_health_check_path(),
                health_check_interval_secs: default_health_check_interval(),
            },
            scheduler: SchedulerConfig {
                poll_interval_ms: default_poll_interval(),
                max_attempts: default_max_attempts(),
                retry_backoff_ms: 0,
                retry_jitter_ms: 0,
                max_queue_size: default_max_queue_size(),
            },
            storage: StorageConfig {
                base_path: default_storage_path(),
                url_prefix: default_url_prefix(),
            },
            generation: GenerationConfig {
                default_style: default_style(),
                max_images: default_max_images(),
                image_fetch_timeout_ms: default_image_fetch_timeout(),
            },
            colors: ColorConfig {
                enabled: true,
                api_url: default_color_api(),
                timeout_ms: default_color_timeout(),
            },
            rate_limit: RateLimitConfig {
                enabled: true,
                requests_per_second: default_rps(),
                burst_size: default_burst(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
            },
        }
    }
}
