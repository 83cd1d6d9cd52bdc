//! Main entry point for the Render Queue Gateway

use render_queue_gateway::{
    api,
    backend::{http_backend::HttpRenderService, traits::RenderService},
    config::{LoggingConfig, Settings},
    AppState,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Configuration first so the log level can come from it
    let settings = Settings::load()?;
    init_tracing(&settings.logging);

    info!("Starting Render Queue Gateway");
    info!(
        "Loaded configuration: server={}:{}, render service={}",
        settings.server.host, settings.server.port, settings.render.base_url
    );

    let render_service: Arc<dyn RenderService> = Arc::new(HttpRenderService::new(&settings.render)?);
    let health_interval = settings.render.health_check_interval_secs;
    let addr = format!("{}:{}", settings.server.host, settings.server.port);

    let app_state = Arc::new(AppState::new(settings, render_service)?);
    app_state.artifacts.ensure_storage_dir().await?;

    app_state.health_monitor.start(health_interval);

    // Single consumer of the task queue
    let scheduler = app_state.scheduler().spawn();

    let app = api::routes::create_router(app_state.clone());

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.abort();
    app_state.health_monitor.stop();
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
