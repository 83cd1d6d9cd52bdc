//! Router construction

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;

use crate::api::handlers;
use crate::config::ServerConfig;
use crate::middleware::SubmissionRateLimitLayer;
use crate::AppState;

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let settings = state.settings.clone();

    let mut submission = Router::new()
        .route("/generate-first-image", post(handlers::generate_first_image))
        .route("/generate-next-image", post(handlers::generate_next_image))
        .route("/generate-image/tasks", post(handlers::submit_task));

    if settings.rate_limit.enabled {
        submission = submission.route_layer(SubmissionRateLimitLayer::from_config(&settings.rate_limit));
    }

    let lookups = Router::new()
        .route("/health", get(handlers::health))
        .route("/generate-image/task-status", get(handlers::task_status))
        .route("/generate-image/image-status", get(handlers::image_status))
        .route("/generate-image/get-results", get(handlers::task_results))
        .route("/generate-image/queue", get(handlers::queue_stats));

    Router::new()
        .merge(submission)
        .merge(lookups)
        .nest_service(
            &settings.storage.url_prefix,
            ServeDir::new(&settings.storage.base_path),
        )
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&settings.server))
        .with_state(state)
}

/// CORS from configured origins; unparsable origins are skipped, none means any origin
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
