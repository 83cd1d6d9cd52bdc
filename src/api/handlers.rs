//! Route handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::types::{
    HealthResponse, ResultsFailedResponse, ResultsPendingResponse, ResultsReadyResponse,
    SubmitTaskRequest, SubmitTaskResponse, TaskIdQuery,
};
use crate::error::{AppError, Result};
use crate::generation::request::{FirstGenerationRequest, NextGenerationRequest};
use crate::generation::PreparedJob;
use crate::queue::{QueueStats, TaskId, TaskRecord, TaskResult};
use crate::AppState;

/// Missing id is a bad request; an id that cannot exist is simply not found
fn parse_task_id(query: &TaskIdQuery) -> Result<TaskId> {
    let raw = query
        .task_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("Task ID is required".to_string()))?;

    raw.parse::<TaskId>()
        .map_err(|_| AppError::TaskNotFound(raw.to_string()))
}

fn enqueue(state: &AppState, job: PreparedJob) -> Result<Json<SubmitTaskResponse>> {
    let task = state.store.enqueue(job.kind, job.parameters)?;
    Ok(Json(SubmitTaskResponse { task }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let status = if state.health_monitor.is_healthy() { "ok" } else { "degraded" };
    let render_service = state.health_monitor.status();

    Json(HealthResponse {
        status: status.to_string(),
        render_service,
        queue: state.store.stats(),
    })
}

pub async fn generate_first_image(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FirstGenerationRequest>,
) -> Result<Json<SubmitTaskResponse>> {
    debug!(
        images = request.number_of_images,
        colors = request.color_palette.len(),
        base_image = request.base_image.is_some(),
        style_reference = request.style_reference.is_some(),
        "First generation request"
    );
    let job = state.generation.prepare_first(request).await?;
    enqueue(&state, job)
}

pub async fn generate_next_image(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NextGenerationRequest>,
) -> Result<Json<SubmitTaskResponse>> {
    debug!(
        images = request.number_of_images,
        colors = request.color_palette.len(),
        mask = request.combined_mask.is_some(),
        style_reference = request.style_reference.is_some(),
        "Next generation request"
    );
    let job = state.generation.prepare_next(request).await?;
    enqueue(&state, job)
}

pub async fn submit_task(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubmitTaskRequest>,
) -> Result<Json<SubmitTaskResponse>> {
    if !request.parameters.is_object() {
        return Err(AppError::InvalidRequest(
            "parameters must be a JSON object".to_string(),
        ));
    }
    info!(kind = %request.kind, "Raw task submission");
    enqueue(
        &state,
        PreparedJob {
            kind: request.kind,
            parameters: request.parameters,
        },
    )
}

pub async fn task_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TaskIdQuery>,
) -> Result<Json<TaskRecord>> {
    let id = parse_task_id(&query)?;
    Ok(Json(state.queries.get_status(&id)?))
}

pub async fn image_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TaskIdQuery>,
) -> Result<Json<serde_json::Value>> {
    let id = parse_task_id(&query)?;
    let progress = state.queries.get_progress(&id).await?;
    Ok(Json(progress.into_json()))
}

pub async fn task_results(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TaskIdQuery>,
) -> Result<Response> {
    let id = parse_task_id(&query)?;
    let task = state.queries.get_status(&id)?;

    let response = match TaskResult::from(&task) {
        TaskResult::Ready { artifacts } => (
            StatusCode::OK,
            Json(ResultsReadyResponse {
                message: "Images retrieved.".to_string(),
                image_paths: artifacts,
            }),
        )
            .into_response(),
        TaskResult::Failed { error } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ResultsFailedResponse {
                error: "No images were generated.".to_string(),
                detail: error,
            }),
        )
            .into_response(),
        TaskResult::InProgress { status, position } => (
            StatusCode::ACCEPTED,
            Json(ResultsPendingResponse {
                message: format!("Task is {} at {}.", status, position),
                task,
            }),
        )
            .into_response(),
    };

    Ok(response)
}

pub async fn queue_stats(State(state): State<Arc<AppState>>) -> Json<QueueStats> {
    Json(state.store.stats())
}
