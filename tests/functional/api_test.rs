//! Functional tests for the HTTP API

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use render_queue_gateway::api::routes::create_router;
use render_queue_gateway::backend::traits::{RenderOutput, RenderService};
use render_queue_gateway::config::Settings;
use render_queue_gateway::error::{AppError, Result};
use render_queue_gateway::queue::{TaskKind, TaskOutcome};
use render_queue_gateway::AppState;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// Render service that never renders but reports fixed progress
struct IdleRenderer {
    progress_available: bool,
}

#[async_trait]
impl RenderService for IdleRenderer {
    fn name(&self) -> &str {
        "idle"
    }

    async fn render(&self, _kind: TaskKind, _parameters: &Value) -> Result<RenderOutput> {
        Err(AppError::BackendError("not rendering in tests".to_string()))
    }

    async fn progress(&self) -> Result<Map<String, Value>> {
        if !self.progress_available {
            return Err(AppError::ProgressUnavailable("connection refused".to_string()));
        }
        let mut live = Map::new();
        live.insert("progress".to_string(), json!(0.25));
        live.insert("eta_relative".to_string(), json!(12.0));
        Ok(live)
    }

    async fn health_check(&self) -> bool {
        true
    }
}

struct TestApp {
    state: Arc<AppState>,
    router: Router,
    dir: TempDir,
}

fn test_app_with(configure: impl FnOnce(&mut Settings), progress_available: bool) -> TestApp {
    let dir = TempDir::new().unwrap();
    let mut settings = Settings::default();
    settings.storage.base_path = dir.path().to_string_lossy().to_string();
    settings.colors.enabled = false;
    configure(&mut settings);

    let state = Arc::new(AppState::new(settings, Arc::new(IdleRenderer { progress_available })).unwrap());
    let router = create_router(state.clone());
    TestApp { state, router, dir }
}

fn test_app() -> TestApp {
    test_app_with(|_| {}, true)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn raw_task(prompt: &str) -> Value {
    json!({ "type": "txt2img", "parameters": { "prompt": prompt } })
}

#[tokio::test]
async fn test_submit_returns_queued_task() {
    let app = test_app();

    let (status, body) = send(&app.router, post_json("/generate-image/tasks", raw_task("a"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"]["status"], "pending");
    assert_eq!(body["task"]["position"], 1);
    assert_eq!(body["task"]["type"], "txt2img");
    assert!(body["task"]["result"].is_null());

    let (_, body) = send(&app.router, post_json("/generate-image/tasks", raw_task("b"))).await;
    assert_eq!(body["task"]["position"], 2);
}

#[tokio::test]
async fn test_generate_first_image() {
    let app = test_app();

    let request = json!({
        "prompt": "a wooden chair",
        "number_of_images": 2,
        "color_palette": ["#8B4513"]
    });
    let (status, body) = send(&app.router, post_json("/generate-first-image", request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"]["type"], "txt2img");
    assert_eq!(body["task"]["parameters"]["n_iter"], 2);

    let prompt = body["task"]["parameters"]["prompt"].as_str().unwrap();
    // Colour naming disabled: hex codes are used as-is
    assert!(prompt.contains("a wooden chair with colors #8B4513"));
}

#[tokio::test]
async fn test_generate_next_image_requires_init_image() {
    let app = test_app();

    let (status, body) = send(
        &app.router,
        post_json("/generate-next-image", json!({ "prompt": "a sofa" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_request_error");

    let (status, body) = send(
        &app.router,
        post_json(
            "/generate-next-image",
            json!({ "prompt": "a sofa", "init_image": "aGVsbG8=" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"]["type"], "img2img");
}

#[tokio::test]
async fn test_invalid_submissions_are_rejected() {
    let app = test_app();

    let (status, _) = send(
        &app.router,
        post_json("/generate-first-image", json!({ "prompt": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app.router,
        post_json("/generate-image/tasks", json!({ "type": "txt2img", "parameters": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.state.store.pending_snapshot().is_empty());
}

#[tokio::test]
async fn test_task_status_lookup() {
    let app = test_app();
    let task = app
        .state
        .store
        .enqueue(TaskKind::TextToImage, json!({"prompt": "a"}))
        .unwrap();

    let (status, body) = send(
        &app.router,
        get(&format!("/generate-image/task-status?task_id={}", task.id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task_id"], task.id.to_string());
    assert_eq!(body["status"], "pending");

    let (status, body) = send(
        &app.router,
        get(&format!("/generate-image/task-status?task_id={}", uuid::Uuid::new_v4())),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "task_not_found");

    let (status, _) = send(&app.router, get("/generate-image/task-status?task_id=not-a-uuid")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_task_id_is_bad_request() {
    let app = test_app();

    for uri in [
        "/generate-image/task-status",
        "/generate-image/image-status",
        "/generate-image/get-results",
        "/generate-image/get-results?task_id=",
    ] {
        let (status, body) = send(&app.router, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Task ID is required"));
    }
}

#[tokio::test]
async fn test_results_for_pending_task() {
    let app = test_app();
    let store = &app.state.store;
    store.enqueue(TaskKind::TextToImage, json!({"prompt": "a"})).unwrap();
    let b = store.enqueue(TaskKind::TextToImage, json!({"prompt": "b"})).unwrap();

    let (status, body) = send(
        &app.router,
        get(&format!("/generate-image/get-results?task_id={}", b.id)),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["message"], "Task is pending at 2.");
    assert_eq!(body["task"]["task_id"], b.id.to_string());
    assert_eq!(body["task"]["position"], 2);
}

#[tokio::test]
async fn test_results_for_finished_tasks() {
    let app = test_app();
    let store = &app.state.store;
    let a = store.enqueue(TaskKind::TextToImage, json!({"prompt": "a"})).unwrap();
    let b = store.enqueue(TaskKind::TextToImage, json!({"prompt": "b"})).unwrap();

    store.claim_next().unwrap();
    store
        .complete(
            &a.id,
            TaskOutcome::Success(vec![
                "/static/images/one.png".to_string(),
                "/static/images/two.png".to_string(),
            ]),
        )
        .unwrap();
    store.claim_next().unwrap();
    store
        .complete(&b.id, TaskOutcome::Failed("render service unreachable".to_string()))
        .unwrap();

    let (status, body) = send(
        &app.router,
        get(&format!("/generate-image/get-results?task_id={}", a.id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Images retrieved.");
    assert_eq!(
        body["image_paths"],
        json!(["/static/images/one.png", "/static/images/two.png"])
    );

    let (status, body) = send(
        &app.router,
        get(&format!("/generate-image/get-results?task_id={}", b.id)),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "No images were generated.");
    assert_eq!(body["detail"], "render service unreachable");
}

#[tokio::test]
async fn test_image_status_merges_progress() {
    let app = test_app();
    let task = app
        .state
        .store
        .enqueue(TaskKind::TextToImage, json!({"prompt": "a"}))
        .unwrap();
    app.state.store.claim_next().unwrap();

    let (status, body) = send(
        &app.router,
        get(&format!("/generate-image/image-status?task_id={}", task.id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task_id"], task.id.to_string());
    assert_eq!(body["status"], "running");
    assert_eq!(body["position"], 1);
    assert_eq!(body["progress"], 0.25);
}

#[tokio::test]
async fn test_image_status_when_progress_unavailable() {
    let app = test_app_with(|_| {}, false);
    let task = app
        .state
        .store
        .enqueue(TaskKind::TextToImage, json!({"prompt": "a"}))
        .unwrap();

    let (status, body) = send(
        &app.router,
        get(&format!("/generate-image/image-status?task_id={}", task.id)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "progress_unavailable");
}

#[tokio::test]
async fn test_health_and_queue_stats() {
    let app = test_app();
    app.state
        .store
        .enqueue(TaskKind::TextToImage, json!({"prompt": "a"}))
        .unwrap();

    let (status, body) = send(&app.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["queue"]["pending"], 1);

    let (status, body) = send(&app.router, get("/generate-image/queue")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pending"], 1);
    assert_eq!(body["running"], 0);
}

#[tokio::test]
async fn test_artifacts_are_served() {
    let app = test_app();
    std::fs::write(app.dir.path().join("render.png"), b"png bytes").unwrap();

    let response = app
        .router
        .clone()
        .oneshot(get("/static/images/render.png"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"png bytes");

    let (status, _) = send(&app.router, get("/static/images/missing.png")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_submission_rate_limit() {
    let app = test_app_with(
        |settings| {
            settings.rate_limit.requests_per_second = 1;
            settings.rate_limit.burst_size = 1;
        },
        true,
    );

    let (status, _) = send(&app.router, post_json("/generate-image/tasks", raw_task("a"))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app.router, post_json("/generate-image/tasks", raw_task("b"))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "rate_limit_exceeded");

    // Lookups are never throttled
    for _ in 0..5 {
        let (status, _) = send(&app.router, get("/generate-image/queue")).await;
        assert_eq!(status, StatusCode::OK);
    }
}
