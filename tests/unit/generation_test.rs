//! Unit tests for request preparation: styles, colour naming and payloads

use render_queue_gateway::artifact::{base64, ArtifactStore};
use render_queue_gateway::config::{ColorConfig, Settings};
use render_queue_gateway::error::AppError;
use render_queue_gateway::generation::color::ColorNamer;
use render_queue_gateway::generation::request::{FirstGenerationRequest, NextGenerationRequest};
use render_queue_gateway::generation::source::ImageResolver;
use render_queue_gateway::generation::style::StyleCatalog;
use render_queue_gateway::generation::GenerationService;
use render_queue_gateway::queue::TaskKind;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn color_config(api_url: &str, enabled: bool) -> ColorConfig {
    ColorConfig {
        enabled,
        api_url: api_url.to_string(),
        timeout_ms: 1000,
    }
}

fn service_with(colors: ColorConfig, artifacts: Arc<ArtifactStore>) -> GenerationService {
    GenerationService::new(
        StyleCatalog::default(),
        ColorNamer::new(&colors).unwrap(),
        ImageResolver::new(artifacts, Duration::from_secs(2)).unwrap(),
        Settings::default().generation,
    )
}

fn service(colors: ColorConfig) -> GenerationService {
    let artifacts = ArtifactStore::new(std::env::temp_dir().join("render-gateway-unused"), "/static/images");
    service_with(colors, Arc::new(artifacts))
}

fn colors_off() -> ColorConfig {
    color_config("http://127.0.0.1:9", false)
}

#[tokio::test]
async fn test_color_names_resolved_and_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/id"))
        .and(query_param("hex", "FF0000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": { "value": "Red" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let namer = ColorNamer::new(&color_config(&server.uri(), true)).unwrap();
    assert_eq!(namer.name_for("#ff0000").await, "Red");
    // Second lookup is served from the cache
    assert_eq!(namer.name_for("FF0000").await, "Red");
}

#[tokio::test]
async fn test_color_lookup_failure_falls_back_to_hex() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/id"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let namer = ColorNamer::new(&color_config(&server.uri(), true)).unwrap();
    let names = namer
        .describe(&["#00FF00".to_string(), "#0000FF".to_string()])
        .await;
    assert_eq!(names, vec!["#00FF00".to_string(), "#0000FF".to_string()]);
}

#[tokio::test]
async fn test_prepare_first_builds_txt2img_job() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": { "value": "Crimson" }
        })))
        .mount(&server)
        .await;

    let generation = service(color_config(&server.uri(), true));
    let job = generation
        .prepare_first(FirstGenerationRequest {
            prompt: "  a teapot ".to_string(),
            number_of_images: 2,
            color_palette: vec!["#DC143C".to_string()],
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(job.kind, TaskKind::TextToImage);
    let prompt = job.parameters["prompt"].as_str().unwrap();
    assert!(prompt.contains("a teapot with colors Crimson"));
    assert!(prompt.starts_with("professional 3d model of"));
    assert_eq!(job.parameters["n_iter"], 2);
    assert_eq!(job.parameters["steps"], 30);
    assert!(job.parameters.get("alwayson_scripts").is_none());
}

#[tokio::test]
async fn test_prepare_first_with_base_image_adds_controlnet() {
    let generation = service(colors_off());
    let job = generation
        .prepare_first(FirstGenerationRequest {
            prompt: "a chair".to_string(),
            number_of_images: 1,
            base_image: Some("data:image/png;base64,aGVsbG8=".to_string()),
            style: Some("base".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(job.parameters["prompt"], "a chair");
    let args = &job.parameters["alwayson_scripts"]["controlnet"]["args"];
    assert_eq!(args.as_array().unwrap().len(), 1);
    // Data URL prefix is stripped before forwarding
    assert_eq!(args[0]["image"], "aGVsbG8=");
}

#[tokio::test]
async fn test_prepare_first_rejects_invalid_requests() {
    let generation = service(colors_off());

    let empty_prompt = generation
        .prepare_first(FirstGenerationRequest {
            prompt: "   ".to_string(),
            number_of_images: 1,
            ..Default::default()
        })
        .await;
    assert!(matches!(empty_prompt, Err(AppError::InvalidRequest(_))));

    let too_many = generation
        .prepare_first(FirstGenerationRequest {
            prompt: "a lamp".to_string(),
            number_of_images: 50,
            ..Default::default()
        })
        .await;
    assert!(matches!(too_many, Err(AppError::InvalidRequest(_))));

    let bad_image = generation
        .prepare_first(FirstGenerationRequest {
            prompt: "a lamp".to_string(),
            number_of_images: 1,
            base_image: Some("not base64 at all!".to_string()),
            ..Default::default()
        })
        .await;
    assert!(matches!(bad_image, Err(AppError::InvalidRequest(_))));
}

#[tokio::test]
async fn test_prepare_next_builds_img2img_job() {
    let generation = service(colors_off());
    let job = generation
        .prepare_next(NextGenerationRequest {
            prompt: "a red sofa".to_string(),
            number_of_images: 1,
            init_image: "aGVsbG8=".to_string(),
            combined_mask: Some("bWFzaw==".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(job.kind, TaskKind::ImageToImage);
    assert_eq!(job.parameters["init_images"][0], "aGVsbG8=");
    assert_eq!(job.parameters["mask"], "bWFzaw==");
    assert_eq!(job.parameters["steps"], 40);
}

#[tokio::test]
async fn test_prepare_next_requires_init_image() {
    let generation = service(colors_off());
    let result = generation
        .prepare_next(NextGenerationRequest {
            prompt: "a red sofa".to_string(),
            number_of_images: 1,
            ..Default::default()
        })
        .await;
    assert!(matches!(result, Err(AppError::InvalidRequest(_))));
}

#[tokio::test]
async fn test_stored_image_reference_is_inlined() {
    let dir = TempDir::new().unwrap();
    let artifacts = Arc::new(ArtifactStore::new(dir.path(), "/static/images"));
    let previous = artifacts.save_raw(b"previous render", "png").await.unwrap();

    let generation = service_with(colors_off(), artifacts);
    let job = generation
        .prepare_next(NextGenerationRequest {
            prompt: "same room, blue walls".to_string(),
            number_of_images: 1,
            init_image: previous,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(job.parameters["init_images"][0], base64::encode(b"previous render"));

    let missing = generation
        .prepare_next(NextGenerationRequest {
            prompt: "same room".to_string(),
            number_of_images: 1,
            init_image: "/static/images/gone.png".to_string(),
            ..Default::default()
        })
        .await;
    assert!(matches!(missing, Err(AppError::InvalidRequest(_))));
}

#[tokio::test]
async fn test_image_url_is_downloaded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/inputs/room.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"remote image bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/inputs/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let generation = service(colors_off());
    let job = generation
        .prepare_next(NextGenerationRequest {
            prompt: "a brighter room".to_string(),
            number_of_images: 1,
            init_image: format!("{}/inputs/room.png", server.uri()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(job.parameters["init_images"][0], base64::encode(b"remote image bytes"));

    let not_found = generation
        .prepare_first(FirstGenerationRequest {
            prompt: "a lamp".to_string(),
            number_of_images: 1,
            style_reference: Some(format!("{}/inputs/missing.png", server.uri())),
            ..Default::default()
        })
        .await;
    assert!(matches!(not_found, Err(AppError::InvalidRequest(_))));
}
