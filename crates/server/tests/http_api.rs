//! HTTP API tests, exercising the router in-process

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use narrator_config::{BackendKind, Settings};
use narrator_core::{
    GenerateOptions, ModelLoader, RawAudio, SpeechModel, SynthesisError,
};
use narrator_server::{create_router, run_initialization, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn simple_settings() -> Settings {
    let mut settings = Settings::default();
    settings.synthesis.backend = BackendKind::Simple;
    settings
}

async fn ready_state(settings: Settings) -> AppState {
    let state = AppState::new(settings);
    let generation = state.engine.begin_init().unwrap();
    run_initialization(&state, generation).await.unwrap();
    state
}

async fn ready_with_loader(settings: Settings, loader: Arc<dyn ModelLoader>) -> AppState {
    let state = AppState::with_loader(settings, loader);
    let generation = state.engine.begin_init().unwrap();
    run_initialization(&state, generation).await.unwrap();
    state
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body)
}

async fn send_json(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, _, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

const BOUNDARY: &str = "narrator-test-boundary";

fn multipart_upload(field: &str, filename: &str, contents: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload-file")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Model that can be told to stall or fail
struct ScriptedModel {
    delay: Duration,
    fail: bool,
}

#[async_trait::async_trait]
impl SpeechModel for ScriptedModel {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, text: &str, _: &GenerateOptions) -> Result<RawAudio, SynthesisError> {
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(SynthesisError::Backend("voice pack corrupted".into()));
        }
        Ok(RawAudio::new(vec![0.0; text.len()], 24000))
    }
}

struct ScriptedLoader {
    delay: Duration,
    fail: bool,
}

#[async_trait::async_trait]
impl ModelLoader for ScriptedLoader {
    async fn from_pretrained(&self, _: &str) -> Result<Arc<dyn SpeechModel>, SynthesisError> {
        Ok(Arc::new(ScriptedModel {
            delay: self.delay,
            fail: self.fail,
        }))
    }
}

#[tokio::test]
async fn test_generate_returns_wav() {
    let app = create_router(ready_state(simple_settings()).await);

    let (status, headers, body) = send(
        app,
        post_json(
            "/generate",
            json!({"text": "Hello world. This is narrator.", "voice": "bf_emma", "quality": "fast"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "audio/wav");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"tts-bf_emma-fast.wav\""
    );
    assert!(headers.contains_key("x-request-id"));

    let reader = hound::WavReader::new(Cursor::new(body.to_vec())).unwrap();
    assert_eq!(reader.spec().sample_rate, 24000);
    assert_eq!(reader.spec().channels, 1);
    assert!(reader.len() > 0);
}

#[tokio::test]
async fn test_generate_uses_defaults() {
    let app = create_router(ready_state(simple_settings()).await);
    let (status, headers, _) = send(app, post_json("/generate", json!({"text": "Hi."}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"tts-af_heart-balanced.wav\""
    );
}

#[tokio::test]
async fn test_unknown_voice_rejected() {
    let app = create_router(ready_state(simple_settings()).await);
    let (status, body) = send_json(
        app,
        post_json("/generate", json!({"text": "Hello", "voice": "unknown_voice"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("unknown_voice"));
    assert_eq!(body["code"], "INVALID_VOICE");
    let voices = body["availableVoices"].as_array().unwrap();
    assert_eq!(voices.len(), 28);
    assert!(voices.contains(&json!("af_heart")));
}

#[tokio::test]
async fn test_loading_model_returns_503() {
    let state = AppState::new(simple_settings());
    state.engine.begin_init().unwrap();
    let app = create_router(state);

    let (status, body) = send_json(app, post_json("/generate", json!({"text": "Hello"}))).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Model is still loading. Please wait...");
    assert_eq!(body["modelStatus"]["loading"], true);
    assert_eq!(body["modelStatus"]["progress"], 0);
    assert_eq!(body["modelStatus"]["message"], "Starting model initialization...");
}

#[tokio::test]
async fn test_missing_text_checked_before_readiness() {
    let state = AppState::new(simple_settings());
    state.engine.begin_init().unwrap();
    let app = create_router(state);

    let (status, body) = send_json(app, post_json("/generate", json!({"text": "   "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Text is required");
    assert_eq!(body["code"], "MISSING_TEXT");
}

#[tokio::test]
async fn test_uninitialized_model_returns_500() {
    let state = AppState::new(simple_settings());
    let generation = state.engine.begin_init().unwrap();
    state.engine.fail(generation, "weights missing");
    let app = create_router(state);

    let (status, body) = send_json(app, post_json("/generate", json!({"text": "Hello"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "TTS not initialized. Please check server logs.");
    assert_eq!(body["modelStatus"]["message"], "Error: weights missing");
}

#[tokio::test]
async fn test_unknown_quality_rejected() {
    let app = create_router(ready_state(simple_settings()).await);
    let (status, body) = send_json(
        app,
        post_json("/generate", json!({"text": "Hello", "quality": "ultra"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_QUALITY");
    assert_eq!(body["availableQualities"], json!(["fast", "balanced", "high", "premium"]));
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let app = create_router(ready_state(simple_settings()).await);
    let request = Request::builder()
        .method("POST")
        .uri("/generate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"text\": "))
        .unwrap();

    let (status, body) = send_json(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_synthesis_failure_returns_details() {
    let state = ready_with_loader(
        simple_settings(),
        Arc::new(ScriptedLoader {
            delay: Duration::ZERO,
            fail: true,
        }),
    )
    .await;
    let app = create_router(state);

    let (status, body) = send_json(app, post_json("/generate", json!({"text": "Hello"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to generate speech");
    assert_eq!(body["details"], "backend error: voice pack corrupted");
}

#[tokio::test(start_paused = true)]
async fn test_chunk_timeout_returns_504() {
    let mut settings = simple_settings();
    settings.synthesis.chunk_timeout_seconds = Some(1);
    let state = ready_with_loader(
        settings,
        Arc::new(ScriptedLoader {
            delay: Duration::from_secs(30),
            fail: false,
        }),
    )
    .await;
    let app = create_router(state);

    let (status, body) = send_json(app, post_json("/generate", json!({"text": "Hello"}))).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["code"], "SYNTHESIS_TIMEOUT");
}

#[tokio::test]
async fn test_upload_text_file() {
    let app = create_router(ready_state(simple_settings()).await);
    let (status, body) = send_json(
        app,
        multipart_upload("file", "chapter.txt", "It was a dark night. Café!".as_bytes()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["text"], "It was a dark night. Café!");
    assert_eq!(body["filename"], "chapter.txt");
    assert_eq!(body["length"], 26);
}

#[tokio::test]
async fn test_upload_rejections() {
    let state = ready_state(simple_settings()).await;

    let (status, body) =
        send_json(create_router(state.clone()), multipart_upload("file", "book.pdf", b"%PDF")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "PDF files are not supported yet. Please convert to .txt file.");

    let (status, body) =
        send_json(create_router(state.clone()), multipart_upload("file", "empty.txt", b" \n")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "File is empty or could not be read");

    let (status, body) =
        send_json(create_router(state.clone()), multipart_upload("other", "a.txt", b"hi")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded");

    let (status, body) = send_json(
        create_router(state),
        post_json("/upload-file", json!({"text": "not multipart"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "UPLOAD_REJECTED");
}

#[tokio::test]
async fn test_upload_too_large() {
    let mut settings = simple_settings();
    settings.upload.max_bytes = 16;
    let app = create_router(ready_state(settings).await);

    let (status, body) = send_json(app, multipart_upload("file", "big.txt", &[b'a'; 64])).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn test_settings() {
    let app = create_router(ready_state(simple_settings()).await);
    let (status, body) = send_json(app, get("/settings")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalVoices"], 28);
    assert_eq!(body["voices"]["af_heart"], "Heart ❤️ (Premium)");
    assert_eq!(body["voices"]["af_nicole"], "Nicole 🎧");
    assert_eq!(body["voiceCategories"]["uk_male"].as_array().unwrap().len(), 4);
    assert_eq!(body["voiceCategories"]["other"], json!([]));
    assert_eq!(body["qualitySettings"]["fast"]["speed"], 1.2);
    assert_eq!(body["qualitySettings"]["balanced"]["speed"], 1.0);
    assert_eq!(body["maxChunkLength"], 500);
    assert_eq!(body["modelStatus"]["progress"], 100);
}

#[tokio::test]
async fn test_health() {
    let app = create_router(ready_state(simple_settings()).await);
    let (status, body) = send_json(app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["ttsInitialized"], true);
    assert_eq!(body["availableVoices"], 28);
    assert_eq!(body["maxChunkLength"], 500);
    assert_eq!(body["modelStatus"]["message"], "Model loaded successfully!");
    assert!(chrono::DateTime::parse_from_rfc3339(body["timestamp"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn test_health_before_initialization() {
    let app = create_router(AppState::new(simple_settings()));
    let (status, body) = send_json(app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ttsInitialized"], false);
    assert_eq!(body["availableVoices"], 0);
    assert_eq!(body["modelStatus"]["message"], "Not initialized");
}

#[tokio::test]
async fn test_reload_conflicts_while_loading() {
    let state = AppState::new(simple_settings());
    state.engine.begin_init().unwrap();

    let (status, body) = send_json(create_router(state), post_json("/model/reload", json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_reload_reinitializes() {
    let state = ready_state(simple_settings()).await;

    let (status, body) =
        send_json(create_router(state.clone()), post_json("/model/reload", json!({}))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["generation"], 2);

    for _ in 0..200 {
        if state.engine.status().is_ready() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let snapshot = state.engine.snapshot();
    assert_eq!(snapshot.generation, 2);
    assert!(snapshot.status.is_ready());
}

#[tokio::test]
async fn test_metrics_route_disabled() {
    let mut settings = simple_settings();
    settings.observability.metrics_enabled = false;
    let app = create_router(AppState::new(settings));

    let (status, _, _) = send(app, get("/metrics")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
