//! HTTP Endpoints
//!
//! REST API for speech generation.

use std::time::Instant;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
        DefaultBodyLimit, Json, Multipart, State,
    },
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use narrator_config::ServerConfig;
use narrator_core::quality::QualityTable;
use narrator_core::voice::{VoiceCategories, VoiceNames};
use narrator_core::{ModelStatus, QualityProfile, ValidationError};
use narrator_pipeline::{RequestStage, SpeechRequest};
use serde::Serialize;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::metrics::{self, metrics_handler};
use crate::state::AppState;
use crate::upload::{decode_upload, UploadError, UploadResponse};
use crate::{init, ServerError};

/// Room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.upload.max_bytes;

    let mut router: Router<AppState> = Router::new()
        // Speech
        .route(
            "/generate",
            post(generate).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(
            "/upload-file",
            post(upload_file).layer(DefaultBodyLimit::max(body_limit + MULTIPART_OVERHEAD)),
        )

        // Discovery
        .route("/settings", get(settings))
        .route("/health", get(health_check))

        // Operations
        .route("/model/reload", post(reload_model));

    if state.config.observability.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    // Middleware
    router = router
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if state.config.server.cors_enabled {
        router = router.layer(cors_layer(&state.config.server));
    }

    router.with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.cors_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

/// Generate speech
async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<SpeechRequest>, JsonRejection>,
) -> Result<Response, ServerError> {
    metrics::record_request("generate");
    let started = Instant::now();

    let Json(request) = payload.map_err(|rejection| {
        ServerError::from(ValidationError::InvalidBody(rejection.body_text()))
    })?;

    let request_id = Uuid::new_v4();
    let ctx = state.engine.request_context();
    let mut chunk_started: Option<Instant> = None;

    let output = state
        .orchestrator
        .generate_observed(request, &ctx, |stage| {
            if let Some(at) = chunk_started.take() {
                if stage != RequestStage::Failed {
                    metrics::record_chunk_latency(at.elapsed().as_secs_f64());
                }
            }
            if matches!(stage, RequestStage::Synthesizing { .. }) {
                chunk_started = Some(Instant::now());
            }
        })
        .instrument(tracing::info_span!("speech_request", %request_id))
        .await?;

    metrics::record_generation(started.elapsed().as_secs_f64(), output.duration_secs());

    let disposition = format!("attachment; filename=\"{}\"", output.filename);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "audio/wav".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (header::HeaderName::from_static("x-request-id"), request_id.to_string()),
        ],
        output.wav.into_bytes(),
    )
        .into_response())
}

/// Accept a text file and return its contents
async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ServerError> {
    metrics::record_request("upload_file");
    let limit = state.config.upload.max_bytes;

    let mut multipart = multipart.map_err(|_| UploadError::NoFile)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload.txt").to_string();
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
        if bytes.len() > limit {
            return Err(UploadError::TooLarge { limit }.into());
        }

        let upload = decode_upload(&filename, &bytes)?;
        tracing::info!(
            filename = %upload.filename,
            chars = upload.text.chars().count(),
            "File uploaded"
        );
        return Ok(Json(upload.into()));
    }

    Err(UploadError::NoFile.into())
}

fn multipart_error(err: MultipartError, limit: usize) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge { limit }
    } else {
        UploadError::Malformed(err.body_text())
    }
}

/// Settings response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SettingsResponse<'a> {
    voices: VoiceNames<'a>,
    voice_categories: VoiceCategories<'a>,
    quality_settings: QualityTable,
    total_voices: usize,
    max_chunk_length: usize,
    model_status: ModelStatus,
}

/// Voices, qualities and model status for clients
async fn settings(State(state): State<AppState>) -> Response {
    metrics::record_request("settings");
    let catalog = state.engine.catalog();

    Json(SettingsResponse {
        voices: catalog.names(),
        voice_categories: catalog.categories(),
        quality_settings: QualityProfile::table(),
        total_voices: catalog.len(),
        max_chunk_length: state.config.synthesis.max_chunk_length,
        model_status: state.engine.status(),
    })
    .into_response()
}

/// Health response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    tts_initialized: bool,
    available_voices: usize,
    max_chunk_length: usize,
    timestamp: String,
    model_status: ModelStatus,
}

/// Health check
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    metrics::record_request("health");
    let snapshot = state.engine.snapshot();

    Json(HealthResponse {
        status: "OK",
        tts_initialized: snapshot.adapter.is_some(),
        available_voices: state.engine.catalog().len(),
        max_chunk_length: state.config.synthesis.max_chunk_length,
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        model_status: snapshot.status,
    })
}

/// Reload accepted response
#[derive(Serialize)]
struct ReloadResponse {
    status: &'static str,
    generation: u64,
}

/// Reinitialize the speech model in the background
async fn reload_model(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ReloadResponse>), ServerError> {
    metrics::record_request("model_reload");

    match init::spawn_initialization(&state) {
        Some(generation) => {
            tracing::info!(generation, "Model reload requested");
            Ok((
                StatusCode::ACCEPTED,
                Json(ReloadResponse {
                    status: "accepted",
                    generation,
                }),
            ))
        }
        None => Err(ServerError::Conflict(
            "Model initialization already in progress".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use narrator_config::Settings;

    #[test]
    fn test_router_creation() {
        let state = AppState::new(Settings::default());
        let _ = create_router(state);
    }

    #[test]
    fn test_router_with_restricted_cors() {
        let mut settings = Settings::default();
        settings.server.cors_origins = vec!["http://localhost:8080".into(), "bad\norigin".into()];
        settings.observability.metrics_enabled = false;
        let _ = create_router(AppState::new(settings));
    }
}
