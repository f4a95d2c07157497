//! Observability Metrics
//!
//! Prometheus metrics endpoint for monitoring.

use std::sync::OnceLock;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;

/// Global Prometheus handle
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize metrics recorder
///
/// Call once at startup; a second call fails because the global recorder is
/// already installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    register_default_metrics();

    METRICS_HANDLE.get_or_init(|| handle.clone());
    Ok(handle)
}

/// Get the global metrics handle
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Register default application metrics
fn register_default_metrics() {
    gauge!("narrator_model_ready").set(0.0);
    gauge!("narrator_voices_available").set(0.0);

    for endpoint in ["generate", "upload_file", "settings", "health", "model_reload"] {
        counter!("narrator_requests_total", "endpoint" => endpoint).absolute(0);
    }

    counter!("narrator_chunks_synthesized_total").absolute(0);
    histogram!("narrator_chunk_synthesis_seconds").record(0.0);
    histogram!("narrator_request_duration_seconds").record(0.0);
    histogram!("narrator_audio_duration_seconds").record(0.0);
}

/// Record request to endpoint
pub fn record_request(endpoint: &'static str) {
    counter!("narrator_requests_total", "endpoint" => endpoint).increment(1);
}

/// Record one synthesized chunk
pub fn record_chunk_latency(duration_secs: f64) {
    counter!("narrator_chunks_synthesized_total").increment(1);
    histogram!("narrator_chunk_synthesis_seconds").record(duration_secs);
}

/// Record a completed speech request
pub fn record_generation(duration_secs: f64, audio_secs: f64) {
    histogram!("narrator_request_duration_seconds").record(duration_secs);
    histogram!("narrator_audio_duration_seconds").record(audio_secs);
}

/// Record error by code
pub fn record_error(code: &'static str) {
    counter!("narrator_errors_total", "code" => code).increment(1);
}

pub fn record_model_ready(ready: bool) {
    gauge!("narrator_model_ready").set(if ready { 1.0 } else { 0.0 });
}

pub fn record_voices_available(count: usize) {
    gauge!("narrator_voices_available").set(count as f64);
}

/// Metrics endpoint handler
///
/// Returns Prometheus-formatted metrics.
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    record_voices_available(state.engine.catalog().len());

    match get_metrics_handle() {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            handle.render(),
        ),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            "Metrics not initialized".to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_helpers() {
        // no recorder installed; these must not panic
        record_request("generate");
        record_chunk_latency(0.1);
        record_generation(0.5, 2.0);
        record_error("SYNTHESIS_FAILED");
        record_model_ready(true);
        record_voices_available(28);
    }
}
