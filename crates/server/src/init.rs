//! Model initialization
//!
//! Loads the speech model in the background and reports coarse progress
//! through the engine status. Failure is recorded, never fatal.

use std::sync::Arc;
use std::time::Instant;

use narrator_config::{BackendKind, SynthesisConfig};
use narrator_core::{ModelLoader, SynthesisError};
use narrator_pipeline::backends::{RemoteConfig, RemoteLoader, SimpleLoader};
use narrator_pipeline::{default_sources, discover_voices, SynthesisAdapter};

use crate::state::AppState;

/// Loader for the configured backend
pub fn build_loader(config: &SynthesisConfig) -> Arc<dyn ModelLoader> {
    match config.backend {
        BackendKind::Remote => Arc::new(RemoteLoader::new(RemoteConfig {
            base_url: config.base_url.clone(),
            sample_rate: config.sample_rate,
            request_timeout: config.request_timeout(),
        })),
        BackendKind::Simple => Arc::new(SimpleLoader::new(config.sample_rate)),
    }
}

/// Start initialization in the background
///
/// Returns the attempt's generation, or `None` if an attempt is running.
pub fn spawn_initialization(state: &AppState) -> Option<u64> {
    let generation = state.engine.begin_init()?;
    let state = state.clone();

    tokio::spawn(async move {
        // outcome is recorded in the engine status
        let _ = run_initialization(&state, generation).await;
    });

    Some(generation)
}

/// Run initialization attempt `generation` to completion
pub async fn run_initialization(state: &AppState, generation: u64) -> Result<(), SynthesisError> {
    let synthesis = &state.config.synthesis;
    let started = Instant::now();

    tracing::info!(
        model_id = %synthesis.model_id,
        backend = ?synthesis.backend,
        generation,
        "Initializing speech model"
    );

    state.engine.advance(generation, 10, "Downloading model...");

    let model = match state.loader.from_pretrained(&synthesis.model_id).await {
        Ok(model) => model,
        Err(e) => {
            tracing::error!(error = %e, generation, "Model initialization failed");
            // keep the voice list usable for display
            let sources = default_sources(None, state.config.voices.configured.clone());
            let fallback = discover_voices(&sources).await.catalog;
            if !state.engine.fail_with_catalog(generation, &e, fallback) {
                tracing::warn!(generation, "Failed attempt superseded by a newer one");
            }

            crate::metrics::record_model_ready(false);
            return Err(e);
        }
    };

    state.engine.advance(generation, 90, "Loading model...");

    let adapter = SynthesisAdapter::new(model.clone())
        .with_concurrency(synthesis.max_concurrent_requests)
        .with_chunk_timeout(synthesis.chunk_timeout());

    let sources = default_sources(Some(model), state.config.voices.configured.clone());
    let discovery = discover_voices(&sources).await;
    let voice_count = discovery.catalog.len();

    if state.engine.complete(generation, adapter, discovery.catalog) {
        crate::metrics::record_model_ready(true);
        crate::metrics::record_voices_available(voice_count);
        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            voices = voice_count,
            voice_source = discovery.source,
            "Model loaded successfully"
        );
    } else {
        tracing::warn!(generation, "Initialization superseded by a newer attempt");
    }

    Ok(())
}
