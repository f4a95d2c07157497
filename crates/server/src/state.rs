//! Application State
//!
//! Shared state across all handlers. The [`Engine`] owns everything that
//! changes at runtime: the model status, the loaded model and the voice
//! catalog. Handlers take snapshots; only the initialization task writes.

use std::sync::Arc;

use narrator_config::Settings;
use narrator_core::{ModelLoader, ModelStatus, VoiceCatalog};
use narrator_pipeline::{
    OrchestratorConfig, RequestContext, SpeechOrchestrator, SynthesisAdapter,
};
use parking_lot::RwLock;

use crate::init::build_loader;

/// Consistent view of the model side of the engine
#[derive(Debug, Clone, Default)]
pub struct EngineSnapshot {
    /// Bumped on every initialization attempt
    pub generation: u64,
    pub status: ModelStatus,
    pub adapter: Option<SynthesisAdapter>,
}

/// Runtime state of the speech engine
#[derive(Debug, Default)]
pub struct Engine {
    snapshot: RwLock<EngineSnapshot>,
    catalog: RwLock<Arc<VoiceCatalog>>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.snapshot.read().clone()
    }

    pub fn status(&self) -> ModelStatus {
        self.snapshot.read().status.clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.snapshot.read().adapter.is_some()
    }

    pub fn catalog(&self) -> Arc<VoiceCatalog> {
        self.catalog.read().clone()
    }

    /// Everything a speech request is validated against
    pub fn request_context(&self) -> RequestContext {
        let snapshot = self.snapshot();
        RequestContext {
            status: snapshot.status,
            adapter: snapshot.adapter,
            catalog: self.catalog(),
        }
    }

    /// Start a new initialization attempt
    ///
    /// Returns the attempt's generation, or `None` if one is already running.
    pub fn begin_init(&self) -> Option<u64> {
        let mut snapshot = self.snapshot.write();
        if snapshot.status.loading {
            return None;
        }
        snapshot.generation += 1;
        snapshot.status = ModelStatus::starting();
        Some(snapshot.generation)
    }

    /// Report progress of the attempt `generation`
    ///
    /// Stale attempts and backwards progress are ignored.
    pub fn advance(&self, generation: u64, progress: u8, message: &str) -> bool {
        let mut snapshot = self.snapshot.write();
        if snapshot.generation != generation {
            return false;
        }
        snapshot.status.advance(progress, message)
    }

    /// Finish the attempt `generation` with a loaded model
    pub fn complete(&self, generation: u64, adapter: SynthesisAdapter, catalog: VoiceCatalog) -> bool {
        let mut snapshot = self.snapshot.write();
        if snapshot.generation != generation {
            return false;
        }
        // catalog first, so a request that sees the model ready also sees its voices
        *self.catalog.write() = Arc::new(catalog);
        snapshot.adapter = Some(adapter);
        snapshot.status = ModelStatus::ready();
        true
    }

    /// Finish the attempt `generation` with an error
    pub fn fail(&self, generation: u64, reason: impl std::fmt::Display) -> bool {
        let mut snapshot = self.snapshot.write();
        if snapshot.generation != generation {
            return false;
        }
        snapshot.adapter = None;
        snapshot.status = ModelStatus::failed(reason);
        true
    }

    /// Finish the attempt `generation` with an error, keeping `catalog` for display
    ///
    /// A stale attempt changes neither the status nor the catalog.
    pub fn fail_with_catalog(
        &self,
        generation: u64,
        reason: impl std::fmt::Display,
        catalog: VoiceCatalog,
    ) -> bool {
        let mut snapshot = self.snapshot.write();
        if snapshot.generation != generation {
            return false;
        }
        *self.catalog.write() = Arc::new(catalog);
        snapshot.adapter = None;
        snapshot.status = ModelStatus::failed(reason);
        true
    }
}

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: Arc<Settings>,
    /// Model, status and voices
    pub engine: Arc<Engine>,
    /// Loads the speech model on (re)initialization
    pub loader: Arc<dyn ModelLoader>,
    /// Runs speech requests
    pub orchestrator: Arc<SpeechOrchestrator>,
}

impl AppState {
    /// Create application state with the loader named in the configuration
    pub fn new(config: Settings) -> Self {
        let loader = build_loader(&config.synthesis);
        Self::with_loader(config, loader)
    }

    /// Create application state with an explicit model loader
    pub fn with_loader(config: Settings, loader: Arc<dyn ModelLoader>) -> Self {
        let orchestrator = SpeechOrchestrator::new(OrchestratorConfig {
            max_chunk_length: config.synthesis.max_chunk_length,
            default_voice: config.synthesis.default_voice.clone(),
            default_quality: config.synthesis.default_quality,
        });

        Self {
            config: Arc::new(config),
            engine: Arc::new(Engine::new()),
            loader,
            orchestrator: Arc::new(orchestrator),
        }
    }
}
