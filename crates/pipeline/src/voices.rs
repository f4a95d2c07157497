//! Voice discovery
//!
//! Sources are tried in rank order; the first one that reports a non-empty
//! list wins. Failures are logged and the next source is tried.

use std::sync::Arc;

use narrator_core::voice::BUILTIN_VOICES;
use narrator_core::{SpeechModel, SynthesisError, VoiceCatalog, VoiceSource};

/// Voices reported by the loaded model
pub struct ModelVoiceSource {
    model: Arc<dyn SpeechModel>,
}

impl ModelVoiceSource {
    pub fn new(model: Arc<dyn SpeechModel>) -> Self {
        Self { model }
    }
}

#[async_trait::async_trait]
impl VoiceSource for ModelVoiceSource {
    fn name(&self) -> &'static str {
        "model"
    }

    async fn list_voices(&self) -> Result<Vec<String>, SynthesisError> {
        self.model.voices().await
    }
}

/// Voices listed in configuration
pub struct ConfiguredVoiceSource {
    voices: Vec<String>,
}

impl ConfiguredVoiceSource {
    pub fn new(voices: Vec<String>) -> Self {
        Self { voices }
    }
}

#[async_trait::async_trait]
impl VoiceSource for ConfiguredVoiceSource {
    fn name(&self) -> &'static str {
        "configured"
    }

    async fn list_voices(&self) -> Result<Vec<String>, SynthesisError> {
        Ok(self.voices.clone())
    }
}

/// The stock Kokoro voices
pub struct BuiltinVoiceSource;

#[async_trait::async_trait]
impl VoiceSource for BuiltinVoiceSource {
    fn name(&self) -> &'static str {
        "builtin"
    }

    async fn list_voices(&self) -> Result<Vec<String>, SynthesisError> {
        Ok(BUILTIN_VOICES.iter().map(|v| v.to_string()).collect())
    }
}

/// Result of a discovery run
#[derive(Debug, Clone)]
pub struct VoiceDiscovery {
    /// Name of the source that supplied the voices
    pub source: &'static str,
    pub catalog: VoiceCatalog,
}

/// Standard ranking: model, then configured, then built-in
pub fn default_sources(
    model: Option<Arc<dyn SpeechModel>>,
    configured: Vec<String>,
) -> Vec<Box<dyn VoiceSource>> {
    let mut sources: Vec<Box<dyn VoiceSource>> = Vec::with_capacity(3);
    if let Some(model) = model {
        sources.push(Box::new(ModelVoiceSource::new(model)));
    }
    sources.push(Box::new(ConfiguredVoiceSource::new(configured)));
    sources.push(Box::new(BuiltinVoiceSource));
    sources
}

/// Build a catalog from the first source with voices
///
/// Falls back to the built-in voices when every source is empty or fails.
pub async fn discover_voices(sources: &[Box<dyn VoiceSource>]) -> VoiceDiscovery {
    for source in sources {
        match source.list_voices().await {
            Ok(ids) => {
                let catalog = VoiceCatalog::from_ids(&ids);
                if catalog.is_empty() {
                    tracing::debug!(source = source.name(), "Voice source reported no voices");
                    continue;
                }
                tracing::info!(
                    source = source.name(),
                    count = catalog.len(),
                    "Voices loaded"
                );
                return VoiceDiscovery {
                    source: source.name(),
                    catalog,
                };
            }
            Err(e) => {
                tracing::warn!(source = source.name(), error = %e, "Voice source failed");
            }
        }
    }

    tracing::warn!("No voice source reported voices; using built-in list");
    VoiceDiscovery {
        source: BuiltinVoiceSource.name(),
        catalog: VoiceCatalog::builtin(),
    }
}
