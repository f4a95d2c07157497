//! Collaborator traits
//!
//! The speech model is an external capability. These traits let the
//! pipeline swap backends (remote server, in-process stub, test mocks)
//! without code changes.

use std::sync::Arc;

use crate::audio::RawAudio;
use crate::error::SynthesisError;

/// Per-call synthesis options
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    /// Voice identifier
    pub voice: String,
    /// Speed multiplier (1.0 = normal)
    pub speed: f32,
}

impl GenerateOptions {
    pub fn new(voice: impl Into<String>, speed: f32) -> Self {
        Self {
            voice: voice.into(),
            speed,
        }
    }
}

/// A loaded speech model
#[async_trait::async_trait]
pub trait SpeechModel: Send + Sync {
    /// Identifier the model was loaded from
    fn model_id(&self) -> &str;

    /// Synthesize one piece of text
    async fn generate(
        &self,
        text: &str,
        options: &GenerateOptions,
    ) -> Result<RawAudio, SynthesisError>;

    /// Voices the model reports, empty if it cannot enumerate them
    async fn voices(&self) -> Result<Vec<String>, SynthesisError> {
        Ok(Vec::new())
    }
}

/// Loads a speech model by identifier
#[async_trait::async_trait]
pub trait ModelLoader: Send + Sync {
    async fn from_pretrained(&self, model_id: &str)
        -> Result<Arc<dyn SpeechModel>, SynthesisError>;
}

/// A ranked source of voice identifiers
#[async_trait::async_trait]
pub trait VoiceSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Voice identifiers, possibly empty
    async fn list_voices(&self) -> Result<Vec<String>, SynthesisError>;
}
