//! In-process tone backend
//!
//! Produces a short tone per character instead of speech. Needs no model
//! files or network, so it backs development setups and tests.

use std::f32::consts::PI;
use std::sync::Arc;

use narrator_core::voice::BUILTIN_VOICES;
use narrator_core::{GenerateOptions, ModelLoader, RawAudio, SpeechModel, SynthesisError};

/// Milliseconds of audio per character at speed 1.0
const MS_PER_CHAR: u32 = 50;
const AMPLITUDE: f32 = 0.3;

/// Deterministic tone generator
#[derive(Debug, Clone)]
pub struct SimpleModel {
    model_id: String,
    sample_rate: u32,
}

impl SimpleModel {
    pub fn new(model_id: impl Into<String>, sample_rate: u32) -> Self {
        Self {
            model_id: model_id.into(),
            sample_rate,
        }
    }

    /// Samples produced for `text` at `speed`
    pub fn sample_count(&self, text: &str, speed: f32) -> usize {
        let chars = text.chars().count() as f64;
        let per_char = self.sample_rate as f64 * MS_PER_CHAR as f64 / 1000.0;
        let speed = if speed > 0.0 { speed as f64 } else { 1.0 };
        (chars * per_char / speed).round() as usize
    }

    /// Each voice gets its own pitch
    fn frequency(voice: &str) -> f32 {
        let hash = voice
            .bytes()
            .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
        180.0 + (hash % 200) as f32
    }
}

#[async_trait::async_trait]
impl SpeechModel for SimpleModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(
        &self,
        text: &str,
        options: &GenerateOptions,
    ) -> Result<RawAudio, SynthesisError> {
        let count = self.sample_count(text, options.speed);
        let step = 2.0 * PI * Self::frequency(&options.voice) / self.sample_rate as f32;

        let samples = (0..count)
            .map(|i| AMPLITUDE * (step * i as f32).sin())
            .collect();

        Ok(RawAudio::new(samples, self.sample_rate))
    }

    async fn voices(&self) -> Result<Vec<String>, SynthesisError> {
        Ok(BUILTIN_VOICES.iter().map(|v| v.to_string()).collect())
    }
}

/// Loader for [`SimpleModel`]
#[derive(Debug, Clone)]
pub struct SimpleLoader {
    sample_rate: u32,
}

impl SimpleLoader {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

#[async_trait::async_trait]
impl ModelLoader for SimpleLoader {
    async fn from_pretrained(
        &self,
        model_id: &str,
    ) -> Result<Arc<dyn SpeechModel>, SynthesisError> {
        if self.sample_rate == 0 {
            return Err(SynthesisError::Load("sample rate must be positive".to_string()));
        }
        tracing::info!(model_id, sample_rate = self.sample_rate, "Using simple tone backend");
        Ok(Arc::new(SimpleModel::new(model_id, self.sample_rate)))
    }
}
