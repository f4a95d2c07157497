//! Request Orchestrator
//!
//! Runs one speech request through validation, segmentation, per-chunk
//! synthesis, assembly and encoding. Chunks are awaited strictly in order;
//! the first failure aborts the request and no partial audio is returned.

use std::sync::Arc;

use narrator_core::{
    Error, ModelStatus, QualityProfile, ValidationError, VoiceCatalog, WavBuffer,
};
use serde::Deserialize;

use crate::assembler::concatenate;
use crate::segmenter::{TextSegmenter, DEFAULT_MAX_CHUNK_LENGTH};
use crate::synthesis::SynthesisAdapter;
use crate::wav::encode;

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum characters per chunk
    pub max_chunk_length: usize,
    /// Voice used when a request names none
    pub default_voice: String,
    /// Quality used when a request names none
    pub default_quality: QualityProfile,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_chunk_length: DEFAULT_MAX_CHUNK_LENGTH,
            default_voice: "af_heart".to_string(),
            default_quality: QualityProfile::Balanced,
        }
    }
}

/// A speech request as submitted by a client
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpeechRequest {
    pub text: Option<String>,
    pub voice: Option<String>,
    pub quality: Option<String>,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = Some(quality.into());
        self
    }
}

/// Engine state a request is validated against
///
/// Taken as one snapshot so status, model and voices agree with each other.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub status: ModelStatus,
    pub adapter: Option<SynthesisAdapter>,
    pub catalog: Arc<VoiceCatalog>,
}

/// A request that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub text: String,
    pub voice: String,
    pub quality: QualityProfile,
    adapter: SynthesisAdapter,
}

/// Request lifecycle stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStage {
    Validating,
    Segmenting,
    /// Zero-based chunk index out of `total`
    Synthesizing { index: usize, total: usize },
    Assembling,
    Encoding,
    Done,
    Failed,
}

impl RequestStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStage::Validating => "validating",
            RequestStage::Segmenting => "segmenting",
            RequestStage::Synthesizing { .. } => "synthesizing",
            RequestStage::Assembling => "assembling",
            RequestStage::Encoding => "encoding",
            RequestStage::Done => "done",
            RequestStage::Failed => "failed",
        }
    }
}

/// A finished request
#[derive(Debug, Clone)]
pub struct SpeechOutput {
    pub wav: WavBuffer,
    /// `tts-{voice}-{quality}.wav`
    pub filename: String,
    pub voice: String,
    pub quality: QualityProfile,
    pub chunk_count: usize,
    pub sample_count: usize,
    pub sample_rate: u32,
}

impl SpeechOutput {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.sample_count as f64 / self.sample_rate as f64
    }
}

/// Drives speech requests through the pipeline
#[derive(Debug, Clone)]
pub struct SpeechOrchestrator {
    config: OrchestratorConfig,
    segmenter: TextSegmenter,
}

impl SpeechOrchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        let segmenter = TextSegmenter::new(config.max_chunk_length);
        Self { config, segmenter }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Check a request against the engine state
    ///
    /// Checks run in a fixed order: text, model loading, model present,
    /// voice, quality. The first failure is returned.
    pub fn validate(
        &self,
        request: SpeechRequest,
        ctx: &RequestContext,
    ) -> Result<ValidatedRequest, Error> {
        let text = match request.text {
            Some(text) if !text.trim().is_empty() => text,
            _ => return Err(ValidationError::MissingText.into()),
        };

        if ctx.status.loading {
            return Err(Error::NotReady {
                status: ctx.status.clone(),
            });
        }

        let adapter = ctx.adapter.clone().ok_or_else(|| Error::Uninitialized {
            status: ctx.status.clone(),
        })?;

        let voice = request
            .voice
            .unwrap_or_else(|| self.config.default_voice.clone());
        if !ctx.catalog.contains(&voice) {
            return Err(ValidationError::UnknownVoice {
                voice,
                available: ctx.catalog.ids(),
            }
            .into());
        }

        let quality = match request.quality {
            Some(name) => name.parse::<QualityProfile>()?,
            None => self.config.default_quality,
        };

        Ok(ValidatedRequest {
            text,
            voice,
            quality,
            adapter,
        })
    }

    /// Run a request to completion
    pub async fn generate(
        &self,
        request: SpeechRequest,
        ctx: &RequestContext,
    ) -> Result<SpeechOutput, Error> {
        self.generate_observed(request, ctx, |_| {}).await
    }

    /// Run a request, reporting every stage transition to `on_stage`
    pub async fn generate_observed<F>(
        &self,
        request: SpeechRequest,
        ctx: &RequestContext,
        mut on_stage: F,
    ) -> Result<SpeechOutput, Error>
    where
        F: FnMut(RequestStage) + Send,
    {
        let mut current = RequestStage::Validating;
        let result = self
            .run(request, ctx, &mut |stage| {
                current = stage;
                on_stage(stage);
            })
            .await;

        if let Err(ref e) = result {
            match e {
                Error::Validation(_) | Error::NotReady { .. } => {
                    tracing::debug!(stage = current.as_str(), code = %e.code(), "Speech request rejected: {}", e);
                }
                _ => {
                    tracing::warn!(stage = current.as_str(), code = %e.code(), "Speech request failed: {}", e);
                }
            }
            on_stage(RequestStage::Failed);
        }

        result
    }

    async fn run(
        &self,
        request: SpeechRequest,
        ctx: &RequestContext,
        on_stage: &mut (dyn FnMut(RequestStage) + Send),
    ) -> Result<SpeechOutput, Error> {
        on_stage(RequestStage::Validating);
        let request = self.validate(request, ctx)?;

        on_stage(RequestStage::Segmenting);
        let chunks = self.segmenter.segment(&request.text);
        if chunks.is_empty() {
            return Err(ValidationError::MissingText.into());
        }

        let total = chunks.len();
        tracing::info!(
            chars = request.text.chars().count(),
            chunks = total,
            voice = %request.voice,
            quality = %request.quality,
            "Generating speech"
        );

        let session = request.adapter.acquire().await?;
        let speed = request.quality.speed();
        let mut segments = Vec::with_capacity(total);

        for (index, chunk) in chunks.iter().enumerate() {
            on_stage(RequestStage::Synthesizing { index, total });
            tracing::debug!(
                chunk = index + 1,
                total,
                chars = chunk.char_len(),
                "Synthesizing chunk"
            );
            segments.push(session.synthesize_chunk(chunk, &request.voice, speed).await?);
        }
        drop(session);

        on_stage(RequestStage::Assembling);
        let combined = concatenate(&segments)?;

        on_stage(RequestStage::Encoding);
        let wav = encode(&combined);

        on_stage(RequestStage::Done);
        tracing::info!(
            chunks = total,
            samples = combined.len(),
            duration_secs = combined.duration_secs(),
            bytes = wav.len(),
            "Speech generated"
        );

        Ok(SpeechOutput {
            filename: output_filename(&request.voice, request.quality),
            wav,
            voice: request.voice,
            quality: request.quality,
            chunk_count: total,
            sample_count: combined.len(),
            sample_rate: combined.sample_rate(),
        })
    }
}

impl Default for SpeechOrchestrator {
    fn default() -> Self {
        Self::new(OrchestratorConfig::default())
    }
}

/// `tts-{voice}-{quality}.wav`, with anything outside `[A-Za-z0-9_-]` replaced
pub fn output_filename(voice: &str, quality: QualityProfile) -> String {
    let voice: String = voice
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("tts-{}-{}.wav", voice, quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use narrator_core::{GenerateOptions, RawAudio, SpeechModel, SynthesisError};

    struct EchoModel;

    #[async_trait::async_trait]
    impl SpeechModel for EchoModel {
        fn model_id(&self) -> &str {
            "echo"
        }

        async fn generate(&self, text: &str, _: &GenerateOptions) -> Result<RawAudio, SynthesisError> {
            Ok(RawAudio::new(vec![0.1; text.chars().count()], 24000))
        }
    }

    fn ready_ctx() -> RequestContext {
        RequestContext {
            status: ModelStatus::ready(),
            adapter: Some(SynthesisAdapter::new(Arc::new(EchoModel))),
            catalog: Arc::new(VoiceCatalog::builtin()),
        }
    }

    fn orchestrator() -> SpeechOrchestrator {
        SpeechOrchestrator::default()
    }

    #[test]
    fn test_missing_text_checked_first() {
        let mut ctx = ready_ctx();
        ctx.status = ModelStatus::starting();
        ctx.adapter = None;

        for request in [SpeechRequest::default(), SpeechRequest::new("   ")] {
            let err = orchestrator().validate(request, &ctx).unwrap_err();
            assert!(matches!(err, Error::Validation(ValidationError::MissingText)));
        }
    }

    #[test]
    fn test_loading_before_uninitialized() {
        let mut ctx = ready_ctx();
        ctx.status = ModelStatus::starting();
        ctx.adapter = None;

        let err = orchestrator()
            .validate(SpeechRequest::new("hi").with_voice("nope"), &ctx)
            .unwrap_err();
        assert!(matches!(err, Error::NotReady { ref status } if status.loading));
    }

    #[test]
    fn test_uninitialized_before_voice() {
        let mut ctx = ready_ctx();
        ctx.status = ModelStatus::failed("boom");
        ctx.adapter = None;

        let err = orchestrator()
            .validate(SpeechRequest::new("hi").with_voice("nope"), &ctx)
            .unwrap_err();
        assert!(matches!(err, Error::Uninitialized { ref status } if status.message == "Error: boom"));
    }

    #[test]
    fn test_unknown_voice_lists_available() {
        let err = orchestrator()
            .validate(
                SpeechRequest::new("hi").with_voice("unknown_voice").with_quality("ultra"),
                &ready_ctx(),
            )
            .unwrap_err();
        match err {
            Error::Validation(ValidationError::UnknownVoice { voice, available }) => {
                assert_eq!(voice, "unknown_voice");
                assert_eq!(available.len(), 28);
                assert_eq!(available[0], "af_heart");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_quality() {
        let err = orchestrator()
            .validate(SpeechRequest::new("hi").with_quality("ultra"), &ready_ctx())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::UnknownQuality(ref q)) if q == "ultra"
        ));
    }

    #[test]
    fn test_defaults_applied() {
        let validated = orchestrator().validate(SpeechRequest::new("hi"), &ready_ctx()).unwrap();
        assert_eq!(validated.voice, "af_heart");
        assert_eq!(validated.quality, QualityProfile::Balanced);
    }

    #[tokio::test]
    async fn test_generate_reports_stages() {
        let orchestrator = SpeechOrchestrator::new(OrchestratorConfig {
            max_chunk_length: 9,
            ..Default::default()
        });
        let mut stages = Vec::new();

        let output = orchestrator
            .generate_observed(
                SpeechRequest::new("One. Two. Three.").with_quality("high"),
                &ready_ctx(),
                |stage| stages.push(stage),
            )
            .await
            .unwrap();

        assert_eq!(output.chunk_count, 2);
        assert_eq!(output.sample_count, "One. Two.".len() + "Three.".len());
        assert_eq!(output.filename, "tts-af_heart-high.wav");
        assert_eq!(output.wav.len(), 44 + 2 * output.sample_count);
        assert_eq!(
            stages,
            vec![
                RequestStage::Validating,
                RequestStage::Segmenting,
                RequestStage::Synthesizing { index: 0, total: 2 },
                RequestStage::Synthesizing { index: 1, total: 2 },
                RequestStage::Assembling,
                RequestStage::Encoding,
                RequestStage::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_stage_reported() {
        let mut stages = Vec::new();
        let result = orchestrator()
            .generate_observed(SpeechRequest::default(), &ready_ctx(), |stage| stages.push(stage))
            .await;
        assert!(result.is_err());
        assert_eq!(stages, vec![RequestStage::Validating, RequestStage::Failed]);
    }

    #[test]
    fn test_output_filename_sanitized() {
        assert_eq!(output_filename("af_heart", QualityProfile::Fast), "tts-af_heart-fast.wav");
        assert_eq!(output_filename("a\"b/c", QualityProfile::Premium), "tts-a_b_c-premium.wav");
    }
}
