//! Chunked speech synthesis pipeline
//!
//! This crate turns request text into a WAV file:
//! - Text segmentation into model-sized chunks
//! - Per-chunk synthesis through a pluggable speech model
//! - Assembly of the per-chunk audio
//! - 16-bit PCM WAV encoding
//! - Request orchestration and voice discovery

pub mod assembler;
pub mod backends;
pub mod orchestrator;
pub mod segmenter;
pub mod synthesis;
pub mod voices;
pub mod wav;

// Segmentation exports
pub use segmenter::{segment, Chunk, TextSegmenter, DEFAULT_MAX_CHUNK_LENGTH};

// Synthesis exports
pub use synthesis::{SynthesisAdapter, SynthesisSession};

// Assembly and encoding exports
pub use assembler::concatenate;
pub use wav::{encode, quantize, WavFormatError, WavHeader, WAV_HEADER_LEN};

// Orchestrator exports
pub use orchestrator::{
    OrchestratorConfig, RequestContext, RequestStage, SpeechOrchestrator, SpeechOutput,
    SpeechRequest, ValidatedRequest,
};

// Voice discovery exports
pub use voices::{
    default_sources, discover_voices, BuiltinVoiceSource, ConfiguredVoiceSource,
    ModelVoiceSource, VoiceDiscovery,
};
