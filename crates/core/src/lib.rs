//! Core traits and types for the narrator TTS service
//!
//! This crate provides the foundational types shared by every other crate:
//! - Audio containers (per-chunk segments, combined audio, WAV bytes)
//! - Quality profiles and the voice catalog
//! - Model initialization status
//! - Error taxonomy
//! - Collaborator traits for speech models and voice discovery

pub mod audio;
pub mod error;
pub mod quality;
pub mod status;
pub mod traits;
pub mod voice;

pub use audio::{AudioSegment, CombinedAudio, RawAudio, WavBuffer};
pub use error::{Error, ErrorCode, SynthesisError, ValidationError};
pub use quality::QualityProfile;
pub use status::ModelStatus;
pub use traits::{GenerateOptions, ModelLoader, SpeechModel, VoiceSource};
pub use voice::{VoiceCatalog, VoiceCategory, VoiceEntry};
