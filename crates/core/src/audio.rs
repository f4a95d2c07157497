//! Audio containers
//!
//! Samples flow through three shapes:
//! - [`RawAudio`]: whatever a speech model hands back, not yet checked
//! - [`AudioSegment`]: validated audio for one chunk of text
//! - [`CombinedAudio`]: all segments of a request laid end to end
//!
//! [`WavBuffer`] is the final encoded file.

use bytes::Bytes;

use crate::error::SynthesisError;

/// Unvalidated model output for one piece of text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAudio {
    /// Mono float samples, nominally in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Samples per second
    pub sampling_rate: u32,
}

impl RawAudio {
    pub fn new(samples: Vec<f32>, sampling_rate: u32) -> Self {
        Self {
            samples,
            sampling_rate,
        }
    }
}

/// Synthesized audio for a single chunk
///
/// Immutable once built; the sample rate is always positive.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSegment {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioSegment {
    /// Create a segment, rejecting a zero sample rate
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, SynthesisError> {
        if sample_rate == 0 {
            return Err(SynthesisError::Malformed(
                "model returned audio without a sample rate".to_string(),
            ));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

impl TryFrom<RawAudio> for AudioSegment {
    type Error = SynthesisError;

    fn try_from(raw: RawAudio) -> Result<Self, Self::Error> {
        AudioSegment::new(raw.samples, raw.sampling_rate)
    }
}

/// Concatenation of every segment of one request
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedAudio {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl CombinedAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Encoded WAV file bytes
///
/// Cheap to clone, never mutated after encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavBuffer(Bytes);

impl WavBuffer {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl AsRef<[u8]> for WavBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
