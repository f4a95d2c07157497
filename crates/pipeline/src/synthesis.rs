//! Synthesis adapter
//!
//! Wraps a loaded [`SpeechModel`] and turns one chunk of text into one
//! validated [`AudioSegment`]. Backend access is gated by a semaphore: a
//! request takes a [`SynthesisSession`] (one permit) and keeps it for all of
//! its chunks, so chunks of different requests never interleave on the model.

use std::sync::Arc;
use std::time::{Duration, Instant};

use narrator_core::{AudioSegment, GenerateOptions, SpeechModel, SynthesisError};
use tokio::sync::{Semaphore, SemaphorePermit};

use crate::segmenter::Chunk;

/// Shared handle to a loaded model plus its admission control
#[derive(Clone)]
pub struct SynthesisAdapter {
    model: Arc<dyn SpeechModel>,
    slots: Arc<Semaphore>,
    chunk_timeout: Option<Duration>,
}

impl SynthesisAdapter {
    /// Adapter with a single slot and no chunk deadline
    pub fn new(model: Arc<dyn SpeechModel>) -> Self {
        Self {
            model,
            slots: Arc::new(Semaphore::new(1)),
            chunk_timeout: None,
        }
    }

    /// Allow `permits` requests to synthesize at once
    pub fn with_concurrency(mut self, permits: usize) -> Self {
        self.slots = Arc::new(Semaphore::new(permits.max(1)));
        self
    }

    /// Abandon a chunk that takes longer than `timeout`
    pub fn with_chunk_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.chunk_timeout = timeout;
        self
    }

    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    pub fn chunk_timeout(&self) -> Option<Duration> {
        self.chunk_timeout
    }

    /// Free slots right now
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Wait for a synthesis slot
    pub async fn acquire(&self) -> Result<SynthesisSession<'_>, SynthesisError> {
        let permit = self
            .slots
            .acquire()
            .await
            .map_err(|_| SynthesisError::Backend("synthesis slots closed".to_string()))?;

        Ok(SynthesisSession {
            adapter: self,
            _permit: permit,
        })
    }
}

impl std::fmt::Debug for SynthesisAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthesisAdapter")
            .field("model_id", &self.model.model_id())
            .field("available_slots", &self.slots.available_permits())
            .field("chunk_timeout", &self.chunk_timeout)
            .finish()
    }
}

/// Exclusive right to submit chunks, released on drop
pub struct SynthesisSession<'a> {
    adapter: &'a SynthesisAdapter,
    _permit: SemaphorePermit<'a>,
}

impl SynthesisSession<'_> {
    /// Synthesize one chunk
    pub async fn synthesize_chunk(
        &self,
        chunk: &Chunk,
        voice: &str,
        speed: f32,
    ) -> Result<AudioSegment, SynthesisError> {
        let options = GenerateOptions::new(voice, speed);
        let started = Instant::now();
        let call = self.adapter.model.generate(chunk.as_str(), &options);

        let raw = match self.adapter.chunk_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                tracing::warn!(
                    chars = chunk.char_len(),
                    timeout_ms = limit.as_millis() as u64,
                    "Chunk synthesis timed out"
                );
                SynthesisError::Timeout {
                    after_ms: limit.as_millis() as u64,
                }
            })??,
            None => call.await?,
        };

        if raw.samples.iter().any(|s| !s.is_finite()) {
            return Err(SynthesisError::Malformed(
                "model returned non-finite samples".to_string(),
            ));
        }

        let segment = AudioSegment::try_from(raw)?;

        tracing::trace!(
            chars = chunk.char_len(),
            samples = segment.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Chunk synthesized"
        );

        Ok(segment)
    }
}
