//! Audio assembly
//!
//! Lays the per-chunk segments end to end. No resampling, no crossfade.

use narrator_core::{AudioSegment, CombinedAudio, SynthesisError};

/// Concatenate segments in order
///
/// The sample rate of the first segment is used for the result. Segments at
/// other rates are copied as-is (with a warning), so they will play at the
/// wrong speed.
pub fn concatenate(segments: &[AudioSegment]) -> Result<CombinedAudio, SynthesisError> {
    let first = segments.first().ok_or(SynthesisError::EmptyAudio)?;
    let sample_rate = first.sample_rate();

    if let Some((index, odd)) = segments
        .iter()
        .enumerate()
        .find(|(_, s)| s.sample_rate() != sample_rate)
    {
        tracing::warn!(
            expected = sample_rate,
            found = odd.sample_rate(),
            segment = index,
            "Mixed sample rates in one request; audio is not resampled"
        );
    }

    let total: usize = segments.iter().map(AudioSegment::len).sum();
    let mut samples = Vec::with_capacity(total);
    for segment in segments {
        samples.extend_from_slice(segment.samples());
    }

    Ok(CombinedAudio::new(samples, sample_rate))
}
