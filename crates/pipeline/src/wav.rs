//! WAV encoding
//!
//! Canonical 44-byte RIFF header, mono, 16-bit little-endian PCM.

use bytes::{BufMut, BytesMut};
use narrator_core::{CombinedAudio, WavBuffer};
use thiserror::Error;

/// Size of the canonical header
pub const WAV_HEADER_LEN: usize = 44;

const CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const BLOCK_ALIGN: u16 = CHANNELS * BITS_PER_SAMPLE / 8;
const PCM_FORMAT: u16 = 1;

/// Convert a float sample to 16-bit PCM
///
/// `clamp(round(s * 32767), -32768, 32767)`, ties rounding toward positive
/// infinity. Only inputs below -1.0 reach -32768. NaN maps to 0.
pub fn quantize(sample: f32) -> i16 {
    let scaled = (f64::from(sample) * 32767.0 + 0.5).floor();
    scaled.clamp(-32768.0, 32767.0) as i16
}

/// Encode combined audio as a WAV file
pub fn encode(audio: &CombinedAudio) -> WavBuffer {
    let data_bytes = audio.len() * BLOCK_ALIGN as usize;
    let mut buf = BytesMut::with_capacity(WAV_HEADER_LEN + data_bytes);

    // RIFF sizes are u32; saturate rather than wrap
    let data_len = u32::try_from(data_bytes).unwrap_or(u32::MAX);
    let riff_len = data_len.saturating_add(36);

    buf.put_slice(b"RIFF");
    buf.put_u32_le(riff_len);
    buf.put_slice(b"WAVE");

    buf.put_slice(b"fmt ");
    buf.put_u32_le(16);
    buf.put_u16_le(PCM_FORMAT);
    buf.put_u16_le(CHANNELS);
    buf.put_u32_le(audio.sample_rate());
    buf.put_u32_le(audio.sample_rate().saturating_mul(BLOCK_ALIGN as u32));
    buf.put_u16_le(BLOCK_ALIGN);
    buf.put_u16_le(BITS_PER_SAMPLE);

    buf.put_slice(b"data");
    buf.put_u32_le(data_len);

    for &sample in audio.samples() {
        buf.put_i16_le(quantize(sample));
    }

    WavBuffer::new(buf.freeze())
}

/// Header decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WavFormatError {
    #[error("buffer too short for a WAV header: {0} bytes")]
    TooShort(usize),

    #[error("missing {0} tag")]
    MissingTag(&'static str),

    #[error("unsupported audio format {0}")]
    UnsupportedFormat(u16),
}

/// Fields of a canonical WAV header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_len: u32,
}

impl WavHeader {
    /// Decode the 44-byte header at the start of `bytes`
    pub fn parse(bytes: &[u8]) -> Result<Self, WavFormatError> {
        if bytes.len() < WAV_HEADER_LEN {
            return Err(WavFormatError::TooShort(bytes.len()));
        }

        for (offset, tag, name) in [
            (0, b"RIFF", "RIFF"),
            (8, b"WAVE", "WAVE"),
            (12, b"fmt ", "fmt"),
            (36, b"data", "data"),
        ] {
            if &bytes[offset..offset + 4] != tag {
                return Err(WavFormatError::MissingTag(name));
            }
        }

        let format = read_u16(bytes, 20);
        if format != PCM_FORMAT {
            return Err(WavFormatError::UnsupportedFormat(format));
        }

        Ok(Self {
            channels: read_u16(bytes, 22),
            sample_rate: read_u32(bytes, 24),
            byte_rate: read_u32(bytes, 28),
            block_align: read_u16(bytes, 32),
            bits_per_sample: read_u16(bytes, 34),
            data_len: read_u32(bytes, 40),
        })
    }

    /// Number of sample frames in the data chunk
    pub fn sample_count(&self) -> usize {
        if self.block_align == 0 {
            return 0;
        }
        self.data_len as usize / self.block_align as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.sample_count() as f64 / self.sample_rate as f64
    }
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
