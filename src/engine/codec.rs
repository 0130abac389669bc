//! Audio codec capability
//!
//! The mix pipeline only needs `decode(bytes) -> PCM` and `encode(PCM) -> bytes`.
//! `WavCodec` implements both for RIFF/WAVE streams held fully in memory.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::engine::buffer::{AudioBuffer, ChannelLayout};
use crate::error::{DubError, Result};

/// Decode/encode capability used by the mix pipeline
pub trait AudioCodec: Send + Sync {
    /// Decode a complete encoded stream into PCM
    fn decode(&self, bytes: &[u8]) -> Result<AudioBuffer>;

    /// Encode PCM into a complete stream
    fn encode(&self, buffer: &AudioBuffer) -> Result<Vec<u8>>;
}

/// WAV codec backed by hound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavCodec {
    /// Output bit depth: 16 or 24 (integer PCM) or 32 (float)
    pub bit_depth: u16,
}

impl Default for WavCodec {
    fn default() -> Self {
        WavCodec { bit_depth: 16 }
    }
}

impl WavCodec {
    /// Create a codec that encodes at the given bit depth
    pub fn new(bit_depth: u16) -> Self {
        WavCodec { bit_depth }
    }
}

impl AudioCodec for WavCodec {
    fn decode(&self, bytes: &[u8]) -> Result<AudioBuffer> {
        let reader = WavReader::new(Cursor::new(bytes)).map_err(|e| DubError::Decode {
            key: None,
            reason: format!("Failed to open WAV stream: {}", e),
            source: Some(Box::new(e)),
        })?;

        let spec = reader.spec();
        let layout = ChannelLayout::from_count(spec.channels as usize).ok_or_else(|| {
            DubError::decode(format!(
                "{}-channel audio (only mono/stereo supported)",
                spec.channels
            ))
        })?;

        let interleaved = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
        AudioBuffer::from_interleaved(&interleaved, layout, spec.sample_rate)
    }

    fn encode(&self, buffer: &AudioBuffer) -> Result<Vec<u8>> {
        let spec = WavSpec {
            channels: buffer.channels() as u16,
            sample_rate: buffer.sample_rate,
            bits_per_sample: self.bit_depth,
            sample_format: if self.bit_depth == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        };

        let mut clamped = buffer.clone();
        clamped.clamp();
        let interleaved = clamped.to_interleaved();

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).map_err(encode_error)?;

            match self.bit_depth {
                16 => {
                    for sample in interleaved {
                        let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                        writer.write_sample(scaled).map_err(encode_error)?;
                    }
                }
                24 => {
                    for sample in interleaved {
                        // 24-bit stored as i32 in hound
                        let scaled = (sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32;
                        writer.write_sample(scaled).map_err(encode_error)?;
                    }
                }
                32 => {
                    for sample in interleaved {
                        writer.write_sample(sample).map_err(encode_error)?;
                    }
                }
                other => {
                    return Err(DubError::Encode {
                        reason: format!("{}-bit audio (only 16, 24, 32 supported)", other),
                    });
                }
            }

            writer.finalize().map_err(encode_error)?;
        }

        Ok(cursor.into_inner())
    }
}

fn encode_error(e: hound::Error) -> DubError {
    DubError::Encode {
        reason: e.to_string(),
    }
}

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    fn decode_failed(bits: u16) -> impl Fn(hound::Error) -> DubError {
        move |e| DubError::Decode {
            key: None,
            reason: format!("Failed to read {}-bit samples: {}", bits, e),
            source: Some(Box::new(e)),
        }
    }

    match (sample_format, bits_per_sample) {
        (SampleFormat::Float, _) => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(decode_failed(bits_per_sample)),
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| v as f32 / 128.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(decode_failed(8)),
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(decode_failed(16)),
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8388608.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(decode_failed(24)),
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2147483648.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(decode_failed(32)),
        (SampleFormat::Int, bits) => Err(DubError::decode(format!(
            "{}-bit integer audio is not supported",
            bits
        ))),
    }
}

// ============================================================================
// Tests
// ============================================================================
