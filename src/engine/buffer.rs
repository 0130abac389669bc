//! Audio Buffer Management
//!
//! Provides the decoded PCM signal type that the mix pipeline works on.
//! Samples are stored non-interleaved as 32-bit floats; each channel is a
//! separate `Vec<f32>`.

use crate::error::{DubError, Result};

// ============================================================================
// Helper Functions
// ============================================================================

/// Longest timeline an overlay may produce, in seconds
///
/// Bounds the allocation made when a clip lands past the end of the bed.
pub const MAX_TIMELINE_SECS: f64 = 4.0 * 3600.0;

/// Linear interpolation resampling of a single channel
///
/// The output length is rounded up so no trailing audio is lost.
fn resample_linear(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }

    let source_len = samples.len();
    let target_len = (source_len as u64 * target_rate as u64).div_ceil(source_rate as u64) as usize;
    let step = source_rate as f64 / target_rate as f64;
    let mut output = Vec::with_capacity(target_len);

    for i in 0..target_len {
        let src_pos = i as f64 * step;
        let src_idx = src_pos.floor() as usize;
        let frac = (src_pos - src_idx as f64) as f32;

        let sample = if src_idx + 1 < source_len {
            samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac
        } else if src_idx < source_len {
            samples[src_idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

/// Convert a millisecond position into a sample index at `sample_rate`
///
/// Negative positions map to the first sample. Positions past `limit`
/// samples give `None`.
fn ms_to_samples(position_ms: f64, sample_rate: u32, limit: usize) -> Option<usize> {
    let position = (position_ms.max(0.0) * sample_rate as f64 / 1000.0).round();
    (position <= limit as f64).then_some(position as usize)
}

// ============================================================================
// Channel Layout
// ============================================================================

/// Audio channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    /// Single channel (mono)
    Mono,
    /// Two channels (stereo: left, right)
    #[default]
    Stereo,
}

impl ChannelLayout {
    /// Returns the number of channels for this layout
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }

    /// Create a ChannelLayout from a channel count
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(ChannelLayout::Mono),
            2 => Some(ChannelLayout::Stereo),
            _ => None,
        }
    }
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Decoded audio signal
///
/// # Example
/// ```
/// use dubmix::engine::{AudioBuffer, ChannelLayout};
///
/// let mut bed = AudioBuffer::silence(1.0, ChannelLayout::Mono, 1000);
/// let clip = AudioBuffer::from_interleaved(&[0.5; 500], ChannelLayout::Mono, 1000).unwrap();
///
/// // A clip running past the end grows the bed
/// bed.overlay(&clip, 750.0).unwrap();
/// assert_eq!(bed.len(), 1250);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a zeroed buffer with the given number of samples per channel
    pub fn new(num_samples: usize, layout: ChannelLayout, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_samples]; layout.num_channels()],
            sample_rate,
        }
    }

    /// Create a silent buffer lasting `duration_secs`
    pub fn silence(duration_secs: f64, layout: ChannelLayout, sample_rate: u32) -> Self {
        let num_samples = (duration_secs.max(0.0) * sample_rate as f64).round() as usize;
        Self::new(num_samples, layout, sample_rate)
    }

    /// Create an audio buffer from interleaved sample data
    ///
    /// Fails if the data length is not a multiple of the channel count.
    pub fn from_interleaved(
        interleaved: &[f32],
        layout: ChannelLayout,
        sample_rate: u32,
    ) -> Result<Self> {
        let num_channels = layout.num_channels();

        if interleaved.len() % num_channels != 0 {
            return Err(DubError::decode(format!(
                "Interleaved data length {} is not divisible by channel count {}",
                interleaved.len(),
                num_channels
            )));
        }

        let num_samples = interleaved.len() / num_channels;
        let mut samples = vec![Vec::with_capacity(num_samples); num_channels];

        for frame in interleaved.chunks_exact(num_channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Convert the buffer to interleaved format (L, R, L, R, ... for stereo)
    pub fn to_interleaved(&self) -> Vec<f32> {
        let num_samples = self.len();
        let mut interleaved = Vec::with_capacity(self.channels() * num_samples);

        for sample_idx in 0..num_samples {
            for channel in &self.samples {
                interleaved.push(channel[sample_idx]);
            }
        }

        interleaved
    }

    /// Get the number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer is empty (no samples)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Get the duration in milliseconds
    #[inline]
    pub fn duration_ms(&self) -> f64 {
        self.duration_secs() * 1000.0
    }

    /// Get the channel layout, if the channel count maps to one
    pub fn channel_layout(&self) -> Option<ChannelLayout> {
        ChannelLayout::from_count(self.channels())
    }

    /// Get immutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Get a sample at the specified channel and index
    #[inline]
    pub fn get_sample(&self, channel: usize, index: usize) -> Option<f32> {
        self.samples
            .get(channel)
            .and_then(|ch| ch.get(index).copied())
    }

    /// Return a copy of this buffer at `target_rate`
    ///
    /// Uses linear interpolation. Returns an unchanged clone when the rate
    /// already matches.
    pub fn resample(&self, target_rate: u32) -> AudioBuffer {
        if target_rate == self.sample_rate || self.sample_rate == 0 || self.is_empty() {
            return AudioBuffer {
                samples: self.samples.clone(),
                sample_rate: target_rate,
            };
        }

        AudioBuffer {
            samples: self
                .samples
                .iter()
                .map(|channel| resample_linear(channel, self.sample_rate, target_rate))
                .collect(),
            sample_rate: target_rate,
        }
    }

    /// Return a copy of this buffer with `layout` channels
    ///
    /// Mono is duplicated into both stereo channels; stereo is averaged down
    /// to mono.
    pub fn remix(&self, layout: ChannelLayout) -> AudioBuffer {
        let target = layout.num_channels();
        if target == self.channels() {
            return self.clone();
        }

        let samples = match layout {
            ChannelLayout::Stereo => {
                let source = self.samples.first().cloned().unwrap_or_default();
                vec![source.clone(), source]
            }
            ChannelLayout::Mono => {
                let scale = 1.0 / self.channels().max(1) as f32;
                let mono = (0..self.len())
                    .map(|i| self.samples.iter().map(|ch| ch[i]).sum::<f32>() * scale)
                    .collect();
                vec![mono]
            }
        };

        AudioBuffer {
            samples,
            sample_rate: self.sample_rate,
        }
    }

    /// Additively overlay `other` onto this buffer starting at `position_ms`
    ///
    /// Both buffers are first raised to the higher of the two sample rates and
    /// channel counts, so nothing in `other` is averaged or downsampled away.
    /// Samples in the overlap window are summed; if the overlay runs past the
    /// current end the timeline is extended with the overlay's remaining
    /// samples. An empty `other` leaves the buffer untouched.
    ///
    /// Fails without modifying the buffer if the result would be longer than
    /// [`MAX_TIMELINE_SECS`].
    pub fn overlay(&mut self, other: &AudioBuffer, position_ms: f64) -> Result<()> {
        if other.is_empty() {
            return Ok(());
        }

        let sample_rate = self.sample_rate.max(other.sample_rate);
        let layout = if self.channels().max(other.channels()) > 1 {
            ChannelLayout::Stereo
        } else {
            ChannelLayout::Mono
        };

        let conformed = other.resample(sample_rate).remix(layout);
        let limit = (MAX_TIMELINE_SECS * sample_rate as f64) as usize;
        let end = ms_to_samples(position_ms, sample_rate, limit)
            .and_then(|offset| offset.checked_add(conformed.len()))
            .filter(|&end| end <= limit)
            .ok_or(DubError::Timeline {
                position_ms,
                limit_secs: MAX_TIMELINE_SECS,
            })?;
        let offset = end - conformed.len();

        if sample_rate != self.sample_rate {
            *self = self.resample(sample_rate);
        }
        if self.channels() != layout.num_channels() {
            *self = self.remix(layout);
        }

        if end > self.len() {
            for channel in &mut self.samples {
                channel.resize(end, 0.0);
            }
        }

        for (dest, src) in self.samples.iter_mut().zip(conformed.samples.iter()) {
            for (d, s) in dest[offset..end].iter_mut().zip(src.iter()) {
                *d += *s;
            }
        }

        Ok(())
    }

    /// Clamp all samples to the valid range [-1.0, 1.0]
    pub fn clamp(&mut self) {
        for channel in &mut self.samples {
            for sample in channel.iter_mut() {
                *sample = sample.clamp(-1.0, 1.0);
            }
        }
    }
}

impl Default for AudioBuffer {
    fn default() -> Self {
        Self::new(0, ChannelLayout::Stereo, 44100)
    }
}

// ============================================================================
// Tests
// ============================================================================
