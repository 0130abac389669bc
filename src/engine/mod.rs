//! Audio Engine Module
//!
//! Core audio processing for the dub pipeline:
//! - Audio buffer with overlay and resampling
//! - Codec capability (WAV)
//! - Mix engine

pub mod buffer;
pub mod codec;
pub mod mix;

pub use buffer::{AudioBuffer, ChannelLayout, MAX_TIMELINE_SECS};
pub use codec::{AudioCodec, WavCodec};
pub use mix::{mix_order, MixEngine};
