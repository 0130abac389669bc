//! Mix Engine
//!
//! Overlays region clips onto a background bed in start-time order and
//! normalizes the result to the target sample rate.
//!
//! Ordering is a stable sort on `start`, so regions sharing a start time are
//! applied in request order. Any fetch or decode failure aborts the mix;
//! there is no skip-bad-region mode.

use tracing::{debug, info};

use crate::engine::buffer::AudioBuffer;
use crate::engine::codec::AudioCodec;
use crate::error::Result;
use crate::export::fetch::RegionFetcher;
use crate::export::region::Region;

/// Sort regions ascending by start time, keeping request order on ties
pub fn mix_order(regions: &[Region]) -> Vec<&Region> {
    let mut ordered: Vec<&Region> = regions.iter().collect();
    ordered.sort_by(|a, b| a.start.total_cmp(&b.start));
    ordered
}

/// Drives fetch, decode and overlay for one mix
pub struct MixEngine<'a> {
    fetcher: RegionFetcher<'a>,
    codec: &'a dyn AudioCodec,
    target_sample_rate: u32,
}

impl<'a> MixEngine<'a> {
    pub fn new(
        fetcher: RegionFetcher<'a>,
        codec: &'a dyn AudioCodec,
        target_sample_rate: u32,
    ) -> Self {
        Self {
            fetcher,
            codec,
            target_sample_rate,
        }
    }

    /// Fetch and decode one region's clip
    pub fn load_region(&self, region: &Region) -> Result<AudioBuffer> {
        let key = self.fetcher.object_key(region)?;
        let bytes = self.fetcher.fetch(region)?;
        self.codec
            .decode(&bytes)
            .map_err(|e| e.for_object(self.fetcher.bucket(), &key))
    }

    /// Overlay every region onto `background` and resample the result
    ///
    /// `background` becomes the working buffer; each region is overlaid at
    /// `start * 1000` ms onto the result of the previous overlay.
    pub fn mix(&self, regions: &[Region], background: AudioBuffer) -> Result<AudioBuffer> {
        info!(
            "Merging {} regions onto {:.3}s background",
            regions.len(),
            background.duration_secs()
        );

        let mut working = background;
        for region in mix_order(regions) {
            let clip = self.load_region(region)?;
            debug!(
                "Overlaying {} ({:.3}s) at {:.1}ms",
                region.url,
                clip.duration_secs(),
                region.offset_ms()
            );
            working.overlay(&clip, region.offset_ms())?;
        }

        Ok(working.resample(self.target_sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::buffer::ChannelLayout;
    use crate::engine::codec::WavCodec;
    use crate::error::DubError;
    use crate::storage::MemoryStore;

    fn clip_bytes(value: f32, num_samples: usize, sample_rate: u32) -> Vec<u8> {
        let clip = AudioBuffer {
            samples: vec![vec![value; num_samples]],
            sample_rate,
        };
        WavCodec::new(32).encode(&clip).unwrap()
    }

    #[test]
    fn test_mix_order_is_stable() {
        let regions = vec![
            Region::new(1.0, 2.0, "a.wav"),
            Region::new(0.5, 1.5, "b.wav"),
            Region::new(1.0, 1.2, "c.wav"),
            Region::new(0.0, 0.2, "d.wav"),
        ];

        let urls: Vec<&str> = mix_order(&regions)
            .into_iter()
            .map(|r| r.url.as_str())
            .collect();
        assert_eq!(urls, vec!["d.wav", "b.wav", "a.wav", "c.wav"]);
    }

    #[test]
    fn test_region_lands_at_start_offset() {
        let store = MemoryStore::new();
        store.insert("regions", "clips/a.wav", clip_bytes(0.5, 100, 44000));
        let codec = WavCodec::new(32);
        let engine = MixEngine::new(RegionFetcher::new(&store, "regions"), &codec, 44000);

        let background = AudioBuffer::silence(5.0, ChannelLayout::Mono, 44000);
        let regions = vec![Region::new(2.5, 3.0, "https://cdn.example.com/clips/a.wav")];
        let mixed = engine.mix(&regions, background).unwrap();

        // 2500ms at 44kHz
        assert_eq!(mixed.get_sample(0, 109_999), Some(0.0));
        assert_eq!(mixed.get_sample(0, 110_000), Some(0.5));
        assert_eq!(mixed.get_sample(0, 110_099), Some(0.5));
        assert_eq!(mixed.get_sample(0, 110_100), Some(0.0));
    }

    #[test]
    fn test_output_is_normalized_to_target_rate() {
        let store = MemoryStore::new();
        store.insert("regions", "a.wav", clip_bytes(0.1, 2205, 22050));
        let codec = WavCodec::default();
        let engine = MixEngine::new(RegionFetcher::new(&store, "regions"), &codec, 44000);

        let background = AudioBuffer::silence(1.0, ChannelLayout::Stereo, 48000);
        let mixed = engine
            .mix(&[Region::new(0.0, 0.1, "a.wav")], background)
            .unwrap();

        assert_eq!(mixed.sample_rate, 44000);
        assert_eq!(mixed.len(), 44000);
        assert_eq!(mixed.channels(), 2);
    }

    #[test]
    fn test_no_regions_only_resamples() {
        let store = MemoryStore::new();
        let codec = WavCodec::default();
        let engine = MixEngine::new(RegionFetcher::new(&store, "regions"), &codec, 44000);

        let background = AudioBuffer::silence(0.5, ChannelLayout::Mono, 44000);
        let mixed = engine.mix(&[], background.clone()).unwrap();

        assert_eq!(mixed, background);
        assert_eq!(store.get_count(), 0);
    }

    #[test]
    fn test_missing_region_aborts_mix() {
        let store = MemoryStore::new();
        store.insert("regions", "a.wav", clip_bytes(0.1, 10, 44000));
        let codec = WavCodec::default();
        let engine = MixEngine::new(RegionFetcher::new(&store, "regions"), &codec, 44000);

        let regions = vec![
            Region::new(0.0, 0.1, "a.wav"),
            Region::new(0.2, 0.3, "missing.wav"),
        ];
        let background = AudioBuffer::silence(1.0, ChannelLayout::Mono, 44000);

        let err = engine.mix(&regions, background).unwrap_err();
        assert!(matches!(err, DubError::NotFound { .. }));
    }

    #[test]
    fn test_undecodable_region_reports_key() {
        let store = MemoryStore::new();
        store.insert("regions", "clips/bad.wav", b"not audio".to_vec());
        let codec = WavCodec::default();
        let engine = MixEngine::new(RegionFetcher::new(&store, "regions"), &codec, 44000);

        let err = engine
            .load_region(&Region::new(0.0, 1.0, "https://cdn.example.com/clips/bad.wav"))
            .unwrap_err();
        match err {
            DubError::Decode { key, .. } => {
                assert_eq!(key.as_deref(), Some("regions/clips/bad.wav"))
            }
            other => panic!("Expected Decode error, got: {:?}", other),
        }
    }
}
