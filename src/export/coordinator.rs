//! Export Coordinator
//!
//! Runs one export job through
//! `CheckExisting -> Validating -> Mixing -> Uploading -> Done`,
//! short-circuiting to `Aborted` when the output already exists (success) or
//! the regions are invalid (failure).
//!
//! The existence check is advisory: two concurrent jobs for the same
//! (project, locale) may both mix and the last upload wins.

use std::fmt;

use tracing::{info, warn};

use crate::config::ExportConfig;
use crate::engine::{AudioCodec, MixEngine, WavCodec};
use crate::error::Result;
use crate::export::fetch::RegionFetcher;
use crate::export::job::ExportRequest;
use crate::storage::{ObjectStore, Visibility};

/// Stages an export job moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    CheckExisting,
    Validating,
    Mixing,
    Uploading,
    Done,
    Aborted,
}

impl fmt::Display for ExportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportState::CheckExisting => write!(f, "CHECK_EXISTING"),
            ExportState::Validating => write!(f, "VALIDATING"),
            ExportState::Mixing => write!(f, "MIXING"),
            ExportState::Uploading => write!(f, "UPLOADING"),
            ExportState::Done => write!(f, "DONE"),
            ExportState::Aborted => write!(f, "ABORTED"),
        }
    }
}

/// Successful result of an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The output already existed and was not rebuilt
    Reused { key: String },
    /// A new mix was built and uploaded
    Generated { key: String },
}

impl ExportOutcome {
    /// Key of the mixed track in the export bucket
    pub fn key(&self) -> &str {
        match self {
            ExportOutcome::Reused { key } | ExportOutcome::Generated { key } => key,
        }
    }

    pub fn was_generated(&self) -> bool {
        matches!(self, ExportOutcome::Generated { .. })
    }
}

/// Decides whether a rebuild is needed, runs the mix and persists it
pub struct ExportCoordinator<'a> {
    store: &'a dyn ObjectStore,
    codec: Box<dyn AudioCodec>,
    config: ExportConfig,
}

impl<'a> ExportCoordinator<'a> {
    /// Create a coordinator writing WAV at the configured bit depth
    pub fn new(store: &'a dyn ObjectStore, config: ExportConfig) -> Self {
        let codec = Box::new(WavCodec::new(config.output_bit_depth));
        Self::with_codec(store, codec, config)
    }

    /// Create a coordinator with a custom codec
    pub fn with_codec(
        store: &'a dyn ObjectStore,
        codec: Box<dyn AudioCodec>,
        config: ExportConfig,
    ) -> Self {
        Self {
            store,
            codec,
            config,
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    fn transition(&self, request: &ExportRequest, state: ExportState) {
        info!("Export {}/{}: {}", request.project_id, request.locale, state);
    }

    /// Run an export job
    ///
    /// Returns the existing key without touching regions when the output is
    /// already present and `force_generation` is false. Uploads only after a
    /// complete mix, so a failed job never leaves a partial object.
    ///
    /// # Errors
    /// * `Validation` - a region is missing a field or malformed
    /// * `NotFound` - the background track or a region clip is absent
    /// * `Transfer` - a download or the upload failed
    /// * `Decode` - the background or a clip is not decodable audio
    /// * `Timeline` - a clip would grow the mix past `MAX_TIMELINE_SECS`
    pub fn export(&self, request: &ExportRequest) -> Result<ExportOutcome> {
        let key = request.output_key();

        self.transition(request, ExportState::CheckExisting);
        if !request.force_generation && self.store.exists(&self.config.export_bucket, &key) {
            info!("{} already exists, skipping generation", key);
            self.transition(request, ExportState::Aborted);
            return Ok(ExportOutcome::Reused { key });
        }

        self.transition(request, ExportState::Validating);
        let job = match request.validated() {
            Ok(job) => job,
            Err(e) => {
                warn!("Invalid regions: {}", e);
                self.transition(request, ExportState::Aborted);
                return Err(e);
            }
        };

        self.transition(request, ExportState::Mixing);
        let background_bytes = self
            .store
            .get(&self.config.project_bucket, &job.no_vocal_key)?;
        let background = self
            .codec
            .decode(&background_bytes)
            .map_err(|e| e.for_object(&self.config.project_bucket, &job.no_vocal_key))?;

        let engine = MixEngine::new(
            RegionFetcher::new(self.store, self.config.regions_bucket.clone()),
            self.codec.as_ref(),
            self.config.target_sample_rate,
        );
        let mixed = engine.mix(&job.regions, background)?;

        self.transition(request, ExportState::Uploading);
        let encoded = self.codec.encode(&mixed)?;
        self.store.put(
            &self.config.export_bucket,
            &key,
            encoded,
            Visibility::PublicRead,
        )?;

        self.transition(request, ExportState::Done);
        Ok(ExportOutcome::Generated { key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{AudioBuffer, ChannelLayout};
    use crate::error::DubError;
    use crate::export::region::RegionDescriptor;
    use crate::storage::MemoryStore;

    fn config() -> ExportConfig {
        ExportConfig {
            project_bucket: "projects".to_string(),
            export_bucket: "exports".to_string(),
            regions_bucket: "regions".to_string(),
            ..ExportConfig::default()
        }
    }

    fn wav(buffer: &AudioBuffer) -> Vec<u8> {
        WavCodec::default().encode(buffer).unwrap()
    }

    fn request(regions: Vec<RegionDescriptor>, force: bool) -> ExportRequest {
        ExportRequest {
            project_id: "p1".to_string(),
            locale: "fr".to_string(),
            regions,
            force_generation: force,
            no_vocal_key: "p1/no_vocal.wav".to_string(),
            video_key: "video.mp4".to_string(),
        }
    }

    fn region(start: f64, url: &str) -> RegionDescriptor {
        RegionDescriptor {
            start: Some(start),
            end: Some(start + 0.1),
            url: Some(url.to_string()),
        }
    }

    #[test]
    fn test_existing_output_is_reused() {
        let store = MemoryStore::new();
        store.insert("exports", "p1/dub_audio_background_fr.wav", vec![1]);
        let coordinator = ExportCoordinator::new(&store, config());

        // Invalid regions are never looked at once the output exists
        let outcome = coordinator
            .export(&request(vec![RegionDescriptor::default()], false))
            .unwrap();

        assert_eq!(
            outcome,
            ExportOutcome::Reused {
                key: "p1/dub_audio_background_fr.wav".to_string()
            }
        );
        assert_eq!(store.get_count(), 0);
        assert_eq!(store.put_count(), 0);
    }

    #[test]
    fn test_invalid_region_fetches_nothing() {
        let store = MemoryStore::new();
        let coordinator = ExportCoordinator::new(&store, config());

        let mut missing_url = region(0.5, "a.wav");
        missing_url.url = None;
        let err = coordinator
            .export(&request(vec![region(0.0, "b.wav"), missing_url], false))
            .unwrap_err();

        assert!(matches!(err, DubError::Validation { index: 1, .. }));
        assert_eq!(store.get_count(), 0);
        assert_eq!(store.put_count(), 0);
    }

    #[test]
    fn test_missing_background_uploads_nothing() {
        let store = MemoryStore::new();
        let coordinator = ExportCoordinator::new(&store, config());

        let err = coordinator.export(&request(vec![], false)).unwrap_err();

        match err {
            DubError::NotFound { bucket, key } => {
                assert_eq!(bucket, "projects");
                assert_eq!(key, "p1/no_vocal.wav");
            }
            other => panic!("Expected NotFound error, got: {:?}", other),
        }
        assert_eq!(store.put_count(), 0);
    }

    #[test]
    fn test_generates_public_output() {
        let store = MemoryStore::new();
        store.insert(
            "projects",
            "p1/no_vocal.wav",
            wav(&AudioBuffer::silence(1.0, ChannelLayout::Stereo, 48000)),
        );
        store.insert(
            "regions",
            "clips/a.wav",
            wav(&AudioBuffer::silence(0.2, ChannelLayout::Mono, 16000)),
        );
        let coordinator = ExportCoordinator::new(&store, config());

        let outcome = coordinator
            .export(&request(vec![region(0.25, "https://cdn.example.com/clips/a.wav")], false))
            .unwrap();

        assert!(outcome.was_generated());
        assert_eq!(outcome.key(), "p1/dub_audio_background_fr.wav");
        assert_eq!(
            store.visibility("exports", outcome.key()),
            Some(Visibility::PublicRead)
        );

        let stored = store.object("exports", outcome.key()).unwrap();
        let decoded = WavCodec::default().decode(&stored).unwrap();
        assert_eq!(decoded.sample_rate, 44000);
        assert_eq!(decoded.channels(), 2);
    }

    #[test]
    fn test_undecodable_background() {
        let store = MemoryStore::new();
        store.insert("projects", "p1/no_vocal.wav", b"garbage".to_vec());
        let coordinator = ExportCoordinator::new(&store, config());

        let err = coordinator.export(&request(vec![], false)).unwrap_err();
        assert_eq!(err.error_code(), "DECODE_ERROR");
        assert_eq!(store.put_count(), 0);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ExportState::CheckExisting.to_string(), "CHECK_EXISTING");
        assert_eq!(ExportState::Aborted.to_string(), "ABORTED");
    }
}
