//! CLI Command Implementations

use std::fs;
use std::io::Read;
use std::path::Path;

use tracing::info;

use crate::config::ExportConfig;
use crate::engine::{AudioCodec, WavCodec};
use crate::error::Result;
use crate::export::{ExportCoordinator, ExportRequest};
use crate::handler::{handle_request, HandlerResponse};
use crate::storage::FsStore;

/// Bucket overrides taken from the command line
#[derive(Debug, Clone, Default)]
pub struct BucketOverrides {
    pub project_bucket: Option<String>,
    pub export_bucket: Option<String>,
    pub regions_bucket: Option<String>,
}

impl BucketOverrides {
    fn apply(self, mut config: ExportConfig) -> ExportConfig {
        if let Some(bucket) = self.project_bucket {
            config.project_bucket = bucket;
        }
        if let Some(bucket) = self.export_bucket {
            config.export_bucket = bucket;
        }
        if let Some(bucket) = self.regions_bucket {
            config.regions_bucket = bucket;
        }
        config
    }
}

fn read_job(job: &Path) -> Result<String> {
    if job == Path::new("-") {
        let mut body = String::new();
        std::io::stdin().read_to_string(&mut body)?;
        Ok(body)
    } else {
        Ok(fs::read_to_string(job)?)
    }
}

/// Run an export job against a directory-backed store.
///
/// `force` sets `force_generation` on the request before it is handled.
pub fn export_job(
    job: &Path,
    store_root: &Path,
    force: bool,
    overrides: BucketOverrides,
) -> Result<HandlerResponse> {
    let mut body = read_job(job)?;
    if force {
        let mut request = ExportRequest::from_json(&body)?;
        request.force_generation = true;
        body = serde_json::to_string(&request)?;
    }

    let config = overrides.apply(ExportConfig::from_env());
    info!(
        "Exporting with store at {} (export bucket {})",
        store_root.display(),
        config.export_bucket
    );

    let store = FsStore::new(store_root);
    let coordinator = ExportCoordinator::new(&store, config);
    Ok(handle_request(&body, &coordinator))
}

/// Overlay `overlay` onto `base` at `position_ms` and write the result
pub fn overlay_files(
    base: &Path,
    overlay: &Path,
    position_ms: f64,
    output: &Path,
    bit_depth: u16,
) -> Result<()> {
    let codec = WavCodec::new(bit_depth);
    let load = |path: &Path| -> Result<_> {
        let bytes = fs::read(path)?;
        codec
            .decode(&bytes)
            .map_err(|e| e.at(path.display().to_string()))
    };

    let mut mixed = load(base)?;
    let clip = load(overlay)?;
    info!(
        "Overlaying {} onto {} at {:.1}ms",
        overlay.display(),
        base.display(),
        position_ms
    );
    mixed.overlay(&clip, position_ms)?;

    fs::write(output, codec.encode(&mixed)?)?;
    println!("Wrote {} ({:.3}s)", output.display(), mixed.duration_secs());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{AudioBuffer, ChannelLayout};
    use crate::error::DubError;
    use tempfile::tempdir;

    #[test]
    fn test_overlay_files() {
        let dir = tempdir().unwrap();
        let codec = WavCodec::default();
        let base = dir.path().join("base.wav");
        let clip = dir.path().join("clip.wav");
        let out = dir.path().join("out.wav");

        let bed = AudioBuffer::silence(1.0, ChannelLayout::Mono, 8000);
        fs::write(&base, codec.encode(&bed).unwrap()).unwrap();
        let tone = AudioBuffer {
            samples: vec![vec![0.5; 8000]],
            sample_rate: 8000,
        };
        fs::write(&clip, codec.encode(&tone).unwrap()).unwrap();

        overlay_files(&base, &clip, 500.0, &out, 16).unwrap();

        let mixed = codec.decode(&fs::read(&out).unwrap()).unwrap();
        assert_eq!(mixed.len(), 12_000);
        assert_eq!(mixed.get_sample(0, 3999), Some(0.0));
        assert!((mixed.channel(0)[4000] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_overlay_missing_base() {
        let dir = tempdir().unwrap();
        let err = overlay_files(
            &dir.path().join("nope.wav"),
            &dir.path().join("nope2.wav"),
            0.0,
            &dir.path().join("out.wav"),
            16,
        )
        .unwrap_err();
        assert!(matches!(err, DubError::Io(_)));
    }

    #[test]
    fn test_bucket_overrides() {
        let overrides = BucketOverrides {
            export_bucket: Some("local-exports".to_string()),
            ..BucketOverrides::default()
        };
        let config = overrides.apply(ExportConfig::default());
        assert_eq!(config.export_bucket, "local-exports");
        assert_eq!(config.project_bucket, ExportConfig::default().project_bucket);
    }
}
