//! Export configuration
//!
//! Bucket names and output format are passed explicitly into the pipeline.
//! `from_env` reads overrides from `DUBMIX_*` environment variables.

use std::env;

use serde::{Deserialize, Serialize};

/// Fixed output sample rate every mix is normalized to
pub const TARGET_SAMPLE_RATE: u32 = 44000;

/// Default output bit depth
pub const OUTPUT_BIT_DEPTH: u16 = 16;

/// Configuration for the export pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Bucket holding project media (background tracks and source videos)
    pub project_bucket: String,
    /// Bucket finished mixes are written to
    pub export_bucket: String,
    /// Bucket holding region clips
    pub regions_bucket: String,
    /// Sample rate of the exported mix
    pub target_sample_rate: u32,
    /// Bit depth of the exported WAV
    pub output_bit_depth: u16,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            project_bucket: "matesub-video-optimized".to_string(),
            export_bucket: "matedub-api-export-staging".to_string(),
            regions_bucket: "matedub-api-cache-files-staging".to_string(),
            target_sample_rate: TARGET_SAMPLE_RATE,
            output_bit_depth: OUTPUT_BIT_DEPTH,
        }
    }
}

impl ExportConfig {
    /// Build a config from defaults overridden by environment variables
    ///
    /// Reads `DUBMIX_PROJECT_BUCKET`, `DUBMIX_EXPORT_BUCKET`,
    /// `DUBMIX_REGIONS_BUCKET`, `DUBMIX_TARGET_SAMPLE_RATE` and
    /// `DUBMIX_OUTPUT_BIT_DEPTH`. Unparseable numbers keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |name: &str, fallback: String| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(fallback)
        };

        Self {
            project_bucket: text("DUBMIX_PROJECT_BUCKET", defaults.project_bucket),
            export_bucket: text("DUBMIX_EXPORT_BUCKET", defaults.export_bucket),
            regions_bucket: text("DUBMIX_REGIONS_BUCKET", defaults.regions_bucket),
            target_sample_rate: lookup("DUBMIX_TARGET_SAMPLE_RATE")
                .and_then(|s| s.trim().parse().ok())
                .filter(|&rate: &u32| rate > 0)
                .unwrap_or(defaults.target_sample_rate),
            output_bit_depth: lookup("DUBMIX_OUTPUT_BIT_DEPTH")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.output_bit_depth),
        }
    }
}
