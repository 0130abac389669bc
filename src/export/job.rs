//! Export job schema
//!
//! `ExportRequest` is the inbound payload; `ExportJob` is the same request
//! after its regions have passed validation. `ExportLocations` is what the
//! caller gets back on success.

use serde::{Deserialize, Serialize};

use crate::config::ExportConfig;
use crate::error::Result;
use crate::export::region::{into_regions, Region, RegionDescriptor};

/// Deterministic key of the mixed track for a (project, locale) pair
///
/// The key doubles as the idempotency token: if it exists, the export is
/// already built.
pub fn output_key(project_id: &str, locale: &str) -> String {
    format!("{}/dub_audio_background_{}.wav", project_id, locale)
}

/// Inbound mix-and-export request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub project_id: String,
    pub locale: String,
    pub regions: Vec<RegionDescriptor>,
    pub force_generation: bool,
    /// Background (no-vocal) track key in the project bucket
    pub no_vocal_key: String,
    /// Source video key in the project bucket
    pub video_key: String,
}

impl ExportRequest {
    /// Parse a request from its JSON body
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Key the mixed track is written to
    pub fn output_key(&self) -> String {
        output_key(&self.project_id, &self.locale)
    }

    /// Validate the regions, producing a typed job
    pub fn validated(&self) -> Result<ExportJob> {
        Ok(ExportJob {
            project_id: self.project_id.clone(),
            locale: self.locale.clone(),
            regions: into_regions(&self.regions)?,
            force_generation: self.force_generation,
            no_vocal_key: self.no_vocal_key.clone(),
            video_key: self.video_key.clone(),
        })
    }
}

/// Validated export job
///
/// `regions` keeps request order; the mix engine sorts by start time.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportJob {
    pub project_id: String,
    pub locale: String,
    pub regions: Vec<Region>,
    pub force_generation: bool,
    pub no_vocal_key: String,
    pub video_key: String,
}

impl ExportJob {
    pub fn output_key(&self) -> String {
        output_key(&self.project_id, &self.locale)
    }
}

/// Storage locations handed to the downstream mux step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportLocations {
    /// Source video
    pub video_input_s3: String,
    /// Mixed dub track
    pub audio_input_s3: String,
    /// Where the muxed video + audio should be written
    pub output_s3: String,
}

impl ExportLocations {
    pub fn new(config: &ExportConfig, request: &ExportRequest, audio_key: &str) -> Self {
        Self {
            video_input_s3: format!("s3://{}/{}", config.project_bucket, request.video_key),
            audio_input_s3: format!("s3://{}/{}", config.export_bucket, audio_key),
            output_s3: format!(
                "s3://{}/{}/dubbed_{}",
                config.export_bucket, request.project_id, request.video_key
            ),
        }
    }
}
