//! Region descriptors and validation
//!
//! A region is one voice clip to overlay onto the background bed. Inbound
//! descriptors are deserialized leniently (every field optional) so a
//! malformed region is reported by the validator, with its position and the
//! missing field, rather than failing the whole request parse.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::buffer::MAX_TIMELINE_SECS;
use crate::error::{DubError, Result};
use crate::export::fetch::object_key_from_url;

/// Region as it arrives in a job request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionDescriptor {
    #[serde(default)]
    pub start: Option<f64>,
    #[serde(default)]
    pub end: Option<f64>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Validated region: a voice clip and the time window it occupies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Start offset into the background track, in seconds
    pub start: f64,
    /// End offset, in seconds
    pub end: f64,
    /// Clip location; only the path component identifies the stored object
    pub url: String,
}

impl Region {
    pub fn new(start: f64, end: f64, url: impl Into<String>) -> Self {
        Self {
            start,
            end,
            url: url.into(),
        }
    }

    /// Overlay position in milliseconds
    #[inline]
    pub fn offset_ms(&self) -> f64 {
        self.start * 1000.0
    }
}

/// Why a region descriptor was rejected
#[derive(Debug, Clone, PartialEq)]
pub struct RegionIssue {
    /// Position of the region in the request
    pub index: usize,
    /// Human-readable reason
    pub reason: String,
}

impl From<RegionIssue> for DubError {
    fn from(issue: RegionIssue) -> Self {
        DubError::Validation {
            index: issue.index,
            reason: issue.reason,
        }
    }
}

fn check_one(
    index: usize,
    descriptor: &RegionDescriptor,
) -> std::result::Result<Region, RegionIssue> {
    let issue = |reason: String| RegionIssue { index, reason };

    let start = descriptor
        .start
        .ok_or_else(|| issue("field start not present".to_string()))?;
    let end = descriptor
        .end
        .ok_or_else(|| issue("field end not present".to_string()))?;
    let url = descriptor
        .url
        .as_ref()
        .ok_or_else(|| issue("field url not present".to_string()))?;

    if !start.is_finite() || start < 0.0 {
        return Err(issue(format!("start {} must be a non-negative number", start)));
    }
    if start > MAX_TIMELINE_SECS {
        return Err(issue(format!(
            "start {} is past the {}s timeline limit",
            start, MAX_TIMELINE_SECS
        )));
    }
    if !end.is_finite() {
        return Err(issue(format!("end {} must be a finite number", end)));
    }
    if let Err(e) = object_key_from_url(url) {
        return Err(issue(format!("url '{}' cannot be parsed: {}", url, e)));
    }

    Ok(Region::new(start, end, url.clone()))
}

/// Validate every descriptor, stopping at the first bad one
///
/// Performs no I/O. The offending region is logged before returning.
pub fn check_regions(
    descriptors: &[RegionDescriptor],
) -> std::result::Result<Vec<Region>, RegionIssue> {
    descriptors
        .iter()
        .enumerate()
        .map(|(index, descriptor)| check_one(index, descriptor))
        .collect::<std::result::Result<Vec<_>, _>>()
        .inspect_err(|issue| {
            warn!(
                "Invalid region {} ({:?}): {}",
                issue.index, descriptors[issue.index], issue.reason
            );
        })
}

/// Report whether every descriptor carries a usable start, end and url
pub fn validate(descriptors: &[RegionDescriptor]) -> bool {
    check_regions(descriptors).is_ok()
}

/// Validate descriptors, converting a rejection into `DubError::Validation`
pub fn into_regions(descriptors: &[RegionDescriptor]) -> Result<Vec<Region>> {
    Ok(check_regions(descriptors)?)
}
