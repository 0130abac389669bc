//! Export Pipeline
//!
//! Job schema, region validation and fetching, and the coordinator that
//! turns an export request into a stored dub track.

pub mod coordinator;
pub mod fetch;
pub mod job;
pub mod region;

pub use coordinator::{ExportCoordinator, ExportOutcome, ExportState};
pub use fetch::{object_key_from_url, RegionFetcher};
pub use job::{output_key, ExportJob, ExportLocations, ExportRequest};
pub use region::{check_regions, into_regions, validate, Region, RegionDescriptor, RegionIssue};
