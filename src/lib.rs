//! Dubmix - Dubbed Audio Track Assembly
//!
//! Builds a single dubbed-audio track for a video project: a background
//! (no-vocal) bed is fetched from object storage, timestamped voice regions
//! are overlaid onto it in start-time order, and the mix is written back to
//! a deterministic key in the export bucket.
//!
//! # Architecture
//!
//! - `engine`: audio buffer, codec and mix engine
//! - `storage`: object storage capability and gateways
//! - `export`: job schema, region validation/fetching, export coordinator
//! - `handler`: JSON request/response adapter for whatever transport invokes a job

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod handler;
pub mod storage;

pub use config::ExportConfig;
pub use error::{DubError, Result};
