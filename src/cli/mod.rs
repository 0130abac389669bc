//! CLI Module
//!
//! Command-line adapter for the export pipeline.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Dubmix - assemble dubbed audio tracks from a background bed and voice regions
#[derive(Parser, Debug)]
#[command(name = "dubmix")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an export job against a directory-backed object store
    #[command(name = "export")]
    Export {
        /// Job request JSON file, or `-` for stdin
        #[arg(short, long)]
        job: PathBuf,

        /// Directory holding one sub-directory per bucket
        #[arg(short, long)]
        store_root: PathBuf,

        /// Rebuild even if the output already exists
        #[arg(long)]
        force: bool,

        /// Override the project bucket
        #[arg(long)]
        project_bucket: Option<String>,

        /// Override the export bucket
        #[arg(long)]
        export_bucket: Option<String>,

        /// Override the regions bucket
        #[arg(long)]
        regions_bucket: Option<String>,
    },

    /// Overlay one WAV file onto another
    #[command(name = "overlay")]
    Overlay {
        /// Base audio file
        base: PathBuf,

        /// Audio file laid over the base
        overlay: PathBuf,

        /// Position of the overlay in milliseconds
        #[arg(short, long, default_value_t = 0.0)]
        position_ms: f64,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,

        /// Output bit depth (16, 24 or 32)
        #[arg(long, default_value_t = 16)]
        bit_depth: u16,
    },
}
