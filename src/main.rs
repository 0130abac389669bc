//! Dubmix CLI
//!
//! Command-line interface for the dubbed-audio export pipeline.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dubmix::cli::commands::{self, BucketOverrides};
use dubmix::cli::{Cli, Commands};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Dubmix v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Export {
            job,
            store_root,
            force,
            project_bucket,
            export_bucket,
            regions_bucket,
        } => {
            let overrides = BucketOverrides {
                project_bucket,
                export_bucket,
                regions_bucket,
            };
            let response = commands::export_job(&job, &store_root, force, overrides)
                .with_context(|| format!("failed to run export job {}", job.display()))?;

            println!("{}", response.body);
            if response.is_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Overlay {
            base,
            overlay,
            position_ms,
            output,
            bit_depth,
        } => {
            commands::overlay_files(&base, &overlay, position_ms, &output, bit_depth)
                .context("overlay failed")?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
