//! restoremod CLI - post-processing permission restore
//!
//! Invoked by a download manager after a download completes. Maps the run's
//! outcome onto the manager's post-processing exit-code convention.

use clap::Parser;
use restoremod::config::{CliArgs, PostProcessStatus, RestoreConfig};
use restoremod::core::RestoreEngine;
use tracing_subscriber::EnvFilter;

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    // Parse CLI arguments
    let args = CliArgs::parse();

    std::process::exit(run(&args).code());
}

fn run(args: &CliArgs) -> PostProcessStatus {
    // Only a successful download is eligible for post-processing
    if let Some(status) = &args.status {
        if status != "SUCCESS" {
            tracing::info!("download finished with status {}, skipping", status);
            return PostProcessStatus::Nothing;
        }
    }

    let config = match RestoreConfig::from_cli(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return PostProcessStatus::Failure;
        }
    };

    // Reprocessing a deleted history item is not a failure. A destination
    // that still exists but cannot be resolved to a directory is.
    if std::fs::symlink_metadata(&config.directory).is_err() {
        tracing::info!(
            "nothing to post-process, destination {} does not exist",
            config.directory.display()
        );
        return PostProcessStatus::Nothing;
    }

    match RestoreEngine::new(config).execute() {
        Ok(report) => {
            if !args.quiet {
                report.print_summary();
            }
            PostProcessStatus::Success
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            PostProcessStatus::Failure
        }
    }
}
