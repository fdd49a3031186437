//! SortCopy CLI - Concurrent File Sorting by Extension
//!
//! Copies every file under a source folder into per-extension folders.
//!
//! Exit codes: 0 on full success, 1 when the run cannot start, 2 when the run
//! finished but some files were not copied.

use clap::Parser;
use sortcopy::config::{CliArgs, Commands, ReportFormat, SortConfig};
use sortcopy::core::SortEngine;
use sortcopy::error::{Result, SortCopyError};
use sortcopy::fs::write_samples;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Run started but not every file was copied
const EXIT_PARTIAL: i32 = 2;

fn main() {
    let args = CliArgs::parse();

    init_logging(args.verbose, args.log_json);

    match run(&args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match verbose {
            0 => "error",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        EnvFilter::new(level)
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(args: &CliArgs) -> Result<i32> {
    if let Some(command) = &args.command {
        return handle_command(command);
    }

    let config = SortConfig::from_cli(args).map_err(SortCopyError::ConfigError)?;

    tracing::debug!(
        source = %config.source.display(),
        destination = %config.destination.display(),
        jobs = config.effective_jobs(),
        "Starting sort"
    );

    let engine = SortEngine::new(config);
    let report = engine.execute()?;

    match args.report {
        Some(ReportFormat::Text) => report.print_summary(),
        Some(ReportFormat::Json) => {
            let json = report
                .to_json()
                .map_err(|e| SortCopyError::config(format!("Cannot encode report: {}", e)))?;
            println!("{}", json);
        }
        None => {}
    }

    Ok(if report.is_success() { 0 } else { EXIT_PARTIAL })
}

fn handle_command(command: &Commands) -> Result<i32> {
    match command {
        Commands::Samples { dir } => cmd_samples(dir),
    }
}

fn cmd_samples(dir: &Path) -> Result<i32> {
    let written = write_samples(dir)?;
    tracing::info!(count = written.len(), dir = %dir.display(), "Sample files written");
    println!("Wrote {} sample files to {}", written.len(), dir.display());
    Ok(0)
}
