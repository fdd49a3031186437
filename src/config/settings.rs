//! Configuration settings for SortCopy
//!
//! Defines the CLI arguments, the runtime configuration derived from them,
//! and defaults for a sorting run.

use crate::core::CategoryCase;
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Upper bound for the auto-detected worker count
pub const MAX_AUTO_JOBS: usize = 64;

/// Largest accepted copy buffer
pub const MAX_BUFFER_SIZE: u64 = 1024 * 1024 * 1024;

/// SortCopy - copy a directory tree into per-extension folders
#[derive(Parser, Debug, Clone)]
#[command(name = "sortcopy")]
#[command(author = "SortCopy Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Concurrent file sorting by extension")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = r#"
SortCopy scans a source folder recursively and copies every file into
<OUTPUT>/<extension>/<file name>. Files without an extension go to
<OUTPUT>/no_extension. Copies run in parallel; a failed file is logged
and does not stop the others.

Examples:
  sortcopy ./source_files ./sorted           # Sort a folder
  sortcopy ./src ./dst --jobs 16 --report text
  sortcopy samples ./source_files            # Create demo input files
"#)]
pub struct CliArgs {
    /// Folder to read files from (must exist)
    #[arg(value_name = "SOURCE")]
    pub source: Option<PathBuf>,

    /// Folder to write sorted copies into (created if absent)
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Number of concurrent copies (0 = auto-detect)
    #[arg(short = 'j', long, default_value = "0", value_name = "NUM")]
    pub jobs: usize,

    /// Buffer size for file copies (e.g., 1M, 64K)
    #[arg(short = 'b', long, default_value = "1M", value_name = "SIZE")]
    pub buffer_size: String,

    /// Group extensions case-insensitively (.JPG and .jpg share a folder)
    #[arg(long)]
    pub lowercase: bool,

    /// Follow symbolic links while scanning
    #[arg(short = 'L', long)]
    pub follow_symlinks: bool,

    /// Do not copy timestamps and permissions
    #[arg(long)]
    pub no_preserve: bool,

    /// Abort dispatching new copies after this long (e.g., 30s, 5m)
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Print a run summary to stdout
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub report: Option<ReportFormat>,

    /// Verbose logging (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Emit log lines as JSON
    #[arg(long)]
    pub log_json: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create a folder of sample files to sort
    Samples {
        /// Folder to create the sample files in
        #[arg(value_name = "DIR", default_value = "source_files")]
        dir: PathBuf,
    },
}

/// Run summary format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
}

/// Runtime configuration derived from CLI args
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortConfig {
    /// Source folder
    pub source: PathBuf,
    /// Output folder
    pub destination: PathBuf,
    /// Worker count (0 = auto)
    pub jobs: usize,
    /// Buffer size in bytes
    pub buffer_size: usize,
    /// Category case handling
    pub category_case: CategoryCase,
    /// Preserve timestamps and permissions
    pub preserve: bool,
    /// Follow symlinks while scanning
    pub follow_symlinks: bool,
    /// Overall timeout
    #[serde(with = "humantime_serde_opt")]
    pub timeout: Option<Duration>,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            destination: PathBuf::new(),
            jobs: 0, // Auto-detect
            buffer_size: 1024 * 1024, // 1MB
            category_case: CategoryCase::Preserve,
            preserve: true,
            follow_symlinks: false,
            timeout: None,
        }
    }
}

impl SortConfig {
    /// Create config from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, String> {
        let source = args.source.as_ref().ok_or("Source folder required")?;
        let destination = args.output.as_ref().ok_or("Output folder required")?;

        let buffer_size = parse_size(&args.buffer_size)
            .map_err(|e| format!("Invalid buffer size: {}", e))?;
        if buffer_size == 0 {
            return Err("Invalid buffer size: must be greater than zero".to_string());
        }
        if buffer_size > MAX_BUFFER_SIZE {
            return Err(format!(
                "Invalid buffer size: must be at most {}",
                humansize::format_size(MAX_BUFFER_SIZE, humansize::BINARY)
            ));
        }

        let timeout = args
            .timeout
            .as_deref()
            .map(humantime::parse_duration)
            .transpose()
            .map_err(|e| format!("Invalid timeout: {}", e))?;

        Ok(Self {
            source: source.clone(),
            destination: destination.clone(),
            jobs: args.jobs,
            buffer_size: buffer_size as usize,
            category_case: if args.lowercase {
                CategoryCase::Lower
            } else {
                CategoryCase::Preserve
            },
            preserve: !args.no_preserve,
            follow_symlinks: args.follow_symlinks,
            timeout,
        })
    }

    /// Worker count with auto-detection resolved
    pub fn effective_jobs(&self) -> usize {
        if self.jobs == 0 {
            (num_cpus::get() * 4).clamp(4, MAX_AUTO_JOBS)
        } else {
            self.jobs
        }
    }
}

/// Parse human-readable size string to bytes
pub fn parse_size(size: &str) -> Result<u64, String> {
    let size = size.trim().to_uppercase();

    if size.is_empty() {
        return Err("Empty size string".to_string());
    }

    let (num_str, multiplier) = if size.ends_with("GB") || size.ends_with('G') {
        (size.trim_end_matches(['G', 'B']), 1024u64 * 1024 * 1024)
    } else if size.ends_with("MB") || size.ends_with('M') {
        (size.trim_end_matches(['M', 'B']), 1024u64 * 1024)
    } else if size.ends_with("KB") || size.ends_with('K') {
        (size.trim_end_matches(['K', 'B']), 1024u64)
    } else if size.ends_with('B') {
        (size.trim_end_matches('B'), 1u64)
    } else {
        // Assume bytes if no suffix
        (size.as_str(), 1u64)
    };

    let num: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: {}", num_str))?;

    if !num.is_finite() {
        return Err(format!("Invalid number: {}", num_str));
    }
    if num < 0.0 {
        return Err(format!("Negative size: {}", num_str));
    }

    let bytes = num * multiplier as f64;
    if bytes >= u64::MAX as f64 {
        return Err(format!("Size too large: {}", size));
    }

    Ok(bytes as u64)
}

mod humantime_serde_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&humantime::format_duration(*d).to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        raw.map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
