//! Run report
//!
//! Aggregates task outcomes and scan errors without short-circuiting.

use crate::core::{DispatchResult, TaskState};
use crate::fs::ScanResult;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Summary of a sorting run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SortReport {
    /// Source folder
    pub source: PathBuf,
    /// Output folder
    pub destination: PathBuf,
    /// Files found by the scan
    pub files_found: u64,
    /// Files copied successfully
    pub files_copied: u64,
    /// Bytes copied
    pub bytes_copied: u64,
    /// Copied files per category
    pub categories: BTreeMap<String, u64>,
    /// Failed copies as (path, error)
    pub failures: Vec<(PathBuf, String)>,
    /// Paths that could not be enumerated as (path, error)
    pub scan_errors: Vec<(PathBuf, String)>,
    /// Files never started because the run was cancelled
    pub skipped: u64,
    /// Total duration
    #[serde(serialize_with = "serialize_duration")]
    pub duration: Duration,
    /// Average throughput in bytes/second
    pub throughput: f64,
}

impl SortReport {
    /// Build a report from a scan and the dispatch that followed it
    pub fn from_parts(scan: &ScanResult, dispatch: DispatchResult, destination: PathBuf) -> Self {
        let mut report = SortReport {
            source: scan.root.clone(),
            destination,
            files_found: scan.files.len() as u64,
            scan_errors: scan.errors.clone(),
            skipped: dispatch.skipped as u64,
            ..Default::default()
        };

        for outcome in dispatch.outcomes {
            match (outcome.state, outcome.result) {
                (TaskState::Succeeded, Ok(stats)) => {
                    report.files_copied += 1;
                    report.bytes_copied += stats.bytes_copied;
                    *report.categories.entry(outcome.category.to_string()).or_default() += 1;
                }
                (_, Err(err)) => report.failures.push((outcome.source, err.to_string())),
                (state, Ok(_)) => {
                    tracing::warn!(?state, path = %outcome.source.display(), "Outcome without terminal failure");
                }
            }
        }

        report.duration = scan.scan_duration + dispatch.duration;
        if report.duration.as_secs_f64() > 0.0 {
            report.throughput = report.bytes_copied as f64 / report.duration.as_secs_f64();
        }

        report
    }

    /// Check if every file was found and copied
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.scan_errors.is_empty() && self.skipped == 0
    }

    /// Log a one-line summary
    pub fn log_summary(&self) {
        tracing::info!(
            found = self.files_found,
            copied = self.files_copied,
            failed = self.failures.len(),
            scan_errors = self.scan_errors.len(),
            skipped = self.skipped,
            categories = self.categories.len(),
            duration = ?self.duration,
            "Sort finished"
        );
    }

    /// Print summary to console
    pub fn print_summary(&self) {
        println!("\n=== Sort Summary ===");
        println!("Source:          {}", self.source.display());
        println!("Destination:     {}", self.destination.display());
        println!("Files found:     {}", self.files_found);
        println!("Files copied:    {}", self.files_copied);
        println!("Bytes copied:    {}", humansize::format_size(self.bytes_copied, humansize::BINARY));
        println!("Duration:        {:.2?}", self.duration);
        println!("Throughput:      {}/s", humansize::format_size(self.throughput as u64, humansize::BINARY));

        if !self.categories.is_empty() {
            println!("\nCategories:");
            for (category, count) in &self.categories {
                println!("  {:<16} {}", category, count);
            }
        }

        if self.skipped > 0 {
            println!("\nSkipped (cancelled): {}", self.skipped);
        }

        if !self.scan_errors.is_empty() {
            println!("\nScan errors: {}", self.scan_errors.len());
            for (path, error) in &self.scan_errors {
                println!("  {} - {}", path.display(), error);
            }
        }

        if !self.failures.is_empty() {
            println!("\nFailures: {}", self.failures.len());
            for (path, error) in &self.failures {
                println!("  {} - {}", path.display(), error);
            }
        }
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn serialize_duration<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}
