//! Sort engine
//!
//! Validates the run's paths, scans the source folder, and hands the file
//! list to the [`Dispatcher`]. Only the precondition checks are fatal.

use crate::config::SortConfig;
use crate::core::{Dispatcher, SortReport};
use crate::diagnostics::{default_diagnostics, SharedDiagnostics};
use crate::error::{IoResultExt, Result, SortCopyError};
use crate::fs::{CopyOptions, ScanConfig, Scanner};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Main sort engine
pub struct SortEngine {
    config: SortConfig,
    dispatcher: Dispatcher,
    diagnostics: SharedDiagnostics,
}

impl SortEngine {
    /// Create a new engine reporting through `tracing`
    pub fn new(config: SortConfig) -> Self {
        let copy_options = CopyOptions {
            buffer_size: config.buffer_size,
            preserve_permissions: config.preserve,
            preserve_mtime: config.preserve,
            ..Default::default()
        };

        let dispatcher = Dispatcher::new(config.effective_jobs(), copy_options)
            .with_case(config.category_case)
            .with_timeout(config.timeout);

        Self {
            config,
            dispatcher,
            diagnostics: default_diagnostics(),
        }
    }

    /// Report per-path events to `diagnostics` instead
    pub fn with_diagnostics(mut self, diagnostics: SharedDiagnostics) -> Self {
        self.dispatcher = self.dispatcher.with_diagnostics(Arc::clone(&diagnostics));
        self.diagnostics = diagnostics;
        self
    }

    /// Get cancellation flag for external control
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        self.dispatcher.cancellation_flag()
    }

    /// Execute the sort.
    ///
    /// Returns `Err` only when the source is missing or not a directory, the
    /// output folder cannot be created, or the worker pool cannot start.
    /// Per-file failures are recorded in the report.
    pub fn execute(&self) -> Result<SortReport> {
        let source = &self.config.source;
        let destination = &self.config.destination;

        validate_source(source)?;

        std::fs::create_dir_all(destination).with_path(destination)?;

        let scanner = Scanner::with_diagnostics(
            ScanConfig {
                follow_symlinks: self.config.follow_symlinks,
                exclude: nested_output(source, destination).into_iter().collect(),
            },
            Arc::clone(&self.diagnostics),
        );

        let scan = scanner.scan(source);
        tracing::info!(files = scan.file_count(), root = %scan.root.display(), "Scan complete");

        let dispatch = self.dispatcher.dispatch(scan.files.clone(), destination)?;

        let report = SortReport::from_parts(&scan, dispatch, destination.clone());
        report.log_summary();

        Ok(report)
    }
}

/// Check the source folder exists and is a directory
pub fn validate_source(source: &Path) -> Result<()> {
    match std::fs::metadata(source) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(SortCopyError::NotADirectory(source.to_path_buf())),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(SortCopyError::NotFound(source.to_path_buf()))
        }
        Err(err) => Err(SortCopyError::io(source, err)),
    }
}

/// The output folder, if it lies inside the source folder
fn nested_output(source: &Path, destination: &Path) -> Option<std::path::PathBuf> {
    let source = source.canonicalize().ok()?;
    let destination = destination.canonicalize().ok()?;

    if destination != source && destination.starts_with(&source) {
        Some(destination)
    } else {
        None
    }
}

/// Sort `source` into `dest` with default settings
pub fn sort_files(source: &Path, dest: &Path) -> Result<SortReport> {
    let config = SortConfig {
        source: source.to_path_buf(),
        destination: dest.to_path_buf(),
        ..Default::default()
    };

    SortEngine::new(config).execute()
}
