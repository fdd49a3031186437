//! # SortCopy - Concurrent File Sorting by Extension
//!
//! SortCopy scans a folder recursively and copies every regular file into a
//! subfolder of the output folder named after the file's extension:
//! `<output>/<extension>/<file name>`, or `<output>/no_extension/<file name>`.
//!
//! ## Features
//!
//! - **Bounded Parallel Copying**: one task per file on a rayon worker pool
//! - **Isolated Failures**: a failed file is reported and never stops the rest
//! - **Metadata Preservation**: modification time and permission bits
//! - **Injectable Diagnostics**: capture per-path errors instead of logging
//! - **Cancellation**: a shared flag or an overall timeout stops new copies
//!
//! ## Quick Start
//!
//! ```no_run
//! use sortcopy::core::sort_files;
//! use std::path::Path;
//!
//! let report = sort_files(Path::new("source_files"), Path::new("sorted")).unwrap();
//! println!("Copied {} of {} files", report.files_copied, report.files_found);
//! ```
//!
//! ## Capturing Diagnostics
//!
//! ```no_run
//! use sortcopy::config::SortConfig;
//! use sortcopy::core::SortEngine;
//! use sortcopy::diagnostics::MemoryDiagnostics;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! let config = SortConfig {
//!     source: PathBuf::from("/source"),
//!     destination: PathBuf::from("/sorted"),
//!     jobs: 8,
//!     ..Default::default()
//! };
//!
//! let sink = Arc::new(MemoryDiagnostics::new());
//! let report = SortEngine::new(config)
//!     .with_diagnostics(sink.clone())
//!     .execute()
//!     .unwrap();
//!
//! for event in sink.events() {
//!     eprintln!("{}: {}", event.path.display(), event.message);
//! }
//! report.print_summary();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod diagnostics;
pub mod error;
pub mod fs;

// Re-export commonly used types
pub use config::SortConfig;
pub use core::{sort_files, Category, SortEngine, SortReport};
pub use error::{Result, SortCopyError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use sortcopy::prelude::*;
    //! ```

    pub use crate::config::SortConfig;
    pub use crate::core::{sort_files, Category, CategoryCase, Dispatcher, SortEngine, SortReport};
    pub use crate::diagnostics::{Diagnostics, MemoryDiagnostics, TracingDiagnostics};
    pub use crate::error::{Result, SortCopyError};
    pub use crate::fs::{FileCopier, FileEntry, ScanConfig, Scanner};
}
