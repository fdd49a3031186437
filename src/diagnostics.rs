//! Diagnostics sink
//!
//! Components report per-path failures through an injected [`Diagnostics`]
//! implementation instead of logging directly, so embedders and tests can
//! capture exactly what went wrong. The default sink forwards to `tracing`.

use crate::error::SortCopyError;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Receiver of per-path events raised during a run
pub trait Diagnostics: Send + Sync {
    /// A path could not be enumerated
    fn scan_error(&self, path: &Path, error: &SortCopyError);

    /// A single file failed to copy
    fn copy_error(&self, source: &Path, error: &SortCopyError);

    /// A single file was copied
    fn copied(&self, _source: &Path, _dest: &Path) {}
}

/// Shared handle passed to scanner and dispatcher
pub type SharedDiagnostics = Arc<dyn Diagnostics>;

/// Forwards every event to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn scan_error(&self, path: &Path, error: &SortCopyError) {
        tracing::error!(path = %path.display(), error = %error, "Error reading folder");
    }

    fn copy_error(&self, source: &Path, error: &SortCopyError) {
        tracing::error!(path = %source.display(), error = %error, "Error copying file");
    }

    fn copied(&self, source: &Path, dest: &Path) {
        tracing::debug!(source = %source.display(), dest = %dest.display(), "Copied");
    }
}

/// Kind of a recorded event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Enumeration failure
    Scan,
    /// Copy failure
    Copy,
    /// Successful copy
    Copied,
}

/// A recorded diagnostic event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// What happened
    pub kind: EventKind,
    /// Offending (or copied) path
    pub path: PathBuf,
    /// Error message, empty for successes
    pub message: String,
}

/// Records events in memory
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    events: Mutex<Vec<Event>>,
}

impl MemoryDiagnostics {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events
    pub fn events(&self) -> Vec<Event> {
        self.lock().clone()
    }

    /// Recorded events of one kind
    pub fn of_kind(&self, kind: EventKind) -> Vec<Event> {
        self.lock().iter().filter(|e| e.kind == kind).cloned().collect()
    }

    /// Number of recorded failures (scan and copy)
    pub fn error_count(&self) -> usize {
        self.lock().iter().filter(|e| e.kind != EventKind::Copied).count()
    }

    fn push(&self, kind: EventKind, path: &Path, message: String) {
        self.lock().push(Event {
            kind,
            path: path.to_path_buf(),
            message,
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Event>> {
        // A panic while holding the lock leaves the Vec intact
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn scan_error(&self, path: &Path, error: &SortCopyError) {
        self.push(EventKind::Scan, path, error.to_string());
    }

    fn copy_error(&self, source: &Path, error: &SortCopyError) {
        self.push(EventKind::Copy, source, error.to_string());
    }

    fn copied(&self, source: &Path, _dest: &Path) {
        self.push(EventKind::Copied, source, String::new());
    }
}

/// Default sink used when none is injected
pub fn default_diagnostics() -> SharedDiagnostics {
    Arc::new(TracingDiagnostics)
}
