//! Concurrent copy dispatcher
//!
//! Fans one [`CopyTask`] per file out onto a bounded rayon pool and gathers
//! every [`TaskOutcome`] before returning. Failures stay inside their task;
//! the run always completes.

use crate::core::{CategoryCase, CopyTask, TaskOutcome};
use crate::diagnostics::{default_diagnostics, SharedDiagnostics};
use crate::error::{Result, SortCopyError};
use crate::fs::{CopyOptions, FileCopier, FileEntry};
use crossbeam::channel::{bounded, RecvTimeoutError};
use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Run-level state of a dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
    /// No dispatch yet
    NotStarted = 0,
    /// Tasks in flight
    Running = 1,
    /// Every dispatched task is terminal
    Completed = 2,
}

impl RunState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Running,
            2 => Self::Completed,
            _ => Self::NotStarted,
        }
    }
}

/// Gathered outcomes of one dispatch
#[derive(Debug, Default)]
pub struct DispatchResult {
    /// One outcome per started task
    pub outcomes: Vec<TaskOutcome>,
    /// Files never started because the run was cancelled
    pub skipped: usize,
    /// Wall time of the dispatch
    pub duration: Duration,
}

/// Scatter/gather copy dispatcher
pub struct Dispatcher {
    copier: FileCopier,
    jobs: usize,
    case: CategoryCase,
    timeout: Option<Duration>,
    diagnostics: SharedDiagnostics,
    cancelled: Arc<AtomicBool>,
    state: AtomicU8,
}

impl Dispatcher {
    /// Create a dispatcher running at most `jobs` copies at once
    pub fn new(jobs: usize, options: CopyOptions) -> Self {
        Self {
            copier: FileCopier::new(options),
            jobs: jobs.max(1),
            case: CategoryCase::Preserve,
            timeout: None,
            diagnostics: default_diagnostics(),
            cancelled: Arc::new(AtomicBool::new(false)),
            state: AtomicU8::new(RunState::NotStarted as u8),
        }
    }

    /// Set category case handling
    pub fn with_case(mut self, case: CategoryCase) -> Self {
        self.case = case;
        self
    }

    /// Stop starting new tasks once `timeout` has elapsed
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the diagnostics sink
    pub fn with_diagnostics(mut self, diagnostics: SharedDiagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Get cancellation flag for external control
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Cancel the run: in-flight copies finish, pending ones never start.
    ///
    /// A request made while idle applies to the next dispatch. Either way it
    /// is cleared once that dispatch returns.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Current run state
    pub fn state(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Copy every entry into `dest_root/<category>/` and wait for all of them.
    ///
    /// Only fails if the worker pool cannot be built.
    pub fn dispatch(&self, entries: Vec<FileEntry>, dest_root: &Path) -> Result<DispatchResult> {
        let start = Instant::now();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .thread_name(|i| format!("sortcopy-worker-{}", i))
            .build()
            .map_err(|e| SortCopyError::ThreadPoolError(e.to_string()))?;

        let total = entries.len();
        let tasks: Vec<_> = entries
            .into_iter()
            .enumerate()
            .map(|(id, entry)| CopyTask::new(id as u64, entry, dest_root.to_path_buf(), self.case))
            .collect();

        tracing::debug!(tasks = total, jobs = self.jobs, "Dispatching copies");
        self.state.store(RunState::Running as u8, Ordering::SeqCst);

        // Local to this dispatch so an expired timeout does not carry over
        let timed_out = Arc::new(AtomicBool::new(false));

        let (done_tx, watchdog) = match self.timeout {
            Some(timeout) => {
                let (tx, rx) = bounded::<()>(0);
                let timed_out = Arc::clone(&timed_out);
                let handle = thread::spawn(move || {
                    if let Err(RecvTimeoutError::Timeout) = rx.recv_timeout(timeout) {
                        tracing::warn!(?timeout, "Timeout reached, no further copies will start");
                        timed_out.store(true, Ordering::SeqCst);
                    }
                });
                (Some(tx), Some(handle))
            }
            None => (None, None),
        };

        let cancelled = &self.cancelled;
        let timed_out = timed_out.as_ref();
        let copier = &self.copier;
        let diagnostics = self.diagnostics.as_ref();

        let outcomes: Vec<TaskOutcome> = pool.install(|| {
            tasks
                .into_par_iter()
                .filter_map(|task| {
                    if cancelled.load(Ordering::SeqCst) || timed_out.load(Ordering::SeqCst) {
                        return None;
                    }
                    Some(task.execute(copier, diagnostics))
                })
                .collect()
        });

        // Wakes the watchdog so it exits without firing
        drop(done_tx);
        if let Some(handle) = watchdog {
            let _ = handle.join();
        }

        self.cancelled.store(false, Ordering::SeqCst);
        self.state.store(RunState::Completed as u8, Ordering::SeqCst);

        let skipped = total - outcomes.len();
        if skipped > 0 {
            tracing::warn!(skipped, "Run cancelled before all copies started");
        }

        Ok(DispatchResult {
            outcomes,
            skipped,
            duration: start.elapsed(),
        })
    }
}
