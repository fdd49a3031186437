//! Copy tasks
//!
//! One [`CopyTask`] per enumerated file. A task moves through
//! `Pending -> Running -> {Succeeded, Failed}` exactly once and always ends
//! in a [`TaskOutcome`]; it never panics or propagates its error.

use crate::core::{Category, CategoryCase};
use crate::diagnostics::Diagnostics;
use crate::error::{Result, SortCopyError};
use crate::fs::{ensure_dir, CopyStats, FileCopier, FileEntry};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Lifecycle of a single copy task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Created, not yet started
    Pending,
    /// Copy in progress
    Running,
    /// File exists at its destination
    Succeeded,
    /// Copy failed; reported once
    Failed,
}

impl TaskState {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Whether `self -> next` is a legal transition
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Running, Self::Succeeded)
                | (Self::Running, Self::Failed)
        )
    }
}

/// A single file-to-category copy
#[derive(Debug, Clone)]
pub struct CopyTask {
    /// Task ID
    pub id: u64,
    /// Source file entry
    pub entry: FileEntry,
    /// Destination category
    pub category: Category,
    /// Destination root path
    pub dest_root: PathBuf,
    state: TaskState,
}

impl CopyTask {
    /// Create a new copy task
    pub fn new(id: u64, entry: FileEntry, dest_root: PathBuf, case: CategoryCase) -> Self {
        let category = Category::from_path(&entry.path, case);

        Self {
            id,
            entry,
            category,
            dest_root,
            state: TaskState::Pending,
        }
    }

    /// Current state
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Category folder under the destination root
    pub fn dest_dir(&self) -> PathBuf {
        self.dest_root.join(&self.category)
    }

    /// Full destination path
    pub fn dest_path(&self) -> Result<PathBuf> {
        let name = self.entry.file_name().ok_or_else(|| {
            SortCopyError::InvalidPath(self.entry.path.to_string_lossy().into_owned())
        })?;
        Ok(self.dest_dir().join(name))
    }

    fn transition(&mut self, next: TaskState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal task transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }

    /// Run the copy and report a failure to `diagnostics`
    pub fn execute(mut self, copier: &FileCopier, diagnostics: &dyn Diagnostics) -> TaskOutcome {
        self.transition(TaskState::Running);

        let result = self.copy(copier);

        match &result {
            Ok((dest, _)) => {
                self.transition(TaskState::Succeeded);
                diagnostics.copied(&self.entry.path, dest);
            }
            Err(err) => {
                self.transition(TaskState::Failed);
                diagnostics.copy_error(&self.entry.path, err);
            }
        }

        TaskOutcome {
            task_id: self.id,
            source: self.entry.path,
            category: self.category,
            state: self.state,
            result: result.map(|(_, stats)| stats),
        }
    }

    fn copy(&self, copier: &FileCopier) -> Result<(PathBuf, CopyStats)> {
        let dest = self.dest_path()?;
        ensure_dir(&self.dest_dir())?;
        let stats = copier.copy(&self.entry.path, &dest)?;
        Ok((dest, stats))
    }
}

/// Terminal result of one task
#[derive(Debug)]
pub struct TaskOutcome {
    /// Task ID
    pub task_id: u64,
    /// Source file
    pub source: PathBuf,
    /// Category the file was sorted into
    pub category: Category,
    /// Terminal state
    pub state: TaskState,
    /// Copy statistics or the error
    pub result: Result<CopyStats>,
}

impl TaskOutcome {
    /// Whether the copy succeeded
    pub fn is_success(&self) -> bool {
        self.state == TaskState::Succeeded
    }

    /// Source path of the task
    pub fn source(&self) -> &Path {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{EventKind, MemoryDiagnostics};
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn create_test_entry(path: &str) -> FileEntry {
        FileEntry {
            path: PathBuf::from(path),
            relative_path: PathBuf::from(path.trim_start_matches('/')),
            size: 0,
            modified: SystemTime::now(),
        }
    }

    #[test]
    fn test_state_transitions() {
        assert!(TaskState::Pending.can_transition_to(TaskState::Running));
        assert!(TaskState::Running.can_transition_to(TaskState::Failed));
        assert!(!TaskState::Pending.can_transition_to(TaskState::Succeeded));
        assert!(!TaskState::Succeeded.can_transition_to(TaskState::Running));
        assert!(TaskState::Failed.is_terminal());
        assert!(!TaskState::Running.is_terminal());
    }

    #[test]
    fn test_dest_path() {
        let task = CopyTask::new(
            0,
            create_test_entry("/src/a/photo.JPG"),
            PathBuf::from("/out"),
            CategoryCase::Preserve,
        );
        assert_eq!(task.state(), TaskState::Pending);
        assert_eq!(task.dest_path().unwrap(), PathBuf::from("/out/JPG/photo.JPG"));

        let task = CopyTask::new(
            1,
            create_test_entry("/src/README"),
            PathBuf::from("/out"),
            CategoryCase::Lower,
        );
        assert_eq!(task.dest_path().unwrap(), PathBuf::from("/out/no_extension/README"));
    }

    #[test]
    fn test_execute_success() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let file = src.path().join("note.txt");
        std::fs::write(&file, b"hello").unwrap();

        let entry = FileEntry::from_path(&file, src.path()).unwrap();
        let task = CopyTask::new(7, entry, dst.path().to_path_buf(), CategoryCase::Preserve);
        let sink = MemoryDiagnostics::new();

        let outcome = task.execute(&FileCopier::default_copier(), &sink);

        assert!(outcome.is_success());
        assert_eq!(outcome.task_id, 7);
        assert_eq!(outcome.result.unwrap().bytes_copied, 5);
        assert_eq!(std::fs::read(dst.path().join("txt/note.txt")).unwrap(), b"hello");
        assert_eq!(sink.of_kind(EventKind::Copied).len(), 1);
    }

    #[test]
    fn test_execute_failure_is_reported_once() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let file = src.path().join("vanished.txt");
        std::fs::write(&file, b"x").unwrap();
        let entry = FileEntry::from_path(&file, src.path()).unwrap();
        std::fs::remove_file(&file).unwrap();

        let task = CopyTask::new(0, entry, dst.path().to_path_buf(), CategoryCase::Preserve);
        let sink = MemoryDiagnostics::new();

        let outcome = task.execute(&FileCopier::default_copier(), &sink);

        assert_eq!(outcome.state, TaskState::Failed);
        assert!(outcome.result.is_err());
        let errors = sink.of_kind(EventKind::Copy);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, file);
    }
}
