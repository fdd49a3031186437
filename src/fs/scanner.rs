//! Directory scanner
//!
//! Recursively enumerates the regular files under a root folder. Traversal
//! problems are reported per path through the diagnostics sink and never stop
//! the walk of sibling entries.

use crate::diagnostics::{default_diagnostics, SharedDiagnostics};
use crate::error::{IoResultExt, Result, SortCopyError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use walkdir::{DirEntry, WalkDir};

/// Metadata for a single enumerated file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path to the file
    pub path: PathBuf,
    /// Relative path from the scan root
    pub relative_path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Modification time
    pub modified: SystemTime,
}

impl FileEntry {
    /// Create a FileEntry from a path, following symlinks
    pub fn from_path(path: &Path, source_root: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path).with_path(path)?;
        Ok(Self::with_metadata(path, source_root, &metadata))
    }

    fn with_metadata(path: &Path, source_root: &Path, metadata: &std::fs::Metadata) -> Self {
        let relative_path = path
            .strip_prefix(source_root)
            .unwrap_or(path)
            .to_path_buf();

        FileEntry {
            path: path.to_path_buf(),
            relative_path,
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        }
    }

    /// Final path component
    pub fn file_name(&self) -> Option<&std::ffi::OsStr> {
        self.path.file_name()
    }
}

/// Result of a directory scan
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Root path that was scanned
    pub root: PathBuf,
    /// All regular files found
    pub files: Vec<FileEntry>,
    /// Total size of all files
    pub total_size: u64,
    /// Paths that could not be enumerated, with the reason
    pub errors: Vec<(PathBuf, String)>,
    /// Scan duration
    pub scan_duration: Duration,
}

impl ScanResult {
    /// Number of files found
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// Configuration for directory scanning
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Follow symbolic links into directories
    pub follow_symlinks: bool,
    /// Subtrees to prune from the walk
    pub exclude: Vec<PathBuf>,
}

/// Recursive file enumerator
pub struct Scanner {
    config: ScanConfig,
    diagnostics: SharedDiagnostics,
}

/// Outcome of inspecting one walk entry
enum Visit {
    File(FileEntry),
    Skip,
    Error(SortCopyError),
}

impl Scanner {
    /// Create a new scanner reporting to the tracing sink
    pub fn new(config: ScanConfig) -> Self {
        Self::with_diagnostics(config, default_diagnostics())
    }

    /// Create a new scanner reporting to `diagnostics`
    pub fn with_diagnostics(config: ScanConfig, diagnostics: SharedDiagnostics) -> Self {
        Self {
            config,
            diagnostics,
        }
    }

    /// Scan a directory and return every regular file beneath it.
    ///
    /// Never fails: an unreadable root yields one error and an empty result.
    pub fn scan(&self, root: &Path) -> ScanResult {
        let start_time = Instant::now();

        let root = match root.canonicalize().with_path(root) {
            Ok(root) => root,
            Err(err) => {
                self.diagnostics.scan_error(root, &err);
                return ScanResult {
                    root: root.to_path_buf(),
                    errors: vec![(root.to_path_buf(), err.to_string())],
                    scan_duration: start_time.elapsed(),
                    ..Default::default()
                };
            }
        };

        let walker = WalkDir::new(&root)
            .follow_links(self.config.follow_symlinks)
            .into_iter()
            .filter_entry(|e| !self.is_excluded(e.path()));

        let entries: Vec<_> = walker.collect();

        let visits: Vec<_> = entries
            .into_par_iter()
            .map(|entry| match entry {
                Ok(e) => self.visit(&e, &root),
                Err(err) => Visit::Error(SortCopyError::walk(&err, &root)),
            })
            .collect();

        let mut files = Vec::new();
        let mut errors = Vec::new();

        for visit in visits {
            match visit {
                Visit::File(entry) => files.push(entry),
                Visit::Skip => {}
                Visit::Error(err) => {
                    let path = err.path().cloned().unwrap_or_else(|| root.clone());
                    self.diagnostics.scan_error(&path, &err);
                    errors.push((path, err.to_string()));
                }
            }
        }

        let total_size = files.iter().map(|f| f.size).sum();

        tracing::debug!(
            root = %root.display(),
            files = files.len(),
            errors = errors.len(),
            "Scan finished"
        );

        ScanResult {
            root,
            files,
            total_size,
            errors,
            scan_duration: start_time.elapsed(),
        }
    }

    /// Inspect a single walk entry
    fn visit(&self, entry: &DirEntry, root: &Path) -> Visit {
        let file_type = entry.file_type();

        if file_type.is_dir() {
            return Visit::Skip;
        }

        if file_type.is_file() {
            return match entry.metadata() {
                Ok(metadata) => Visit::File(FileEntry::with_metadata(entry.path(), root, &metadata)),
                Err(err) => Visit::Error(SortCopyError::walk(&err, entry.path())),
            };
        }

        if file_type.is_symlink() {
            // Symlinks are not descended; a link to a regular file is copied by content
            return match std::fs::metadata(entry.path()) {
                Ok(target) if target.is_file() => {
                    Visit::File(FileEntry::with_metadata(entry.path(), root, &target))
                }
                Ok(_) => Visit::Skip,
                Err(err) => Visit::Error(SortCopyError::io(entry.path(), err)),
            };
        }

        // Sockets, FIFOs and devices are not regular files
        Visit::Skip
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.config.exclude.iter().any(|ex| path.starts_with(ex))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{EventKind, MemoryDiagnostics};
    use std::fs::File;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();

        File::create(dir.path().join("small.txt")).unwrap()
            .write_all(b"small file").unwrap();

        std::fs::create_dir_all(dir.path().join("subdir/deeper")).unwrap();
        File::create(dir.path().join("subdir/nested.csv")).unwrap()
            .write_all(b"a,b").unwrap();
        File::create(dir.path().join("subdir/deeper/README")).unwrap()
            .write_all(b"readme").unwrap();

        File::create(dir.path().join(".hidden")).unwrap()
            .write_all(b"hidden").unwrap();

        std::fs::create_dir(dir.path().join("empty")).unwrap();

        dir
    }

    fn names(result: &ScanResult) -> Vec<String> {
        let mut names: Vec<_> = result
            .files
            .iter()
            .map(|f| f.relative_path.to_string_lossy().replace('\\', "/"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_scanner_finds_all_files() {
        let dir = create_test_dir();
        let scanner = Scanner::new(ScanConfig::default());

        let result = scanner.scan(dir.path());

        assert_eq!(
            names(&result),
            vec![".hidden", "small.txt", "subdir/deeper/README", "subdir/nested.csv"]
        );
        assert_eq!(result.total_size, 10 + 3 + 6 + 6);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_scanner_empty_root() {
        let dir = TempDir::new().unwrap();
        let result = Scanner::new(ScanConfig::default()).scan(dir.path());

        assert_eq!(result.file_count(), 0);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_scanner_missing_root_reports_once() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone");
        let sink = Arc::new(MemoryDiagnostics::new());
        let scanner = Scanner::with_diagnostics(ScanConfig::default(), sink.clone());

        let result = scanner.scan(&missing);

        assert!(result.files.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(sink.of_kind(EventKind::Scan).len(), 1);
        assert_eq!(sink.events()[0].path, missing);
    }

    #[test]
    fn test_scanner_excludes_subtree() {
        let dir = create_test_dir();
        let excluded = dir.path().canonicalize().unwrap().join("subdir");
        let scanner = Scanner::new(ScanConfig {
            exclude: vec![excluded],
            ..Default::default()
        });

        let result = scanner.scan(dir.path());

        assert_eq!(names(&result), vec![".hidden", "small.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_scanner_symlinks() {
        let dir = create_test_dir();
        let root = dir.path();

        std::os::unix::fs::symlink(root.join("small.txt"), root.join("link.txt")).unwrap();
        std::os::unix::fs::symlink(root.join("subdir"), root.join("dirlink")).unwrap();
        std::os::unix::fs::symlink(root.join("nowhere"), root.join("broken.lnk")).unwrap();

        let sink = Arc::new(MemoryDiagnostics::new());
        let scanner = Scanner::with_diagnostics(ScanConfig::default(), sink.clone());
        let result = scanner.scan(root);

        let found = names(&result);
        assert!(found.contains(&"link.txt".to_string()));
        assert!(!found.iter().any(|n| n.starts_with("dirlink")));
        assert!(!found.contains(&"broken.lnk".to_string()));

        let errors = sink.of_kind(EventKind::Scan);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].path.ends_with("broken.lnk"));
        assert_eq!(result.errors.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_scanner_symlink_cycle_is_not_fatal() {
        let dir = create_test_dir();
        let root = dir.path();
        std::os::unix::fs::symlink(root, root.join("subdir/loop")).unwrap();

        let sink = Arc::new(MemoryDiagnostics::new());
        let scanner = Scanner::with_diagnostics(
            ScanConfig {
                follow_symlinks: true,
                ..Default::default()
            },
            sink.clone(),
        );
        let result = scanner.scan(root);

        assert!(names(&result).contains(&"small.txt".to_string()));
        assert!(!result.errors.is_empty());
        assert!(sink.error_count() >= 1);
    }
}
