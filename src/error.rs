//! Error types for SortCopy
//!
//! This module defines all error types used throughout the application.
//! Every file-level variant carries the offending path so a failure can be
//! reported on its own without further context.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for SortCopy operations
#[derive(Error, Debug)]
pub enum SortCopyError {
    /// I/O error during file operations
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File or directory not found
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Source and destination resolve to the same file
    #[error("Source and destination are the same: {0}")]
    SameSourceAndDestination(PathBuf),

    /// Directory traversal error for a single path
    #[error("Cannot walk '{path}': {message}")]
    Walk { path: PathBuf, message: String },

    /// Path has no final component to copy
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Thread pool error
    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),
}

impl SortCopyError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Build a per-path walk error from a walkdir failure
    pub fn walk(err: &walkdir::Error, fallback: &std::path::Path) -> Self {
        let path = err
            .path()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| fallback.to_path_buf());

        let message = match err.io_error() {
            Some(io) => io.to_string(),
            None => err.to_string(),
        };

        Self::Walk { path, message }
    }

    /// Check if this error is a permission issue
    pub fn is_permission_error(&self) -> bool {
        match self {
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. }
            | Self::NotFound(path)
            | Self::NotADirectory(path)
            | Self::SameSourceAndDestination(path)
            | Self::Walk { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Result type alias for SortCopy operations
pub type Result<T> = std::result::Result<T, SortCopyError>;

impl From<std::io::Error> for SortCopyError {
    fn from(err: std::io::Error) -> Self {
        SortCopyError::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| SortCopyError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_with_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = SortCopyError::io("/test/path", io_err);
        assert_eq!(err.path().unwrap(), &PathBuf::from("/test/path"));
        assert!(err.to_string().contains("/test/path"));
    }

    #[test]
    fn test_permission_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Result<()> = Err(io_err).with_path("/locked");
        let err = err.unwrap_err();
        assert!(err.is_permission_error());
        assert!(!SortCopyError::NotFound(PathBuf::from("/x")).is_permission_error());
    }

    #[test]
    fn test_pathless_variants() {
        assert!(SortCopyError::config("bad").path().is_none());
        assert!(SortCopyError::ThreadPoolError("x".into()).path().is_none());
        assert_eq!(
            SortCopyError::NotADirectory(PathBuf::from("/f")).path(),
            Some(&PathBuf::from("/f"))
        );
    }
}
