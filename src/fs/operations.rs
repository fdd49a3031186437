//! File copy operations
//!
//! Copies a single file's content and metadata, using `copy_file_range` on
//! Linux with a buffered fallback everywhere else.

use crate::error::{IoResultExt, Result, SortCopyError};
use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

/// Copy operation statistics
#[derive(Debug, Clone, Default)]
pub struct CopyStats {
    /// Bytes copied
    pub bytes_copied: u64,
    /// Duration of the copy
    pub duration: Duration,
    /// Throughput in bytes/second
    pub throughput: f64,
    /// Method used for copy
    pub method: CopyMethod,
}

impl CopyStats {
    /// Calculate throughput from bytes and duration
    pub fn calculate_throughput(&mut self) {
        if self.duration.as_secs_f64() > 0.0 {
            self.throughput = self.bytes_copied as f64 / self.duration.as_secs_f64();
        }
    }
}

/// Copy method used
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CopyMethod {
    /// Standard buffered I/O
    #[default]
    Buffered,
    /// In-kernel copy via copy_file_range
    ZeroCopy,
}

/// Options for file copy operations
#[derive(Debug, Clone)]
pub struct CopyOptions {
    /// Buffer size for buffered operations
    pub buffer_size: usize,
    /// Preserve file permissions (best-effort)
    pub preserve_permissions: bool,
    /// Preserve modification and access time
    pub preserve_mtime: bool,
    /// Use zero-copy if available
    pub use_zero_copy: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            buffer_size: 1024 * 1024, // 1MB
            preserve_permissions: true,
            preserve_mtime: true,
            use_zero_copy: true,
        }
    }
}

/// Single-file copier
#[derive(Debug, Clone)]
pub struct FileCopier {
    options: CopyOptions,
}

impl FileCopier {
    /// Create a new file copier with the given options
    pub fn new(options: CopyOptions) -> Self {
        Self { options }
    }

    /// Create with default options
    pub fn default_copier() -> Self {
        Self::new(CopyOptions::default())
    }

    /// Copy `source` to `dest`, overwriting `dest` if it exists.
    ///
    /// The parent of `dest` must already exist. Content and metadata are
    /// written to a temporary file next to `dest`, which is then renamed over
    /// it, so concurrent copies to the same `dest` leave one complete copy.
    pub fn copy(&self, source: &Path, dest: &Path) -> Result<CopyStats> {
        let start = Instant::now();

        let metadata = std::fs::metadata(source).with_path(source)?;

        if is_same_file(source, dest) {
            return Err(SortCopyError::SameSourceAndDestination(dest.to_path_buf()));
        }

        let src_file = File::open(source).with_path(source)?;
        let staged = stage_dest(dest)?;
        let dst_file = staged.as_file();

        let size = metadata.len();
        let (bytes_copied, method) = if size == 0 {
            (0, CopyMethod::Buffered)
        } else if self.options.use_zero_copy && can_use_zero_copy() {
            match copy_zero_copy(&src_file, dst_file, source, size) {
                Ok(bytes) => (bytes, CopyMethod::ZeroCopy),
                Err(err) => {
                    tracing::debug!(path = %source.display(), error = %err, "Zero-copy failed, falling back");
                    let src_file = File::open(source).with_path(source)?;
                    dst_file.set_len(0).with_path(staged.path())?;
                    (self.copy_buffered(&src_file, dst_file, source, staged.path())?, CopyMethod::Buffered)
                }
            }
        } else {
            (self.copy_buffered(&src_file, dst_file, source, staged.path())?, CopyMethod::Buffered)
        };

        if self.options.preserve_mtime {
            copy_times(&metadata, dst_file, staged.path())?;
        }

        // Permissions last so a read-only mode does not block the timestamp update
        if self.options.preserve_permissions {
            if let Err(err) = dst_file.set_permissions(metadata.permissions()) {
                tracing::debug!(path = %dest.display(), error = %err, "Could not copy permissions");
            }
        }

        persist_dest(staged, dest)?;

        let mut stats = CopyStats {
            bytes_copied,
            duration: start.elapsed(),
            throughput: 0.0,
            method,
        };
        stats.calculate_throughput();

        Ok(stats)
    }

    /// Buffered copy - reliable fallback
    fn copy_buffered(&self, src_file: &File, mut dst_file: &File, source: &Path, dest: &Path) -> Result<u64> {
        dst_file.seek(SeekFrom::Start(0)).with_path(dest)?;

        let mut reader = BufReader::with_capacity(self.options.buffer_size, src_file);
        let mut writer = BufWriter::with_capacity(self.options.buffer_size, dst_file);

        let bytes_copied = std::io::copy(&mut reader, &mut writer).with_path(source)?;

        writer.flush().with_path(dest)?;

        Ok(bytes_copied)
    }
}

/// Create a hidden temporary file in the folder of `dest`.
///
/// Dropped without [`persist_dest`], the file is removed again.
fn stage_dest(dest: &Path) -> Result<NamedTempFile> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        Some(_) => Path::new("."),
        None => return Err(SortCopyError::InvalidPath(dest.display().to_string())),
    };

    let mut builder = tempfile::Builder::new();
    builder.prefix(".sortcopy-").suffix(".part");

    // Same mode a plain create would get once the umask applies
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }

    builder.tempfile_in(dir).with_path(dir)
}

/// Rename the staged copy over `dest`.
///
/// A read-only leftover from an earlier run is replaced rather than reported.
fn persist_dest(staged: NamedTempFile, dest: &Path) -> Result<()> {
    match staged.persist(dest) {
        Ok(_) => Ok(()),
        Err(err) if err.error.kind() == std::io::ErrorKind::PermissionDenied && dest.is_file() => {
            std::fs::remove_file(dest).with_path(dest)?;
            err.file
                .persist(dest)
                .map(|_| ())
                .map_err(|e| SortCopyError::io(dest, e.error))
        }
        Err(err) => Err(SortCopyError::io(dest, err.error)),
    }
}

/// Zero-copy using copy_file_range
#[cfg(target_os = "linux")]
fn copy_zero_copy(src_file: &File, dst_file: &File, source: &Path, size: u64) -> Result<u64> {
    use std::os::unix::io::AsRawFd;

    let src_fd = src_file.as_raw_fd();
    let dst_fd = dst_file.as_raw_fd();

    let mut total_copied: u64 = 0;
    let mut offset_in: i64 = 0;
    let mut offset_out: i64 = 0;

    while total_copied < size {
        let to_copy = (size - total_copied).min(isize::MAX as u64) as usize;

        let copied = unsafe {
            libc::copy_file_range(src_fd, &mut offset_in, dst_fd, &mut offset_out, to_copy, 0)
        };

        if copied < 0 {
            let err = std::io::Error::last_os_error();
            return Err(SortCopyError::io(source, err));
        }

        if copied == 0 {
            break; // EOF
        }

        total_copied += copied as u64;
    }

    Ok(total_copied)
}

#[cfg(not(target_os = "linux"))]
fn copy_zero_copy(_src_file: &File, _dst_file: &File, source: &Path, _size: u64) -> Result<u64> {
    let err = std::io::Error::new(std::io::ErrorKind::Unsupported, "copy_file_range unavailable");
    Err(SortCopyError::io(source, err))
}

/// Check if zero-copy is available
fn can_use_zero_copy() -> bool {
    cfg!(target_os = "linux")
}

/// Copy modification and access time
fn copy_times(metadata: &std::fs::Metadata, dest_file: &File, dest: &Path) -> Result<()> {
    let mtime = filetime::FileTime::from_last_modification_time(metadata);
    let atime = filetime::FileTime::from_last_access_time(metadata);
    filetime::set_file_handle_times(dest_file, Some(atime), Some(mtime)).with_path(dest)
}

/// Whether two paths refer to the same existing file
pub fn is_same_file(a: &Path, b: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;

        match (std::fs::metadata(a), std::fs::metadata(b)) {
            (Ok(ma), Ok(mb)) => ma.dev() == mb.dev() && ma.ino() == mb.ino(),
            _ => false,
        }
    }

    #[cfg(not(unix))]
    {
        match (a.canonicalize(), b.canonicalize()) {
            (Ok(ca), Ok(cb)) => ca == cb,
            _ => false,
        }
    }
}

/// Create `dir` and its parents; an existing directory is success.
///
/// Safe to call concurrently for the same path.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_path(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str, size: usize) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(&vec![0xABu8; size]).unwrap();
        path
    }

    #[test]
    fn test_copy_small_file() {
        let src_dir = TempDir::new().unwrap();
        let dst_dir = TempDir::new().unwrap();

        let src = create_test_file(src_dir.path(), "test.txt", 1024);
        let dst = dst_dir.path().join("test.txt");

        let stats = FileCopier::default_copier().copy(&src, &dst).unwrap();

        assert_eq!(stats.bytes_copied, 1024);
        assert_eq!(std::fs::read(&src).unwrap(), std::fs::read(&dst).unwrap());
    }

    #[test]
    fn test_copy_buffered_only() {
        let src_dir = TempDir::new().unwrap();
        let src = create_test_file(src_dir.path(), "big.bin", 300 * 1024);
        let dst = src_dir.path().join("copy.bin");

        let copier = FileCopier::new(CopyOptions {
            buffer_size: 4096,
            use_zero_copy: false,
            ..Default::default()
        });
        let stats = copier.copy(&src, &dst).unwrap();

        assert_eq!(stats.method, CopyMethod::Buffered);
        assert_eq!(stats.bytes_copied, 300 * 1024);
        assert_eq!(std::fs::read(&src).unwrap(), std::fs::read(&dst).unwrap());
    }

    #[test]
    fn test_copy_empty_file() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("empty.txt");
        File::create(&src).unwrap();
        let dst = dir.path().join("empty-copy.txt");

        let stats = FileCopier::default_copier().copy(&src, &dst).unwrap();

        assert_eq!(stats.bytes_copied, 0);
        assert!(dst.exists());
    }

    #[test]
    fn test_copy_overwrites_existing() {
        let dir = TempDir::new().unwrap();
        let src = create_test_file(dir.path(), "new.txt", 10);
        let dst = dir.path().join("old.txt");
        std::fs::write(&dst, b"previous content that is longer").unwrap();

        FileCopier::default_copier().copy(&src, &dst).unwrap();

        assert_eq!(std::fs::read(&dst).unwrap(), vec![0xABu8; 10]);
    }

    #[test]
    fn test_copy_preserves_mtime() {
        let dir = TempDir::new().unwrap();
        let src = create_test_file(dir.path(), "dated.txt", 16);
        let stamp = filetime::FileTime::from_unix_time(1_000_000_000, 0);
        filetime::set_file_mtime(&src, stamp).unwrap();
        let dst = dir.path().join("dated-copy.txt");

        FileCopier::default_copier().copy(&src, &dst).unwrap();

        let meta = std::fs::metadata(&dst).unwrap();
        assert_eq!(filetime::FileTime::from_last_modification_time(&meta), stamp);
    }

    #[test]
    fn test_copy_same_file_rejected() {
        let dir = TempDir::new().unwrap();
        let src = create_test_file(dir.path(), "self.txt", 32);

        let err = FileCopier::default_copier().copy(&src, &src).unwrap_err();

        assert!(matches!(err, SortCopyError::SameSourceAndDestination(_)));
        assert_eq!(std::fs::read(&src).unwrap(), vec![0xABu8; 32]);
    }

    #[test]
    fn test_copy_missing_source_names_path() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("missing.txt");

        let err = FileCopier::default_copier()
            .copy(&src, &dir.path().join("out.txt"))
            .unwrap_err();

        assert_eq!(err.path(), Some(&src));
    }

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a/b/c");

        ensure_dir(&target).unwrap();
        ensure_dir(&target).unwrap();

        assert!(target.is_dir());
    }

    #[test]
    fn test_ensure_dir_concurrent() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("shared/category");

        std::thread::scope(|s| {
            for _ in 0..16 {
                s.spawn(|| ensure_dir(&target).unwrap());
            }
        });

        assert!(target.is_dir());
    }

    #[test]
    fn test_ensure_dir_blocked_by_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("txt");
        std::fs::write(&target, b"not a dir").unwrap();

        let err = ensure_dir(&target).unwrap_err();

        assert_eq!(err.path(), Some(&target));
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_replaces_read_only_destination() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let src = create_test_file(dir.path(), "ro.txt", 8);
        std::fs::set_permissions(&src, std::fs::Permissions::from_mode(0o444)).unwrap();
        let dst = dir.path().join("ro-copy.txt");

        let copier = FileCopier::default_copier();
        copier.copy(&src, &dst).unwrap();
        copier.copy(&src, &dst).unwrap();

        let mode = std::fs::metadata(&dst).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o444);
    }

    #[test]
    fn test_concurrent_copies_to_same_dest_leave_one_whole_file() {
        let dir = TempDir::new().unwrap();
        let sources: Vec<(std::path::PathBuf, Vec<u8>)> = (0..8u8)
            .map(|i| {
                let content = vec![b'a' + i; (1024 + 128 * i as usize) * 1024];
                let path = dir.path().join(format!("src{}.bin", i));
                std::fs::write(&path, &content).unwrap();
                (path, content)
            })
            .collect();
        let dst = dir.path().join("shared.bin");

        for _ in 0..5 {
            std::thread::scope(|s| {
                for (src, _) in &sources {
                    let dst = &dst;
                    s.spawn(move || FileCopier::default_copier().copy(src, dst).unwrap());
                }
            });

            let written = std::fs::read(&dst).unwrap();
            assert!(sources.iter().any(|(_, content)| *content == written));
        }
    }

    #[test]
    fn test_copy_leaves_no_staging_files() {
        let dir = TempDir::new().unwrap();
        let src = create_test_file(dir.path(), "in.txt", 64);
        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();

        FileCopier::default_copier().copy(&src, &out.join("in.txt")).unwrap();
        let missing = dir.path().join("missing.txt");
        assert!(FileCopier::default_copier().copy(&missing, &out.join("missing.txt")).is_err());

        let names: Vec<_> = std::fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("in.txt")]);
    }

    #[test]
    fn test_copy_into_missing_folder_fails() {
        let dir = TempDir::new().unwrap();
        let src = create_test_file(dir.path(), "in.txt", 4);
        let dst = dir.path().join("absent/in.txt");

        let err = FileCopier::default_copier().copy(&src, &dst).unwrap_err();

        assert_eq!(err.path(), Some(&dir.path().join("absent")));
    }
}
