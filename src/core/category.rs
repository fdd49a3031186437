//! Extension categories
//!
//! A category is the destination subfolder a file is sorted into: the file
//! name's final extension without the dot, or [`NO_EXTENSION`].

use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;

/// Folder name for files without an extension
pub const NO_EXTENSION: &str = "no_extension";

/// How extension case is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryCase {
    /// Use the suffix exactly as written (`JPG` and `jpg` differ)
    #[default]
    Preserve,
    /// Lowercase the suffix
    Lower,
}

/// Destination subfolder derived from a file name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Category(OsString);

impl Category {
    /// Derive the category of `path` from its final component.
    ///
    /// `.gitignore` and `trailing.` have no extension. `archive.tar.gz` is `gz`.
    pub fn from_path(path: &Path, case: CategoryCase) -> Self {
        match path.extension() {
            Some(ext) if !ext.is_empty() => Self::from_extension(ext, case),
            _ => Self::none(),
        }
    }

    /// The `no_extension` category
    pub fn none() -> Self {
        Self(OsString::from(NO_EXTENSION))
    }

    fn from_extension(ext: &OsStr, case: CategoryCase) -> Self {
        match (case, ext.to_str()) {
            (CategoryCase::Lower, Some(s)) => Self(OsString::from(s.to_lowercase())),
            // Non-UTF-8 suffixes are kept byte-for-byte
            _ => Self(ext.to_os_string()),
        }
    }

    /// Whether this is the `no_extension` category
    pub fn is_none(&self) -> bool {
        self.0 == NO_EXTENSION
    }

    /// Folder name as an OS string
    pub fn as_os_str(&self) -> &OsStr {
        &self.0
    }
}

impl AsRef<Path> for Category {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_string_lossy())
    }
}
