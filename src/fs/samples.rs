//! Sample input generation
//!
//! Writes a small, mixed folder of files for trying out a sort.

use crate::error::{IoResultExt, Result};
use std::path::{Path, PathBuf};

/// File names and contents of the sample set
pub const SAMPLE_FILES: &[(&str, &str)] = &[
    ("note.txt", "Hello, this is a sample text file."),
    ("data.csv", "id,name,age\n1,John,30\n2,Jane,25"),
    ("report.pdf", "This is a dummy PDF file."),
    ("image.png", ""),
    ("script.py", "print('Hello, world!')"),
    ("README", "This file has no extension."),
    ("presentation.pptx", "This is a dummy PowerPoint file."),
    ("archive.zip", "This is a dummy ZIP file."),
    ("music.mp3", "This is a dummy MP3 file."),
    ("video.mp4", "This is a dummy MP4 file."),
    ("document.docx", "This is a dummy Word document."),
];

/// Create `dir` and write the sample files into it, replacing existing ones
pub fn write_samples(dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_path(dir)?;

    SAMPLE_FILES
        .iter()
        .map(|(name, content)| -> Result<PathBuf> {
            let path = dir.join(name);
            std::fs::write(&path, content).with_path(&path)?;
            Ok(path)
        })
        .collect()
}
