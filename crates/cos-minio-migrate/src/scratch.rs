//! Scoped scratch files for in-flight transfers.
//!
//! Each transfer downloads into a uniquely named file inside the temp
//! directory and must leave nothing behind, whichever way the transfer
//! ends. Deletion rides on `Drop`, so every exit path is covered.

use crate::error::Result;
use std::path::Path;
use tempfile::{Builder, TempPath};

/// A local file slot held for the duration of one transfer.
///
/// The file is removed when the value is dropped.
pub struct ScratchFile {
    path: TempPath,
}

impl ScratchFile {
    /// Allocate a scratch file in `dir`, named after the object key's
    /// basename so partial downloads are recognizable while debugging.
    pub fn allocate(dir: &Path, key: &str) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let basename = Path::new(key)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("object");
        let file = Builder::new()
            .suffix(&format!("_{}", basename))
            .tempfile_in(dir)?;
        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    /// Path of the scratch file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_allocate_creates_unique_files() {
        let dir = tempdir().unwrap();
        let a = ScratchFile::allocate(dir.path(), "course/video/lesson1.mp4").unwrap();
        let b = ScratchFile::allocate(dir.path(), "course/video/lesson1.mp4").unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().to_string_lossy().ends_with("_lesson1.mp4"));
    }

    #[test]
    fn test_removed_on_drop() {
        let dir = tempdir().unwrap();
        let path = {
            let scratch = ScratchFile::allocate(dir.path(), "a.bin").unwrap();
            std::fs::write(scratch.path(), b"partial data").unwrap();
            scratch.path().to_path_buf()
        };
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_creates_missing_temp_dir() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("downloads");
        let scratch = ScratchFile::allocate(&nested, "a.bin").unwrap();
        assert!(scratch.path().exists());
    }
}
