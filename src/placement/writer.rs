//! Persists generated test text.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{DessertError, Result};

/// Writes generated tests verbatim, overwriting whatever is there.
///
/// No append, backup or atomic rename: the destination is a generated
/// directory, not hand-authored source.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestFileWriter;

impl TestFileWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write `content` to `path`, creating parent directories.
    ///
    /// Returns the path written.
    ///
    /// # Errors
    ///
    /// Returns [`DessertError::Filesystem`] if a directory or the file cannot
    /// be written.
    pub fn write(&self, path: &Path, content: &str) -> Result<PathBuf> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DessertError::filesystem(parent, e))?;
        }
        std::fs::write(path, content).map_err(|e| DessertError::filesystem(path, e))?;

        info!(path = %path.display(), bytes = content.len(), "Test file written");
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_is_byte_identical() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("FooTest.kt");
        let content = "package a\n\nclass FooTest {\r\n\t// ünïcödé\n}";

        let written = TestFileWriter::new().write(&path, content).unwrap();
        assert_eq!(written, path);
        assert_eq!(std::fs::read(&path).unwrap(), content.as_bytes());
    }

    #[test]
    fn test_write_creates_parents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a/b/generated/BarTest.java");
        TestFileWriter::new().write(&path, "class BarTest {}").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_write_overwrites() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("XTest.scala");
        std::fs::write(&path, "old content that is longer").unwrap();

        TestFileWriter::new().write(&path, "new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_write_into_file_parent_fails() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("blocker"), "").unwrap();
        let path = temp.path().join("blocker/ATest.kt");

        let err = TestFileWriter::new().write(&path, "x").unwrap_err();
        assert!(matches!(err, DessertError::Filesystem { .. }));
    }
}
