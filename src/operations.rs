//! Filesystem query abstractions for dependency injection.
//!
//! Provides the [`FileSystemOps`] trait so that header, library and file
//! probes can be unit-tested without touching the real filesystem.
//! Production code uses [`SystemFileSystemOps`]; tests use
//! `MockFileSystemOps`.

use std::path::{Path, PathBuf};

/// Abstraction over the filesystem queries probes perform.
pub trait FileSystemOps: Send + Sync + std::fmt::Debug {
    /// Returns `true` if `path` exists on the filesystem.
    fn exists(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a regular file (following symlinks).
    fn is_file(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Return the first `dir/name` that is a regular file, trying `dirs` in order.
    fn find_file(&self, dirs: &[PathBuf], name: &str) -> Option<PathBuf> {
        dirs.iter()
            .map(|dir| dir.join(name))
            .find(|candidate| self.is_file(candidate))
    }
}

/// Production [`FileSystemOps`] implementation that delegates to [`std::fs`].
#[derive(Debug, Default)]
pub struct SystemFileSystemOps;

impl FileSystemOps for SystemFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

/// Mock [`FileSystemOps`] for unit tests.
///
/// Pre-configure existing files and directories using the builder-style
/// methods, then pass `Arc::new(mock)` into a probe context.
///
/// # Example
///
/// ```ignore
/// use buildconf::operations::MockFileSystemOps;
///
/// let fs = MockFileSystemOps::new()
///     .with_file("/usr/include/pthread.h")
///     .with_dir("/usr/lib");
/// ```
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockFileSystemOps {
    files: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
}

#[cfg(test)]
impl MockFileSystemOps {
    /// Create an empty mock with nothing configured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `path` as a regular file.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        let p = path.into();
        if !self.files.contains(&p) {
            self.files.push(p);
        }
        self
    }

    /// Mark `path` as a directory.
    #[must_use]
    pub fn with_dir(mut self, path: impl Into<PathBuf>) -> Self {
        let p = path.into();
        if !self.dirs.contains(&p) {
            self.dirs.push(p);
        }
        self
    }
}

#[cfg(test)]
impl FileSystemOps for MockFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.iter().any(|p| p == path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.iter().any(|p| p == path)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // SystemFileSystemOps
    // -----------------------------------------------------------------------

    #[test]
    fn system_exists_and_is_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("probe.h");
        std::fs::write(&file, "").unwrap();
        let ops = SystemFileSystemOps;
        assert!(ops.exists(&file));
        assert!(ops.is_file(&file));
        assert!(ops.is_dir(dir.path()));
        assert!(!ops.is_file(dir.path()));
        assert!(!ops.exists(&dir.path().join("missing.h")));
    }

    #[test]
    fn system_find_file_respects_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(first.path().join("gsl.h"), "").unwrap();
        std::fs::write(second.path().join("gsl.h"), "").unwrap();
        let dirs = vec![second.path().to_path_buf(), first.path().to_path_buf()];
        assert_eq!(
            SystemFileSystemOps.find_file(&dirs, "gsl.h"),
            Some(second.path().join("gsl.h"))
        );
    }

    // -----------------------------------------------------------------------
    // MockFileSystemOps
    // -----------------------------------------------------------------------

    #[test]
    fn mock_file_exists() {
        let ops = MockFileSystemOps::new().with_file("/usr/include/zlib.h");
        assert!(ops.exists(Path::new("/usr/include/zlib.h")));
        assert!(ops.is_file(Path::new("/usr/include/zlib.h")));
        assert!(!ops.is_dir(Path::new("/usr/include/zlib.h")));
    }

    #[test]
    fn mock_find_file_none_when_missing() {
        let ops = MockFileSystemOps::new().with_dir("/usr/include");
        assert!(
            ops.find_file(&[PathBuf::from("/usr/include")], "pthread.h")
                .is_none()
        );
    }
}
