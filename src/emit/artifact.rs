//! Generated files written only when their contents change.
//!
//! Downstream incremental tooling keys on modification times, so an
//! artifact whose bytes already match is left untouched.
use std::fs;
use std::io::{self, Write as _};
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use tempfile::NamedTempFile;

/// State of an artifact on disk relative to its desired contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactState {
    /// The file does not exist.
    Missing,
    /// The file exists with the desired contents.
    Correct,
    /// The file exists with different contents.
    Stale,
}

/// Result of applying an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactChange {
    /// The file was created or replaced.
    Written,
    /// The file already matched and was not touched.
    Unchanged,
}

/// A generated file and its desired contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Destination path.
    pub path: PathBuf,
    /// Desired contents.
    pub contents: String,
}

impl Artifact {
    /// Create an artifact.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, contents: String) -> Self {
        Self {
            path: path.into(),
            contents,
        }
    }

    /// Compare the file on disk with the desired contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn current_state(&self) -> Result<ArtifactState> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes == self.contents.as_bytes() => Ok(ArtifactState::Correct),
            Ok(_) => Ok(ArtifactState::Stale),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(ArtifactState::Missing),
            Err(e) => Err(e).with_context(|| format!("reading {}", self.path.display())),
        }
    }

    /// Write the file unless it already has the desired contents.
    ///
    /// The new contents are staged next to the destination and renamed into
    /// place, so readers never see a partial file.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub fn apply(&self) -> Result<ArtifactChange> {
        if self.current_state()? == ArtifactState::Correct {
            return Ok(ArtifactChange::Unchanged);
        }
        let dir = self
            .path
            .parent()
            .with_context(|| format!("{} has no parent directory", self.path.display()))?;
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

        let mut staged = NamedTempFile::new_in(dir)
            .with_context(|| format!("staging {}", self.path.display()))?;
        staged
            .write_all(self.contents.as_bytes())
            .and_then(|()| staged.as_file().sync_all())
            .with_context(|| format!("writing {}", self.path.display()))?;
        staged
            .persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(ArtifactChange::Written)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = Artifact::new(dir.path().join("out/defines.txt"), "A=1\n".to_string());
        assert_eq!(artifact.current_state().unwrap(), ArtifactState::Missing);
        assert_eq!(artifact.apply().unwrap(), ArtifactChange::Written);
        assert_eq!(fs::read_to_string(&artifact.path).unwrap(), "A=1\n");
        assert_eq!(artifact.current_state().unwrap(), ArtifactState::Correct);
    }

    #[test]
    fn identical_contents_are_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = Artifact::new(dir.path().join("config.h"), "x\n".to_string());
        artifact.apply().unwrap();
        let before = fs::metadata(&artifact.path).unwrap().modified().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(artifact.apply().unwrap(), ArtifactChange::Unchanged);
        let after = fs::metadata(&artifact.path).unwrap().modified().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn stale_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.env");
        fs::write(&path, "old\n").unwrap();
        let artifact = Artifact::new(&path, "new\n".to_string());
        assert_eq!(artifact.current_state().unwrap(), ArtifactState::Stale);
        assert_eq!(artifact.apply().unwrap(), ArtifactChange::Written);
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1, "no staged files left behind");
    }
}
