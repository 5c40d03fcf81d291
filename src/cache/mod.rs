//! Persisted snapshot store.
//!
//! # Storage Layout
//!
//! ```text
//! <build>/.cache/
//! ├── config.json   # CacheRecord: schema, key, snapshot
//! └── .lock         # writer lock, held only while renaming into place
//! ```
//!
//! Readers never lock: the record is only ever replaced by an atomic
//! rename, so a reader sees either the old or the new file in full.
//!
//! A record whose fingerprint matches but whose probed environment changed
//! behind our back (e.g. a library removed by hand) is still served; only
//! the environment signature's coarse facts are checked. `--force` bypasses
//! the cache.
pub mod fingerprint;

use std::fs;
use std::io::{self, BufWriter, Write as _};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::CacheError;
use crate::resolved::ResolvedConfig;
use fingerprint::SCHEMA_VERSION;

/// Directory name for the cache within the build directory.
pub const CACHE_DIR: &str = ".cache";

/// Record file name.
const RECORD_FILENAME: &str = "config.json";

/// Lock file name.
const LOCK_FILENAME: &str = ".lock";

/// Identifies a reusable snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheKey {
    /// Fingerprint of every resolution input.
    pub fingerprint: String,
    /// Signature of host-specific facts.
    pub environment: String,
}

/// On-disk layout of `config.json`.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    schema: u32,
    key: CacheKey,
    config: ResolvedConfig,
}

/// Reads and atomically replaces the persisted snapshot.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Create a store rooted at `<build_dir>/.cache`.
    #[must_use]
    pub fn new(build_dir: &Path) -> Self {
        Self {
            dir: build_dir.join(CACHE_DIR),
        }
    }

    /// Path of the record file.
    #[must_use]
    pub fn record_path(&self) -> PathBuf {
        self.dir.join(RECORD_FILENAME)
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILENAME)
    }

    /// Load the snapshot stored under exactly `key`.
    ///
    /// Any problem (missing, unreadable, truncated, other schema, other
    /// key) yields `None` so the caller recomputes.
    #[must_use]
    pub fn load(&self, key: &CacheKey) -> Option<ResolvedConfig> {
        let record = self.read_record()?;
        if record.key.fingerprint != key.fingerprint {
            tracing::debug!("cache fingerprint changed, recomputing");
            return None;
        }
        if record.key.environment != key.environment {
            tracing::debug!("cache environment signature changed, recomputing");
            return None;
        }
        if record.config.fingerprint != key.fingerprint {
            tracing::warn!("cache record is inconsistent with its key, recomputing");
            return None;
        }
        Some(record.config)
    }

    /// Load whatever snapshot is stored, without checking its key.
    ///
    /// For consumers that treat the last configuration as authoritative.
    #[must_use]
    pub fn load_latest(&self) -> Option<ResolvedConfig> {
        self.read_record().map(|r| r.config)
    }

    fn read_record(&self) -> Option<CacheRecord> {
        let path = self.record_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("no cache record at {}", path.display());
                return None;
            }
            Err(e) => {
                tracing::warn!("cannot read cache record {}: {e}", path.display());
                return None;
            }
        };
        let record: CacheRecord = match serde_json::from_str(&content) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("ignoring corrupt cache record {}: {e}", path.display());
                return None;
            }
        };
        if record.schema != SCHEMA_VERSION {
            tracing::debug!(
                "cache schema {} differs from {SCHEMA_VERSION}, recomputing",
                record.schema
            );
            return None;
        }
        Some(record)
    }

    /// Serialize the snapshot into a synced temporary file next to the
    /// record. Nothing visible changes until [`StagedWrite::commit`].
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or temporary file cannot be
    /// created, or the record cannot be written.
    pub fn stage(&self, key: &CacheKey, config: &ResolvedConfig) -> Result<StagedWrite, CacheError> {
        fs::create_dir_all(&self.dir).map_err(|source| CacheError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let record = CacheRecord {
            schema: SCHEMA_VERSION,
            key: key.clone(),
            config: config.clone(),
        };

        let write_err = |source| CacheError::Write {
            path: self.dir.clone(),
            source,
        };
        let mut file = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, &record)?;
            writer.write_all(b"\n").map_err(write_err)?;
            writer.flush().map_err(write_err)?;
        }
        file.as_file().sync_all().map_err(write_err)?;

        Ok(StagedWrite {
            file,
            target: self.record_path(),
            lock: self.lock_path(),
        })
    }

    /// Stage and commit in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if staging or committing fails; the previous
    /// record is left in place.
    pub fn store(&self, key: &CacheKey, config: &ResolvedConfig) -> Result<(), CacheError> {
        self.stage(key, config)?.commit()
    }

    /// Remove the cache directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be removed.
    pub fn clear(&self) -> io::Result<bool> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// A fully written, synced record waiting to replace the current one.
///
/// Dropping it without calling [`commit`](Self::commit) deletes the
/// temporary file and leaves the previous record untouched.
#[derive(Debug)]
pub struct StagedWrite {
    file: NamedTempFile,
    target: PathBuf,
    lock: PathBuf,
}

impl StagedWrite {
    /// Atomically rename the staged record into place under the writer lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock cannot be taken or the rename fails.
    pub fn commit(self) -> Result<(), CacheError> {
        let lock_err = |source| CacheError::Lock {
            path: self.lock.clone(),
            source,
        };
        let lock = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock)
            .map_err(lock_err)?;
        FileExt::lock_exclusive(&lock).map_err(lock_err)?;

        let result = self
            .file
            .persist(&self.target)
            .map(|_| ())
            .map_err(|e| CacheError::Persist {
                path: self.target.clone(),
                source: e.error,
            });

        FileExt::unlock(&lock).ok();
        result
    }
}
