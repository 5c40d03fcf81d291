//! Top-level subcommand orchestration.
//!
//! Commands translate command-line options into engine calls and turn typed
//! errors into `anyhow` ones with context for the operator.
pub mod clean;
pub mod completions;
pub mod configure;
pub mod emit;
pub mod status;
pub mod version;

use std::io::Write as _;
use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::CONF_DIR;

/// Environment variable naming the project root.
pub const ROOT_ENV: &str = "BUILDCONF_ROOT";

/// Build directory under the root when `--build-dir` is not given.
pub const DEFAULT_BUILD_DIR: &str = "build";

/// Log file written under the build directory by `configure`.
pub const LOG_FILE: &str = "config.log";

/// Directories a command operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Project root containing `conf/`.
    pub root: PathBuf,
    /// Build directory receiving the cache and generated files.
    pub build_dir: PathBuf,
}

impl Layout {
    /// Resolve the root and build directory from the global options.
    ///
    /// # Errors
    ///
    /// Returns an error if the project root cannot be determined.
    pub fn resolve(global: &GlobalOpts) -> Result<Self> {
        let root = resolve_root(global)?;
        let build_dir = global
            .build_dir
            .clone()
            .unwrap_or_else(|| root.join(DEFAULT_BUILD_DIR));
        Ok(Self { root, build_dir })
    }

    /// Path of the run log.
    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.build_dir.join(LOG_FILE)
    }
}

/// Determine the project root.
///
/// Tries `--root`, then `BUILDCONF_ROOT`, then the current directory when
/// it contains `conf/`.
///
/// # Errors
///
/// Returns an error if none of these yields a root.
pub fn resolve_root(global: &GlobalOpts) -> Result<PathBuf> {
    if let Some(ref root) = global.root {
        return Ok(root.clone());
    }

    if let Ok(root) = std::env::var(ROOT_ENV) {
        return Ok(PathBuf::from(root));
    }

    let cwd = std::env::current_dir().context("reading current directory")?;
    if cwd.join(CONF_DIR).is_dir() {
        return Ok(cwd);
    }

    anyhow::bail!("cannot determine project root. Use --root or set {ROOT_ENV} env var");
}

/// The build directory without requiring a project root when `--build-dir`
/// is given.
///
/// # Errors
///
/// Returns an error if `--build-dir` is absent and no root can be found.
pub fn resolve_build_dir(global: &GlobalOpts) -> Result<PathBuf> {
    match &global.build_dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(resolve_root(global)?.join(DEFAULT_BUILD_DIR)),
    }
}

/// Write `text` to stdout and flush.
pub(crate) fn write_stdout(text: &str) -> Result<()> {
    let mut out = std::io::stdout().lock();
    out.write_all(text.as_bytes())
        .and_then(|()| out.flush())
        .context("writing to stdout")
}
