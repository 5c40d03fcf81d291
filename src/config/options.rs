//! User option defaults (`conf/options.toml`).
//!
//! Every field mirrors a `configure` command-line option; values given on
//! the command line take precedence over the file.
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::toml_loader::load_config;
use crate::error::ManifestError;
use crate::platform::{Arch, Os};
use crate::resolved::BuildProfile;

/// Persisted option defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Options {
    /// Features to force on.
    pub enable: Vec<String>,
    /// Features to force off.
    pub disable: Vec<String>,
    /// Restrict the build to these modules (plus their dependencies).
    pub modules: Option<Vec<String>>,
    /// Modules to leave out.
    pub exclude_modules: Vec<String>,
    /// Build profile.
    pub build_profile: Option<BuildProfile>,
    /// Installation prefix.
    pub prefix: Option<PathBuf>,
    /// Extra header search directories.
    pub include_paths: Vec<PathBuf>,
    /// Extra library search directories.
    pub library_paths: Vec<PathBuf>,
    /// Extra program search directories.
    pub tool_paths: Vec<PathBuf>,
    /// C compiler to use.
    pub cc: Option<String>,
    /// C++ compiler to use.
    pub cxx: Option<String>,
    /// Extra C compiler flags.
    pub cflags: Vec<String>,
    /// Extra C++ compiler flags.
    pub cxxflags: Vec<String>,
    /// Extra linker flags.
    pub ldflags: Vec<String>,
    /// Target operating system.
    pub target_os: Option<Os>,
    /// Target CPU architecture.
    pub target_arch: Option<Arch>,
    /// Probe worker count.
    pub jobs: Option<usize>,
    /// Per-probe timeout in seconds.
    pub probe_timeout: Option<u64>,
}

/// Load option defaults from `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load(path: &Path) -> Result<Options, ManifestError> {
    load_config(path)
}
