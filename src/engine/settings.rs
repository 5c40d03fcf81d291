//! Effective inputs of one resolution run.
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::fingerprint::ModuleRequest;
use crate::config::options::Options;
use crate::context::DEFAULT_PROBE_TIMEOUT;
use crate::platform::{Arch, Os};
use crate::resolved::BuildProfile;

/// Default installation prefix.
pub const DEFAULT_PREFIX: &str = "/usr/local";

/// Everything the user asked for, after merging `conf/options.toml` with
/// the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Project root containing `conf/`.
    pub root: PathBuf,
    /// Build directory receiving the cache and generated files.
    pub build_dir: PathBuf,
    /// Features to force on.
    pub enable: Vec<String>,
    /// Features to force off.
    pub disable: Vec<String>,
    /// Module selection.
    pub modules: ModuleRequest,
    /// Build profile.
    pub profile: BuildProfile,
    /// Installation prefix.
    pub prefix: PathBuf,
    /// Extra header search directories.
    pub include_paths: Vec<PathBuf>,
    /// Extra library search directories.
    pub library_paths: Vec<PathBuf>,
    /// Extra program search directories.
    pub tool_paths: Vec<PathBuf>,
    /// Requested C compiler.
    pub cc: Option<String>,
    /// Requested C++ compiler.
    pub cxx: Option<String>,
    /// Extra C flags.
    pub cflags: Vec<String>,
    /// Extra C++ flags.
    pub cxxflags: Vec<String>,
    /// Extra linker flags.
    pub ldflags: Vec<String>,
    /// Target operating system; host when `None`.
    pub target_os: Option<Os>,
    /// Target architecture; host when `None`.
    pub target_arch: Option<Arch>,
    /// Probe worker count; available parallelism when `None`.
    pub jobs: Option<usize>,
    /// Per-probe timeout.
    pub probe_timeout: Duration,
    /// Ignore any cached snapshot.
    pub force: bool,
}

impl Settings {
    /// Defaults for `root` with artifacts under `build_dir`.
    #[must_use]
    pub fn new(root: &Path, build_dir: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            build_dir: build_dir.to_path_buf(),
            enable: Vec::new(),
            disable: Vec::new(),
            modules: ModuleRequest::default(),
            profile: BuildProfile::default(),
            prefix: PathBuf::from(DEFAULT_PREFIX),
            include_paths: Vec::new(),
            library_paths: Vec::new(),
            tool_paths: Vec::new(),
            cc: None,
            cxx: None,
            cflags: Vec::new(),
            cxxflags: Vec::new(),
            ldflags: Vec::new(),
            target_os: None,
            target_arch: None,
            jobs: None,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            force: false,
        }
    }

    /// Apply persisted option defaults.
    #[must_use]
    pub fn with_options(mut self, options: &Options) -> Self {
        self.enable.clone_from(&options.enable);
        self.disable.clone_from(&options.disable);
        self.modules = ModuleRequest {
            only: options.modules.clone(),
            exclude: options.exclude_modules.clone(),
        };
        if let Some(profile) = options.build_profile {
            self.profile = profile;
        }
        if let Some(prefix) = &options.prefix {
            self.prefix.clone_from(prefix);
        }
        self.include_paths.clone_from(&options.include_paths);
        self.library_paths.clone_from(&options.library_paths);
        self.tool_paths.clone_from(&options.tool_paths);
        self.cc.clone_from(&options.cc);
        self.cxx.clone_from(&options.cxx);
        self.cflags.clone_from(&options.cflags);
        self.cxxflags.clone_from(&options.cxxflags);
        self.ldflags.clone_from(&options.ldflags);
        self.target_os = options.target_os;
        self.target_arch = options.target_arch;
        self.jobs = options.jobs;
        if let Some(secs) = options.probe_timeout {
            self.probe_timeout = Duration::from_secs(secs);
        }
        self
    }
}
