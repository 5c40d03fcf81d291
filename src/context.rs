use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::exec::Executor;
use crate::logging::Log;
use crate::operations::{FileSystemOps, SystemFileSystemOps};
use crate::platform::Platform;

/// Default per-probe timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// Shared, read-only context for one resolution run.
pub struct Context {
    /// Project root; relative `file` checks resolve against it.
    pub root: PathBuf,
    /// Target platform.
    pub platform: Platform,
    /// Header search directories, user-supplied first.
    pub include_paths: Vec<PathBuf>,
    /// Library search directories, user-supplied first.
    pub library_paths: Vec<PathBuf>,
    /// Program search directories searched before `PATH`.
    pub tool_paths: Vec<PathBuf>,
    /// Logger for output and step recording.
    pub log: Arc<dyn Log>,
    /// Process executor (real or fake).
    pub executor: Arc<dyn Executor>,
    /// Filesystem queries (injectable for testing).
    pub fs_ops: Arc<dyn FileSystemOps>,
    /// Cooperative cancellation flag.
    pub cancel: CancelToken,
    /// Probe worker count.
    pub jobs: usize,
    /// Timeout after which a probe process is killed.
    pub probe_timeout: Duration,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("root", &self.root)
            .field("platform", &self.platform)
            .field("include_paths", &self.include_paths)
            .field("library_paths", &self.library_paths)
            .field("tool_paths", &self.tool_paths)
            .field("log", &"<dyn Log>")
            .field("executor", &"<dyn Executor>")
            .field("fs_ops", &self.fs_ops)
            .field("cancel", &self.cancel)
            .field("jobs", &self.jobs)
            .field("probe_timeout", &self.probe_timeout)
            .finish()
    }
}

impl Context {
    /// Create a context with the platform's default search paths, one probe
    /// worker per available CPU and the default probe timeout.
    #[must_use]
    pub fn new(
        root: PathBuf,
        platform: Platform,
        log: Arc<dyn Log>,
        executor: Arc<dyn Executor>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            root,
            include_paths: platform.default_include_paths(),
            library_paths: platform.default_library_paths(),
            tool_paths: Vec::new(),
            platform,
            log,
            executor,
            fs_ops: Arc::new(SystemFileSystemOps),
            cancel,
            jobs: default_jobs(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Put user-supplied search directories ahead of the defaults.
    #[must_use]
    pub fn with_search_paths(
        mut self,
        include: &[PathBuf],
        library: &[PathBuf],
        tool: &[PathBuf],
    ) -> Self {
        self.include_paths = prepend(include, self.include_paths);
        self.library_paths = prepend(library, self.library_paths);
        self.tool_paths = prepend(tool, self.tool_paths);
        self
    }

    /// Override the worker count; `None` keeps the default.
    #[must_use]
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        if let Some(jobs) = jobs {
            self.jobs = jobs.max(1);
        }
        self
    }

    /// Override the probe timeout.
    #[must_use]
    pub const fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Replace the [`FileSystemOps`] implementation.
    #[must_use]
    pub fn with_fs_ops(mut self, fs_ops: Arc<dyn FileSystemOps>) -> Self {
        self.fs_ops = fs_ops;
        self
    }

    /// Every search directory, in include, library, tool order.
    pub fn search_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.include_paths
            .iter()
            .chain(&self.library_paths)
            .chain(&self.tool_paths)
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

fn prepend(user: &[PathBuf], defaults: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = user.to_vec();
    for path in defaults {
        if !out.contains(&path) {
            out.push(path);
        }
    }
    out
}
