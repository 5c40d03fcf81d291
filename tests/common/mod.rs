// Shared helpers for integration tests.
//
// Provides a temporary manifest repository, a scripted executor and an
// in-memory filesystem so each integration test can run the engine without
// touching real compilers or system headers.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use buildconf::cancel::CancelToken;
use buildconf::engine::{Engine, Resolution, Settings};
use buildconf::exec::{CommandLine, ExecError, ExecResult, Executor};
use buildconf::logging::Logger;
use buildconf::operations::FileSystemOps;
use buildconf::platform::{Arch, Os, Platform};

pub const PROJECT_TOML: &str = "name = \"sim\"\nversion = \"3.1.0\"\n";

pub const CHECKS_TOML: &str = r#"
[pthread_header]
kind = "header"
header = "pthread.h"
define = "HAVE_PTHREAD_H"

[gsl_lib]
kind = "library"
library = "gsl"
define = "HAVE_GSL"

[python]
kind = "program"
hard = true
program = "python3"
"#;

pub const FEATURES_TOML: &str = r#"
[[feature]]
key = "Threading"
name = "Threading primitives"
depends = ["pthread_header"]

[[feature]]
key = "RealTime"
name = "Real time scheduler"
depends = ["Threading"]

[[feature]]
key = "GSL"
name = "GNU Scientific Library"
depends = ["gsl_lib"]
payload_from = "gsl_lib"

[[feature]]
key = "Bindings"
name = "Python bindings"
depends = ["python"]
"#;

pub const MODULES_TOML: &str = r#"
[[module]]
name = "core"

[[module]]
name = "network"
depends = ["core"]

[[module]]
name = "realtime-sim"
requires = ["RealTime"]
depends = ["core"]

[[module]]
name = "stats"
requires = ["GSL"]
depends = ["core"]

[[module]]
name = "bindings"
requires = ["Bindings"]
depends = ["network"]
"#;

/// Write a manifest repository under `root`.
pub fn write_manifest(root: &Path, checks: &str, features: &str, modules: &str) {
    let conf = root.join("conf");
    std::fs::create_dir_all(&conf).expect("create conf dir");
    std::fs::write(conf.join("project.toml"), PROJECT_TOML).expect("write project.toml");
    std::fs::write(conf.join("checks.toml"), checks).expect("write checks.toml");
    std::fs::write(conf.join("features.toml"), features).expect("write features.toml");
    std::fs::write(conf.join("modules.toml"), modules).expect("write modules.toml");
}

/// An isolated project and build directory backed by [`tempfile::TempDir`]s.
pub struct TestProject {
    pub root: tempfile::TempDir,
    pub build: tempfile::TempDir,
}

impl TestProject {
    /// A project with the standard simulator manifest.
    pub fn new() -> Self {
        Self::with_manifest(CHECKS_TOML, FEATURES_TOML, MODULES_TOML)
    }

    /// A project with the given manifest files.
    pub fn with_manifest(checks: &str, features: &str, modules: &str) -> Self {
        let root = tempfile::tempdir().expect("create root dir");
        let build = tempfile::tempdir().expect("create build dir");
        write_manifest(root.path(), checks, features, modules);
        Self { root, build }
    }

    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    pub fn build_path(&self) -> &Path {
        self.build.path()
    }

    /// Default settings with `/usr/include` and `/usr/lib` as user paths.
    pub fn settings(&self) -> Settings {
        let mut s = Settings::new(self.root_path(), self.build_path());
        s.include_paths = vec![PathBuf::from("/usr/include")];
        s.library_paths = vec![PathBuf::from("/usr/lib")];
        s
    }
}

/// Executor that answers compiler lookups from a table and fails every
/// compile test.
#[derive(Debug, Default)]
pub struct FakeExecutor {
    programs: BTreeMap<String, PathBuf>,
    banner: String,
    pub compile_runs: AtomicUsize,
}

impl FakeExecutor {
    /// gcc 13.2.0 at `/usr/bin/gcc` and `/usr/bin/g++`.
    pub fn gcc() -> Self {
        Self::gcc_in(Path::new("/usr/bin"))
    }

    /// gcc 13.2.0 installed in `dir`.
    pub fn gcc_in(dir: &Path) -> Self {
        Self {
            programs: BTreeMap::new(),
            banner: "gcc (GCC) 13.2.0\nCopyright (C) 2023 Free Software Foundation, Inc.\n"
                .to_string(),
            compile_runs: AtomicUsize::new(0),
        }
        .with_program("gcc", dir.join("gcc"))
        .with_program("g++", dir.join("g++"))
    }

    /// Make `name` resolvable.
    pub fn with_program(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.programs.insert(name.to_string(), path.into());
        self
    }

    pub fn compiles(&self) -> usize {
        self.compile_runs.load(Ordering::SeqCst)
    }
}

impl Executor for FakeExecutor {
    fn run(&self, cmd: &CommandLine) -> Result<ExecResult, ExecError> {
        if cmd.has_arg("--version") {
            return Ok(ExecResult::ok(self.banner.clone()));
        }
        self.compile_runs.fetch_add(1, Ordering::SeqCst);
        Ok(ExecResult::failed("probe.c: fatal error: not available"))
    }

    fn which(&self, program: &str, _search_paths: &[PathBuf]) -> Option<PathBuf> {
        self.programs.get(program).cloned()
    }
}

/// In-memory filesystem holding a fixed set of files.
#[derive(Debug, Default)]
pub struct FakeFs {
    files: BTreeSet<PathBuf>,
    pub file_lookups: AtomicUsize,
}

impl FakeFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.insert(path.into());
        self
    }

    pub fn lookups(&self) -> usize {
        self.file_lookups.load(Ordering::SeqCst)
    }
}

impl FileSystemOps for FakeFs {
    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.file_lookups.fetch_add(1, Ordering::SeqCst);
        self.files.contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files.iter().any(|f| f != path && f.starts_with(path))
    }
}

/// A host where `pthread.h` is missing and GSL is installed.
pub fn host_without_pthread() -> FakeFs {
    FakeFs::new().with_file("/usr/lib/libgsl.so")
}

/// A host where every header and library exists.
pub fn complete_host() -> FakeFs {
    FakeFs::new()
        .with_file("/usr/include/pthread.h")
        .with_file("/usr/lib/libgsl.so")
}

/// An engine for a Linux x86-64 host over the given fakes.
pub fn engine(exec: &Arc<FakeExecutor>, fs: &Arc<FakeFs>) -> Engine {
    Engine::new(
        Arc::new(Logger::new(None)),
        Arc::clone(exec) as Arc<dyn Executor>,
        CancelToken::new(),
    )
    .with_fs_ops(Arc::clone(fs) as Arc<dyn FileSystemOps>)
    .with_host(Platform::new(Os::Linux, Arch::X86_64))
}

/// Run one configuration with fresh fakes.
pub fn configure(settings: &Settings, fs: FakeFs) -> Resolution {
    let exec = Arc::new(FakeExecutor::gcc());
    engine(&exec, &Arc::new(fs))
        .configure(settings)
        .expect("configure succeeds")
}
