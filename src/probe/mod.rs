//! Environment prober: runs declared checks against the host.
//!
//! A check that finds nothing (missing header, absent tool, failing compile
//! test) is an ordinary result with `outcome = false`. Only faults of the
//! prober itself, timeouts and cancellation abort the run.
pub mod compile;
pub mod pkg_config;
pub mod predicate;
pub mod search;
pub mod toolchain;

use std::collections::BTreeMap;
use std::path::PathBuf;

use rayon::prelude::*;

use crate::config::checks::{CheckKind, CheckSpec};
use crate::context::Context;
use crate::error::ProbeError;
use crate::exec::{CommandLine, ExecError, ExecResult};
use crate::resolved::{Flags, ProbeResult};
use toolchain::Toolchain;

/// Everything a probe may consult.
#[derive(Debug, Clone, Copy)]
pub struct ProbeEnv<'a> {
    /// Run context.
    pub ctx: &'a Context,
    /// Detected compilers.
    pub toolchain: &'a Toolchain,
    /// Compiler and linker flags applied to compile tests.
    pub flags: &'a Flags,
}

/// A probe result plus the host-specific location it was found at.
///
/// The location is kept out of [`ProbeResult`] so that identical outcomes
/// on different hosts produce identical results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probed {
    /// Host-independent result.
    pub result: ProbeResult,
    /// Absolute path of the header, library or program, if any.
    pub location: Option<PathBuf>,
}

impl Probed {
    fn found(check_id: &str, detail: impl Into<String>) -> Self {
        Self {
            result: ProbeResult::found(check_id, detail),
            location: None,
        }
    }

    fn found_at(check_id: &str, detail: impl Into<String>, location: PathBuf) -> Self {
        Self {
            result: ProbeResult::found(check_id, detail),
            location: Some(location),
        }
    }

    fn missing(check_id: &str, detail: impl Into<String>) -> Self {
        Self {
            result: ProbeResult::missing(check_id, detail),
            location: None,
        }
    }
}

/// Results of a batch run, keyed by check id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeBatch {
    /// One result per check.
    pub results: BTreeMap<String, ProbeResult>,
    /// Host-specific locations of found items.
    pub locations: BTreeMap<String, PathBuf>,
}

/// Run a single check.
///
/// # Errors
///
/// Returns an error on prober faults, probe timeouts or cancellation.
pub fn probe(check: &CheckSpec, env: &ProbeEnv<'_>) -> Result<Probed, ProbeError> {
    if env.ctx.cancel.is_cancelled() {
        return Err(ProbeError::Cancelled);
    }
    let id = check.id.as_str();
    let probed = match &check.kind {
        CheckKind::Compiler { lang } => match env.toolchain.compiler(*lang) {
            Some(compiler) => {
                Probed::found_at(id, compiler.id.to_string(), compiler.path.clone())
            }
            None => Probed::missing(id, format!("no {lang} compiler")),
        },
        CheckKind::Header { header } => search::header(env, id, header)?,
        CheckKind::Library { library } => search::library(env, id, library)?,
        CheckKind::Program { program } => search::program(env.ctx, id, program),
        CheckKind::PkgConfig {
            package,
            min_version,
        } => pkg_config::package(env.ctx, id, package, min_version.as_deref())?,
        CheckKind::Compile {
            lang,
            code,
            flags,
            link,
        } => compile::snippet(env, id, *lang, code, flags, *link)?,
        CheckKind::Platform { os, arch } => predicate::platform(env.ctx, id, os, arch),
        CheckKind::File { path } => search::file(env.ctx, id, path),
        CheckKind::Env { var } => predicate::env_var(id, var),
    };
    env.ctx.log.debug(&format!(
        "check {id} ({}): {}{}",
        check.kind,
        if probed.result.outcome { "yes" } else { "no" },
        probed
            .result
            .detail
            .as_deref()
            .map(|d| format!(" [{d}]"))
            .unwrap_or_default()
    ));
    Ok(probed)
}

/// Run every check on a worker pool sized to `ctx.jobs` and wait for all
/// of them.
///
/// # Errors
///
/// Returns the first prober fault, timeout or cancellation; partial results
/// are discarded.
pub fn batch(checks: &[CheckSpec], env: &ProbeEnv<'_>) -> Result<ProbeBatch, ProbeError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(env.ctx.jobs.max(1))
        .thread_name(|i| format!("probe-{i}"))
        .build()
        .map_err(|e| ProbeError::Pool(e.to_string()))?;

    let probed: Vec<Probed> = pool.install(|| {
        checks
            .par_iter()
            .map(|check| probe(check, env))
            .collect::<Result<Vec<_>, _>>()
    })?;

    let mut out = ProbeBatch::default();
    for p in probed {
        if let Some(location) = p.location {
            out.locations.insert(p.result.check_id.clone(), location);
        }
        out.results.insert(p.result.check_id.clone(), p.result);
    }
    Ok(out)
}

/// Run a probe process.
///
/// A program that cannot be started yields `Ok(None)`: an unavailable tool
/// is a negative outcome, not a fault.
///
/// # Errors
///
/// Returns an error if the process times out or the run is cancelled.
pub(crate) fn run(
    ctx: &Context,
    check: &str,
    cmd: &CommandLine,
) -> Result<Option<ExecResult>, ProbeError> {
    match ctx.executor.run(cmd) {
        Ok(result) => Ok(Some(result)),
        Err(ExecError::TimedOut { program, timeout }) => Err(ProbeError::TimedOut {
            check: check.to_string(),
            program,
            secs: timeout.as_secs(),
        }),
        Err(ExecError::Cancelled) => Err(ProbeError::Cancelled),
        Err(e @ (ExecError::Spawn { .. } | ExecError::Wait { .. })) => {
            ctx.log.debug(&format!("check {check}: {e}"));
            Ok(None)
        }
    }
}

/// First non-empty line of a process's diagnostics, for failure details.
pub(crate) fn first_line(result: &ExecResult) -> Option<String> {
    result
        .stderr
        .lines()
        .chain(result.stdout.lines())
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(ToString::to_string)
}

/// Shared mocks and factories for prober unit tests.
#[cfg(test)]
pub(crate) mod test_helpers {
    use std::path::PathBuf;
    use std::sync::Arc;

    use mockall::mock;

    use super::toolchain::{DetectedCompiler, Toolchain};
    use crate::cancel::CancelToken;
    use crate::context::Context;
    use crate::exec::{CommandLine, ExecError, ExecResult, Executor};
    use crate::logging::Logger;
    use crate::operations::MockFileSystemOps;
    use crate::platform::{Arch, Os, Platform};
    use crate::resolved::CompilerId;

    mock! {
        pub Exec {}
        impl Executor for Exec {
            fn run(&self, cmd: &CommandLine) -> Result<ExecResult, ExecError>;
            fn which(&self, program: &str, search_paths: &[PathBuf]) -> Option<PathBuf>;
        }
    }

    /// Linux x86-64 context over `exec` and `fs` with `/usr/include` and
    /// `/usr/lib` as the only search paths.
    pub(crate) fn linux_context(exec: MockExec, fs: MockFileSystemOps) -> Context {
        let mut ctx = Context::new(
            PathBuf::from("/project"),
            Platform::new(Os::Linux, Arch::X86_64),
            Arc::new(Logger::new(None)),
            Arc::new(exec),
            CancelToken::new(),
        )
        .with_fs_ops(Arc::new(fs))
        .with_jobs(Some(2));
        ctx.include_paths = vec![PathBuf::from("/usr/include")];
        ctx.library_paths = vec![PathBuf::from("/usr/lib")];
        ctx
    }

    /// A gcc C compiler at `/usr/bin/gcc` and no C++ compiler.
    pub(crate) fn gcc_toolchain() -> Toolchain {
        Toolchain {
            cc: Some(DetectedCompiler {
                id: CompilerId {
                    family: "gcc".to_string(),
                    version: "13.2.0".to_string(),
                },
                path: PathBuf::from("/usr/bin/gcc"),
            }),
            cxx: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::test_helpers::{MockExec, gcc_toolchain, linux_context};
    use super::*;
    use crate::config::checks::Lang;
    use crate::operations::MockFileSystemOps;
    use std::time::Duration;

    // -----------------------------------------------------------------------
    // probe
    // -----------------------------------------------------------------------

    #[test]
    fn compiler_check_uses_toolchain() {
        let ctx = linux_context(MockExec::new(), MockFileSystemOps::new());
        let toolchain = gcc_toolchain();
        let flags = Flags::default();
        let env = ProbeEnv {
            ctx: &ctx,
            toolchain: &toolchain,
            flags: &flags,
        };

        let cc = probe(&CheckSpec::new("cc", CheckKind::Compiler { lang: Lang::C }), &env).unwrap();
        assert!(cc.result.outcome);
        assert_eq!(cc.result.detail.as_deref(), Some("gcc 13.2.0"));
        assert_eq!(cc.location, Some(PathBuf::from("/usr/bin/gcc")));

        let cxx = probe(
            &CheckSpec::new("cxx", CheckKind::Compiler { lang: Lang::Cxx }),
            &env,
        )
        .unwrap();
        assert!(!cxx.result.outcome);
        assert_eq!(cxx.result.detail.as_deref(), Some("no C++ compiler"));
    }

    #[test]
    fn cancelled_probe_is_error() {
        let ctx = linux_context(MockExec::new(), MockFileSystemOps::new());
        ctx.cancel.cancel();
        let toolchain = gcc_toolchain();
        let flags = Flags::default();
        let env = ProbeEnv {
            ctx: &ctx,
            toolchain: &toolchain,
            flags: &flags,
        };
        let err = probe(
            &CheckSpec::new("cc", CheckKind::Compiler { lang: Lang::C }),
            &env,
        )
        .unwrap_err();
        assert!(matches!(err, ProbeError::Cancelled));
    }

    // -----------------------------------------------------------------------
    // batch
    // -----------------------------------------------------------------------

    #[test]
    fn batch_collects_results_and_locations() {
        let mut exec = MockExec::new();
        exec.expect_which().returning(|program, _| {
            (program == "doxygen").then(|| PathBuf::from("/usr/bin/doxygen"))
        });
        let fs = MockFileSystemOps::new().with_file("/usr/include/pthread.h");
        let ctx = linux_context(exec, fs);
        let toolchain = gcc_toolchain();
        let flags = Flags::default();
        let env = ProbeEnv {
            ctx: &ctx,
            toolchain: &toolchain,
            flags: &flags,
        };
        let checks = vec![
            CheckSpec::new(
                "pthread_header",
                CheckKind::Header {
                    header: "pthread.h".to_string(),
                },
            ),
            CheckSpec::new(
                "doxygen",
                CheckKind::Program {
                    program: "doxygen".to_string(),
                },
            ),
            CheckSpec::new(
                "valgrind",
                CheckKind::Program {
                    program: "valgrind".to_string(),
                },
            ),
        ];

        let out = batch(&checks, &env).unwrap();
        assert_eq!(out.results.len(), 3);
        assert!(out.results["pthread_header"].outcome);
        assert!(out.results["doxygen"].outcome);
        assert!(!out.results["valgrind"].outcome);
        assert_eq!(
            out.locations.get("pthread_header"),
            Some(&PathBuf::from("/usr/include/pthread.h"))
        );
        assert!(!out.locations.contains_key("valgrind"));
    }

    #[test]
    fn batch_aborts_on_timeout() {
        let mut exec = MockExec::new();
        exec.expect_which()
            .returning(|_, _| Some(PathBuf::from("/usr/bin/pkg-config")));
        exec.expect_run().returning(|cmd| {
            Err(ExecError::TimedOut {
                program: cmd.program.clone(),
                timeout: Duration::from_secs(60),
            })
        });
        let ctx = linux_context(exec, MockFileSystemOps::new());
        let toolchain = gcc_toolchain();
        let flags = Flags::default();
        let env = ProbeEnv {
            ctx: &ctx,
            toolchain: &toolchain,
            flags: &flags,
        };
        let checks = vec![CheckSpec::new(
            "libxml2",
            CheckKind::PkgConfig {
                package: "libxml-2.0".to_string(),
                min_version: None,
            },
        )];
        let err = batch(&checks, &env).unwrap_err();
        assert!(matches!(err, ProbeError::TimedOut { secs: 60, .. }));
    }

    // -----------------------------------------------------------------------
    // run
    // -----------------------------------------------------------------------

    #[test]
    fn spawn_failure_is_negative_not_fault() {
        let mut exec = MockExec::new();
        exec.expect_run().returning(|cmd| {
            Err(ExecError::Spawn {
                program: cmd.program.clone(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        });
        let ctx = linux_context(exec, MockFileSystemOps::new());
        let out = run(&ctx, "x", &CommandLine::new("nope")).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn first_line_prefers_stderr() {
        let mut result = ExecResult::failed("\n  error: boom\nmore\n");
        result.stdout = "noise".to_string();
        assert_eq!(first_line(&result).as_deref(), Some("error: boom"));
        assert_eq!(first_line(&ExecResult::ok("")), None);
    }
}
