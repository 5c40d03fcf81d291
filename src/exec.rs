//! External process execution for probes.
//!
//! All probes that spawn a process go through the [`Executor`] trait so that
//! unit and integration tests can replace the host toolchain with a fake.
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::cancel::CancelToken;

/// How often a running child is polled for completion, timeout and cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Result of a command execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, if the process was not killed by a signal.
    pub code: Option<i32>,
}

impl ExecResult {
    /// A successful result with the given stdout (used by fakes).
    #[must_use]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            success: true,
            code: Some(0),
        }
    }

    /// A failed result with the given stderr (used by fakes).
    #[must_use]
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            success: false,
            code: Some(1),
        }
    }
}

/// Failures to run a process at all.
///
/// A process that runs and exits non-zero is *not* an error; see
/// [`ExecResult::success`].
#[derive(Error, Debug)]
pub enum ExecError {
    /// The program could not be started (usually: not installed).
    #[error("failed to execute {program}: {source}")]
    Spawn {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Waiting on the child failed.
    #[error("failed to wait for {program}: {source}")]
    Wait {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The program was killed after exceeding the timeout.
    #[error("{program} timed out after {}s", timeout.as_secs())]
    TimedOut {
        /// Program that was invoked.
        program: String,
        /// Timeout that elapsed.
        timeout: Duration,
    },

    /// The run was cancelled while the program was running.
    #[error("cancelled")]
    Cancelled,
}

/// A program invocation: program, arguments and optional working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// Program name or path.
    pub program: String,
    /// Arguments, in order.
    pub args: Vec<String>,
    /// Working directory, if different from the current one.
    pub dir: Option<PathBuf>,
}

impl CommandLine {
    /// Start a command line for `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            dir: None,
        }
    }

    /// Append arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run in `dir`.
    #[must_use]
    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.dir = Some(dir.to_path_buf());
        self
    }

    /// Whether the argument list contains `arg`.
    #[must_use]
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Kill and reap `child`, then wait for its pipe readers to see EOF.
fn abandon(child: &mut Child, readers: [JoinHandle<Vec<u8>>; 2]) {
    child.kill().ok();
    child.wait().ok();
    for reader in readers {
        reader.join().ok();
    }
}

/// Abstraction over process execution and program lookup.
pub trait Executor: Send + Sync {
    /// Run a command, capturing its output. A non-zero exit is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be started, times out, or the
    /// run is cancelled while it executes.
    fn run(&self, cmd: &CommandLine) -> Result<ExecResult, ExecError>;

    /// Locate `program`, searching `search_paths` before `PATH`.
    fn which(&self, program: &str, search_paths: &[PathBuf]) -> Option<PathBuf>;
}

/// Production [`Executor`] that spawns real processes.
#[derive(Debug, Clone)]
pub struct SystemExecutor {
    timeout: Duration,
    cancel: CancelToken,
}

impl SystemExecutor {
    /// Create an executor that kills children after `timeout` or on cancellation.
    #[must_use]
    pub const fn new(timeout: Duration, cancel: CancelToken) -> Self {
        Self { timeout, cancel }
    }
}

impl Executor for SystemExecutor {
    fn run(&self, cmd: &CommandLine) -> Result<ExecResult, ExecError> {
        let program = cmd.program.clone();
        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &cmd.dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| ExecError::Spawn {
            program: program.clone(),
            source,
        })?;

        // Drain pipes on separate threads so a chatty child cannot block on a
        // full pipe while we poll for its exit.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let out_reader = std::thread::spawn(move || read_pipe(stdout));
        let err_reader = std::thread::spawn(move || read_pipe(stderr));

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(source) => {
                    abandon(&mut child, [out_reader, err_reader]);
                    return Err(ExecError::Wait { program, source });
                }
            }
            if self.cancel.is_cancelled() {
                abandon(&mut child, [out_reader, err_reader]);
                return Err(ExecError::Cancelled);
            }
            if Instant::now() >= deadline {
                abandon(&mut child, [out_reader, err_reader]);
                return Err(ExecError::TimedOut {
                    program,
                    timeout: self.timeout,
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        let stdout = out_reader.join().unwrap_or_default();
        let stderr = err_reader.join().unwrap_or_default();
        Ok(ExecResult {
            stdout: String::from_utf8_lossy(&stdout).to_string(),
            stderr: String::from_utf8_lossy(&stderr).to_string(),
            success: status.success(),
            code: status.code(),
        })
    }

    fn which(&self, program: &str, search_paths: &[PathBuf]) -> Option<PathBuf> {
        if !search_paths.is_empty()
            && let Ok(joined) = std::env::join_paths(search_paths)
            && let Ok(cwd) = std::env::current_dir()
            && let Ok(found) = which::which_in(program, Some(joined), cwd)
        {
            return Some(found);
        }
        which::which(program).ok()
    }
}

fn read_pipe<R: Read>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).ok();
    }
    buf
}
