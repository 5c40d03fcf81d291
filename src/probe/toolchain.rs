//! C and C++ compiler detection.
use std::path::{Path, PathBuf};

use crate::config::checks::Lang;
use crate::context::Context;
use crate::error::{ConfigureError, EnvironmentError};
use crate::exec::CommandLine;
use crate::resolved::{CompilerId, ToolchainId};

/// A compiler that was found and identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedCompiler {
    /// Family and version.
    pub id: CompilerId,
    /// Absolute path of the executable.
    pub path: PathBuf,
}

impl DetectedCompiler {
    /// The executable as a command-line program.
    #[must_use]
    pub fn program(&self) -> String {
        self.path.display().to_string()
    }
}

/// The detected C and C++ compilers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Toolchain {
    /// C compiler.
    pub cc: Option<DetectedCompiler>,
    /// C++ compiler.
    pub cxx: Option<DetectedCompiler>,
}

impl Toolchain {
    /// Host-independent identity for fingerprinting.
    #[must_use]
    pub fn id(&self) -> ToolchainId {
        ToolchainId {
            cc: self.cc.as_ref().map(|c| c.id.clone()),
            cxx: self.cxx.as_ref().map(|c| c.id.clone()),
        }
    }

    /// The compiler for `lang`.
    #[must_use]
    pub const fn compiler(&self, lang: Lang) -> Option<&DetectedCompiler> {
        match lang {
            Lang::C => self.cc.as_ref(),
            Lang::Cxx => self.cxx.as_ref(),
        }
    }

    /// The compiler for `lang`, or the other one if `lang` has none.
    ///
    /// A C++ compiler accepts C probes and a C driver can compile a header
    /// check, so either serves for existence tests.
    #[must_use]
    pub fn any_compiler(&self, lang: Lang) -> Option<&DetectedCompiler> {
        self.compiler(lang).or_else(|| self.cc.as_ref().or(self.cxx.as_ref()))
    }

    /// Whether the toolchain takes MSVC-style flags.
    #[must_use]
    pub fn is_msvc(&self) -> bool {
        self.cc
            .as_ref()
            .or(self.cxx.as_ref())
            .is_some_and(|c| c.id.is_msvc())
    }
}

/// Find and identify the C and C++ compilers.
///
/// An explicitly requested compiler replaces the platform candidate list
/// for its language.
///
/// # Errors
///
/// Returns [`EnvironmentError::NoCompiler`] when neither compiler is found,
/// or a probe error if identifying a candidate times out or is cancelled.
pub fn detect(
    ctx: &Context,
    requested_cc: Option<&str>,
    requested_cxx: Option<&str>,
) -> Result<Toolchain, ConfigureError> {
    let cc_candidates: Vec<&str> = requested_cc.map_or_else(
        || ctx.platform.c_compiler_candidates().to_vec(),
        |cc| vec![cc],
    );
    let cxx_candidates: Vec<&str> = requested_cxx.map_or_else(
        || ctx.platform.cxx_compiler_candidates().to_vec(),
        |cxx| vec![cxx],
    );

    let toolchain = Toolchain {
        cc: detect_one(ctx, "cc", &cc_candidates)?,
        cxx: detect_one(ctx, "cxx", &cxx_candidates)?,
    };

    if toolchain.cc.is_none() && toolchain.cxx.is_none() {
        let mut tried = cc_candidates;
        for c in cxx_candidates {
            if !tried.contains(&c) {
                tried.push(c);
            }
        }
        return Err(EnvironmentError::NoCompiler {
            tried: tried.join(", "),
        }
        .into());
    }

    for (label, compiler) in [("C", &toolchain.cc), ("C++", &toolchain.cxx)] {
        match compiler {
            Some(c) => ctx
                .log
                .info(&format!("{label} compiler: {} ({})", c.id, c.path.display())),
            None => ctx.log.warn(&format!("no {label} compiler found")),
        }
    }
    Ok(toolchain)
}

fn detect_one(
    ctx: &Context,
    check: &str,
    candidates: &[&str],
) -> Result<Option<DetectedCompiler>, ConfigureError> {
    for candidate in candidates {
        let Some(path) = ctx.executor.which(candidate, &ctx.tool_paths) else {
            ctx.log.debug(&format!("compiler candidate {candidate}: not found"));
            continue;
        };
        let program = path.display().to_string();
        // cl prints its banner when run without arguments and rejects --version
        let cmd = if is_cl(&path) {
            CommandLine::new(&program)
        } else {
            CommandLine::new(&program).args(["--version"])
        };
        let Some(result) = super::run(ctx, check, &cmd)? else {
            continue;
        };
        let text = format!("{}\n{}", result.stdout, result.stderr);
        let Some(version) = parse_version(&text) else {
            ctx.log
                .debug(&format!("compiler candidate {candidate}: no version in output"));
            continue;
        };
        return Ok(Some(DetectedCompiler {
            id: CompilerId {
                family: classify(&path, &text),
                version,
            },
            path,
        }));
    }
    Ok(None)
}

fn is_cl(path: &Path) -> bool {
    path.file_stem()
        .is_some_and(|s| s.eq_ignore_ascii_case("cl"))
}

/// Extract the first dotted version number from `--version` output.
#[must_use]
pub fn parse_version(text: &str) -> Option<String> {
    text.split_whitespace()
        .map(|token| token.trim_start_matches('('))
        .find(|token| token.starts_with(|c: char| c.is_ascii_digit()) && token.contains('.'))
        .map(|token| {
            token
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .collect::<String>()
                .trim_end_matches('.')
                .to_string()
        })
}

/// Compiler family from the executable name and its banner.
#[must_use]
pub fn classify(path: &Path, banner: &str) -> String {
    let lower = banner.to_ascii_lowercase();
    if lower.contains("clang") {
        "clang".to_string()
    } else if is_cl(path) || lower.contains("microsoft") {
        "msvc".to_string()
    } else if lower.contains("gcc") || lower.contains("free software foundation") {
        "gcc".to_string()
    } else {
        path.file_stem()
            .map_or_else(|| "unknown".to_string(), |s| s.to_string_lossy().to_string())
    }
}
