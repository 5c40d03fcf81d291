//! Compile and link tests in a scratch directory.
use std::fs;

use super::{ProbeEnv, Probed};
use crate::config::checks::Lang;
use crate::error::ProbeError;
use crate::exec::CommandLine;

/// Run a declared compile check.
///
/// # Errors
///
/// Returns an error if the scratch directory or source cannot be created,
/// or the compiler times out or is cancelled.
pub fn snippet(
    env: &ProbeEnv<'_>,
    id: &str,
    lang: Lang,
    code: &str,
    flags: &[String],
    link: bool,
) -> Result<Probed, ProbeError> {
    let what = if link { "links" } else { "compiles" };
    Ok(match try_build(env, id, lang, code, flags, link)? {
        Some(Ok(())) => Probed::found(id, what),
        Some(Err(reason)) => Probed::missing(id, reason),
        None => Probed::missing(id, format!("no {lang} compiler")),
    })
}

/// Compile (or link) `code` with the compiler for `lang`.
///
/// Returns `None` when no compiler is available or it cannot be started,
/// `Some(Err(first diagnostic line))` when the build fails.
///
/// `extra` holds check flags when compiling and libraries when linking;
/// libraries follow the source file on the command line.
///
/// # Errors
///
/// Returns an error if the scratch directory or source cannot be created,
/// or the compiler times out or is cancelled.
pub(crate) fn try_build(
    env: &ProbeEnv<'_>,
    id: &str,
    lang: Lang,
    code: &str,
    extra: &[String],
    link: bool,
) -> Result<Option<Result<(), String>>, ProbeError> {
    let Some(compiler) = env.toolchain.any_compiler(lang) else {
        return Ok(None);
    };

    let scratch = tempfile::Builder::new()
        .prefix("buildconf-")
        .tempdir()
        .map_err(|source| ProbeError::TempDir {
            check: id.to_string(),
            source,
        })?;
    let src_name = format!("probe.{}", lang.extension());
    let src = scratch.path().join(&src_name);
    fs::write(&src, code).map_err(|source| ProbeError::WriteSource {
        check: id.to_string(),
        path: src.clone(),
        source,
    })?;

    let lang_flags = match lang {
        Lang::C => &env.flags.cflags,
        Lang::Cxx => &env.flags.cxxflags,
    };
    let (flags, libs): (&[String], &[String]) = if link { (&[], extra) } else { (extra, &[]) };

    let mut cmd = CommandLine::new(compiler.program()).current_dir(scratch.path());
    if compiler.id.is_msvc() {
        cmd = cmd.args(["/nologo"]).args(lang_flags.iter().cloned()).args(flags.iter().cloned());
        cmd = if link {
            cmd.args([src_name, "/Fe:probe.exe".to_string()])
                .args(libs.iter().cloned())
                .args(if env.flags.ldflags.is_empty() {
                    Vec::new()
                } else {
                    std::iter::once("/link".to_string())
                        .chain(env.flags.ldflags.iter().cloned())
                        .collect()
                })
        } else {
            cmd.args(["/c".to_string(), src_name, "/Fo:probe.obj".to_string()])
        };
    } else {
        cmd = cmd.args(lang_flags.iter().cloned()).args(flags.iter().cloned());
        cmd = if link {
            cmd.args([src_name, "-o".to_string(), "probe".to_string()])
                .args(libs.iter().cloned())
                .args(env.flags.ldflags.iter().cloned())
        } else {
            cmd.args(["-c".to_string(), src_name, "-o".to_string(), "probe.o".to_string()])
        };
    }

    let Some(result) = super::run(env.ctx, id, &cmd)? else {
        return Ok(None);
    };
    if result.success {
        Ok(Some(Ok(())))
    } else {
        let reason = super::first_line(&result)
            .unwrap_or_else(|| format!("{lang} {} test failed", if link { "link" } else { "compile" }));
        Ok(Some(Err(reason)))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::exec::ExecResult;
    use crate::operations::MockFileSystemOps;
    use crate::probe::test_helpers::{MockExec, gcc_toolchain, linux_context};
    use crate::probe::toolchain::DetectedCompiler;
    use crate::resolved::{CompilerId, Flags};
    use std::path::PathBuf;

    #[test]
    fn compile_only_uses_dash_c_and_flags() {
        let mut exec = MockExec::new();
        exec.expect_run()
            .withf(|cmd| {
                cmd.program == "/usr/bin/gcc"
                    && cmd.has_arg("-c")
                    && cmd.has_arg("-Wall")
                    && cmd.has_arg("-O0")
                    && cmd.has_arg("probe.c")
                    && cmd.dir.is_some()
            })
            .times(1)
            .returning(|_| Ok(ExecResult::ok("")));
        let ctx = linux_context(exec, MockFileSystemOps::new());
        let toolchain = gcc_toolchain();
        let flags = Flags {
            cflags: vec!["-O0".to_string()],
            ..Flags::default()
        };
        let env = ProbeEnv {
            ctx: &ctx,
            toolchain: &toolchain,
            flags: &flags,
        };
        let probed = snippet(&env, "int128", Lang::C, "int x;", &["-Wall".to_string()], false).unwrap();
        assert!(probed.result.outcome);
        assert_eq!(probed.result.detail.as_deref(), Some("compiles"));
    }

    #[test]
    fn link_puts_libraries_after_source() {
        let mut exec = MockExec::new();
        exec.expect_run()
            .withf(|cmd| {
                let src = cmd.args.iter().position(|a| a == "probe.c");
                let lib = cmd.args.iter().position(|a| a == "-lm");
                !cmd.has_arg("-c") && src.is_some() && lib.is_some() && src < lib
            })
            .returning(|_| Ok(ExecResult::ok("")));
        let ctx = linux_context(exec, MockFileSystemOps::new());
        let toolchain = gcc_toolchain();
        let flags = Flags::default();
        let env = ProbeEnv {
            ctx: &ctx,
            toolchain: &toolchain,
            flags: &flags,
        };
        let built = try_build(&env, "libm", Lang::C, "int main(void){return 0;}", &["-lm".to_string()], true).unwrap();
        assert_eq!(built, Some(Ok(())));
    }

    #[test]
    fn failure_detail_is_first_diagnostic() {
        let mut exec = MockExec::new();
        exec.expect_run().returning(|_| {
            Ok(ExecResult::failed(
                "probe.cpp:1:1: error: '__int128' was not declared\n1 error generated.\n",
            ))
        });
        let ctx = linux_context(exec, MockFileSystemOps::new());
        let toolchain = gcc_toolchain();
        let flags = Flags::default();
        let env = ProbeEnv {
            ctx: &ctx,
            toolchain: &toolchain,
            flags: &flags,
        };
        let probed = snippet(&env, "int128", Lang::Cxx, "__int128 x;", &[], false).unwrap();
        assert!(!probed.result.outcome);
        assert_eq!(
            probed.result.detail.as_deref(),
            Some("probe.cpp:1:1: error: '__int128' was not declared")
        );
    }

    #[test]
    fn msvc_uses_nologo_and_fe() {
        let mut exec = MockExec::new();
        exec.expect_run()
            .withf(|cmd| cmd.has_arg("/nologo") && cmd.has_arg("/Fe:probe.exe") && cmd.has_arg("ws2_32.lib"))
            .returning(|_| Ok(ExecResult::ok("")));
        let ctx = linux_context(exec, MockFileSystemOps::new());
        let toolchain = crate::probe::toolchain::Toolchain {
            cc: Some(DetectedCompiler {
                id: CompilerId {
                    family: "msvc".to_string(),
                    version: "19.38".to_string(),
                },
                path: PathBuf::from("C:/VS/bin/cl.exe"),
            }),
            cxx: None,
        };
        let flags = Flags::default();
        let env = ProbeEnv {
            ctx: &ctx,
            toolchain: &toolchain,
            flags: &flags,
        };
        let built = try_build(&env, "ws2", Lang::C, "int main(void){return 0;}", &["ws2_32.lib".to_string()], true).unwrap();
        assert_eq!(built, Some(Ok(())));
    }

    #[test]
    fn no_compiler_is_negative() {
        let ctx = linux_context(MockExec::new(), MockFileSystemOps::new());
        let toolchain = crate::probe::toolchain::Toolchain::default();
        let flags = Flags::default();
        let env = ProbeEnv {
            ctx: &ctx,
            toolchain: &toolchain,
            flags: &flags,
        };
        let probed = snippet(&env, "x", Lang::C, "int x;", &[], false).unwrap();
        assert_eq!(probed.result.detail.as_deref(), Some("no C compiler"));
    }
}
