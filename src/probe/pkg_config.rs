//! pkg-config package checks.
//!
//! The detail of a found package is its `--cflags --libs` output, which
//! features can take as their payload.
use super::Probed;
use crate::context::Context;
use crate::error::ProbeError;
use crate::exec::CommandLine;

const PKG_CONFIG: &str = "pkg-config";

/// Check that `package` is installed, optionally at `min_version` or newer.
///
/// # Errors
///
/// Returns an error if pkg-config times out or the run is cancelled.
pub fn package(
    ctx: &Context,
    id: &str,
    package: &str,
    min_version: Option<&str>,
) -> Result<Probed, ProbeError> {
    let Some(pkg_config) = ctx.executor.which(PKG_CONFIG, &ctx.tool_paths) else {
        return Ok(Probed::missing(id, "pkg-config not found"));
    };
    let program = pkg_config.display().to_string();

    let exists = CommandLine::new(&program).args(["--exists", package]);
    if !super::run(ctx, id, &exists)?.is_some_and(|r| r.success) {
        return Ok(Probed::missing(id, format!("package '{package}' not found")));
    }

    if let Some(min) = min_version {
        let atleast = CommandLine::new(&program).args([format!("--atleast-version={min}"), package.to_string()]);
        if !super::run(ctx, id, &atleast)?.is_some_and(|r| r.success) {
            let installed = super::run(
                ctx,
                id,
                &CommandLine::new(&program).args(["--modversion", package]),
            )?
            .filter(|r| r.success)
            .map(|r| r.stdout.trim().to_string())
            .filter(|v| !v.is_empty());
            let detail = match installed {
                Some(v) => format!("package '{package}' {v} is older than {min}"),
                None => format!("package '{package}' older than {min}"),
            };
            return Ok(Probed::missing(id, detail));
        }
    }

    let flags = CommandLine::new(&program).args(["--cflags", "--libs", package]);
    match super::run(ctx, id, &flags)? {
        Some(r) if r.success => {
            let detail = r.stdout.split_whitespace().collect::<Vec<_>>().join(" ");
            Ok(Probed::found(id, detail))
        }
        Some(r) => Ok(Probed::missing(
            id,
            super::first_line(&r)
                .unwrap_or_else(|| format!("cannot query flags of package '{package}'")),
        )),
        None => Ok(Probed::missing(id, "pkg-config not found")),
    }
}
