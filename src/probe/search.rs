//! Header, library, program and file lookups.
//!
//! Headers and libraries are searched on disk first; when that fails a
//! compile (or link) test lets the compiler's own default search paths
//! have the final word.
use std::path::Path;

use super::{ProbeEnv, Probed, compile};
use crate::config::checks::Lang;
use crate::context::Context;
use crate::error::ProbeError;

/// Look for `header` under the include search paths.
///
/// # Errors
///
/// Returns an error if the fallback compile test faults.
pub fn header(env: &ProbeEnv<'_>, id: &str, header: &str) -> Result<Probed, ProbeError> {
    if let Some(path) = env.ctx.fs_ops.find_file(&env.ctx.include_paths, header) {
        return Ok(Probed::found_at(id, format!("<{header}>"), path));
    }
    let code = format!("#include <{header}>\nint main(void) {{ return 0; }}\n");
    match compile::try_build(env, id, Lang::C, &code, &[], false)? {
        Some(Ok(())) => Ok(Probed::found(id, format!("<{header}>"))),
        Some(Err(_)) | None => Ok(Probed::missing(id, format!("<{header}> not found"))),
    }
}

/// Look for library `name` under the library search paths, then try to
/// link against it.
///
/// # Errors
///
/// Returns an error if the fallback link test faults.
pub fn library(env: &ProbeEnv<'_>, id: &str, name: &str) -> Result<Probed, ProbeError> {
    let link_flag = if env.toolchain.is_msvc() {
        format!("{name}.lib")
    } else {
        format!("-l{name}")
    };
    for file_name in env.ctx.platform.library_file_names(name) {
        if let Some(path) = env.ctx.fs_ops.find_file(&env.ctx.library_paths, &file_name) {
            return Ok(Probed::found_at(id, link_flag, path));
        }
    }
    let code = "int main(void) { return 0; }\n";
    match compile::try_build(env, id, Lang::C, code, std::slice::from_ref(&link_flag), true)? {
        Some(Ok(())) => Ok(Probed::found(id, link_flag)),
        Some(Err(_)) | None => Ok(Probed::missing(id, format!("library '{name}' not found"))),
    }
}

/// Look for `program` on the tool search paths, then `PATH`.
#[must_use]
pub fn program(ctx: &Context, id: &str, program: &str) -> Probed {
    ctx.executor
        .which(program, &ctx.tool_paths)
        .map_or_else(
            || Probed::missing(id, format!("{program} not found")),
            |path| Probed::found_at(id, program, path),
        )
}

/// Test that `path` exists, relative to the project root unless absolute.
#[must_use]
pub fn file(ctx: &Context, id: &str, path: &Path) -> Probed {
    let full = if path.is_absolute() {
        path.to_path_buf()
    } else {
        ctx.root.join(path)
    };
    let shown = path.display().to_string();
    if ctx.fs_ops.exists(&full) {
        Probed::found(id, shown)
    } else {
        Probed::missing(id, format!("{shown} not found"))
    }
}
