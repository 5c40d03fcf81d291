//! Command: remove the cache and generated files.
use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cache::CacheStore;
use crate::cli::GlobalOpts;
use crate::emit;
use crate::logging::Logger;

/// Run the `clean` command.
///
/// # Errors
///
/// Returns an error if an existing directory cannot be removed.
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<()> {
    let build_dir = super::resolve_build_dir(global)?;
    log.stage("Cleaning");
    if clean(&build_dir)? {
        log.info(&format!("removed configuration from {}", build_dir.display()));
    } else {
        log.info("nothing to clean");
    }
    Ok(())
}

/// Remove the cache and the artifact directory; `false` if neither existed.
///
/// # Errors
///
/// Returns an error if an existing directory cannot be removed.
pub fn clean(build_dir: &Path) -> Result<bool> {
    let store = CacheStore::new(build_dir);
    let cache = store
        .clear()
        .with_context(|| format!("removing cache in {}", build_dir.display()))?;

    let out = emit::output_dir(build_dir);
    let artifacts = match fs::remove_dir_all(&out) {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => return Err(e).with_context(|| format!("removing {}", out.display())),
    };
    Ok(cache || artifacts)
}
