//! Command: print the report of the last configuration.
use std::path::Path;

use anyhow::{Context as _, Result};

use super::write_stdout;
use crate::cache::CacheStore;
use crate::cli::GlobalOpts;
use crate::emit::{self, Format};
use crate::resolved::ResolvedConfig;

/// Run the `status` command.
///
/// # Errors
///
/// Returns an error if no configuration has been persisted yet.
pub fn run(global: &GlobalOpts) -> Result<()> {
    let build_dir = super::resolve_build_dir(global)?;
    let config = last_configuration(&build_dir)?;
    write_stdout(&emit::emit(&config, Format::Report))
}

/// The most recently persisted snapshot under `build_dir`.
///
/// # Errors
///
/// Returns an error if there is none, or it is unreadable.
pub fn last_configuration(build_dir: &Path) -> Result<ResolvedConfig> {
    CacheStore::new(build_dir).load_latest().with_context(|| {
        format!(
            "not configured: no usable configuration in {}; run `buildconf configure` first",
            build_dir.display()
        )
    })
}
