//! Command: render the last configuration in one format.
use anyhow::{Context as _, Result};

use super::status::last_configuration;
use super::write_stdout;
use crate::cli::{EmitOpts, GlobalOpts};
use crate::emit::{self, artifact::Artifact, artifact::ArtifactChange};
use crate::logging::Logger;

/// Run the `emit` command.
///
/// # Errors
///
/// Returns an error if nothing is configured or the output cannot be written.
pub fn run(global: &GlobalOpts, opts: &EmitOpts, log: &Logger) -> Result<()> {
    let build_dir = super::resolve_build_dir(global)?;
    let config = last_configuration(&build_dir)?;
    let rendered = emit::emit(&config, opts.format);

    let Some(path) = &opts.output else {
        return write_stdout(&rendered);
    };
    let artifact = Artifact::new(path.clone(), rendered);
    match artifact
        .apply()
        .with_context(|| format!("writing {}", path.display()))?
    {
        ArtifactChange::Written => log.info(&format!("wrote {}", path.display())),
        ArtifactChange::Unchanged => log.info(&format!("{} is up to date", path.display())),
    }
    Ok(())
}
