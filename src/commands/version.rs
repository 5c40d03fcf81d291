//! Command: print version information.
use anyhow::Result;

/// Version string, preferring the one stamped at build time.
#[must_use]
pub fn version() -> &'static str {
    option_env!("BUILDCONF_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the version to stdout.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn run() -> Result<()> {
    super::write_stdout(&format!("buildconf {}\n", version()))
}
