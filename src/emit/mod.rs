//! Rendering a [`ResolvedConfig`] into consumable artifacts.
//!
//! Every renderer is a pure function of the snapshot: the same snapshot
//! always renders to the same bytes.
pub mod artifact;
pub mod defines;
pub mod env;
pub mod header;
pub mod report;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::resolved::ResolvedConfig;
use artifact::{Artifact, ArtifactChange};

/// Directory under the build directory receiving generated files.
pub const OUTPUT_DIR: &str = "buildconf";

/// Artifact format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// `SYMBOL=value` per line.
    Defines,
    /// Generated C header.
    Header,
    /// Operator report.
    Report,
    /// Flat `KEY = value` dump.
    Env,
}

impl Format {
    /// Every format, in the order artifacts are written.
    pub const ALL: [Self; 4] = [Self::Env, Self::Defines, Self::Header, Self::Report];

    /// File name of the artifact under [`OUTPUT_DIR`].
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Defines => "defines.txt",
            Self::Header => "config.h",
            Self::Report => "config-status.txt",
            Self::Env => "config.env",
        }
    }
}

/// Render `config` in `format`.
#[must_use]
pub fn emit(config: &ResolvedConfig, format: Format) -> String {
    match format {
        Format::Defines => defines::render(config),
        Format::Header => header::render(config),
        Format::Report => report::render(config),
        Format::Env => env::render(config),
    }
}

/// Directory receiving the generated files for `build_dir`.
#[must_use]
pub fn output_dir(build_dir: &Path) -> PathBuf {
    build_dir.join(OUTPUT_DIR)
}

/// Write every artifact under `<build_dir>/buildconf/`, leaving files whose
/// contents are unchanged untouched.
///
/// # Errors
///
/// Returns an error if any artifact cannot be written.
pub fn write_artifacts(
    config: &ResolvedConfig,
    build_dir: &Path,
) -> Result<Vec<(PathBuf, ArtifactChange)>> {
    let dir = output_dir(build_dir);
    Format::ALL
        .iter()
        .map(|&format| {
            let artifact = Artifact::new(dir.join(format.file_name()), emit(config, format));
            let change = artifact.apply()?;
            Ok((artifact.path, change))
        })
        .collect()
}
