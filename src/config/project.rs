//! Project identity (`conf/project.toml`).
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::toml_loader::load_config;
use crate::error::ManifestError;

/// Project name and version, emitted as `APPNAME` and `VERSION`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    /// Project name.
    pub name: String,
    /// Project version string.
    pub version: String,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            name: "project".to_string(),
            version: "0.0.0".to_string(),
        }
    }
}

/// Load project identity from `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load(path: &Path) -> Result<Project, ManifestError> {
    load_config(path)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::toml_loader::parse_config;

    #[test]
    fn partial_file_keeps_defaults() {
        let project: Project =
            parse_config(Path::new("project.toml"), "name = \"ns\"\n").unwrap();
        assert_eq!(project.name, "ns");
        assert_eq!(project.version, "0.0.0");
    }
}
