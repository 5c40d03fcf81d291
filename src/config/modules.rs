//! Buildable module declarations (`conf/modules.toml`).
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::toml_loader::load_config;
use crate::error::ManifestError;

/// One declared module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSpec {
    /// Unique module name.
    pub name: String,
    /// Feature keys that must all be enabled.
    #[serde(default)]
    pub requires: Vec<String>,
    /// Modules that must all be included.
    #[serde(default)]
    pub depends: Vec<String>,
}

impl ModuleSpec {
    /// Build a module programmatically.
    #[must_use]
    pub fn new<R, D>(name: impl Into<String>, requires: R, depends: D) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            name: name.into(),
            requires: requires.into_iter().map(Into::into).collect(),
            depends: depends.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModulesFile {
    module: Vec<ModuleSpec>,
}

/// Load modules from `path` in declaration order.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load(path: &Path) -> Result<Vec<ModuleSpec>, ManifestError> {
    let file: ModulesFile = load_config(path)?;
    Ok(file.module)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn load_modules_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modules.toml");
        std::fs::write(
            &path,
            concat!(
                "[[module]]\nname = \"core\"\n\n",
                "[[module]]\nname = \"realtime-sim\"\nrequires = [\"RealTime\"]\n",
                "depends = [\"core\"]\n",
            ),
        )
        .unwrap();
        let modules = load(&path).unwrap();
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[1], ModuleSpec::new("realtime-sim", ["RealTime"], ["core"]));
        assert!(modules[0].requires.is_empty());
    }

    #[test]
    fn missing_file_has_no_modules() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("modules.toml")).unwrap().is_empty());
    }
}
