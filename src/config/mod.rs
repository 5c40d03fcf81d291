//! Project manifest: the declared checks, features and modules under `conf/`.
pub mod checks;
pub mod features;
pub mod modules;
pub mod options;
pub mod project;
pub mod toml_loader;
pub mod validation;

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ManifestError;

/// Directory under the project root holding the manifest files.
pub const CONF_DIR: &str = "conf";

/// All declared configuration for one project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Project root directory.
    pub root: PathBuf,
    /// Project identity.
    pub project: project::Project,
    /// Declared checks, sorted by id, including the implicit compiler checks.
    pub checks: Vec<checks::CheckSpec>,
    /// Declared features in declaration order.
    pub features: Vec<features::FeatureSpec>,
    /// Declared modules in declaration order.
    pub modules: Vec<modules::ModuleSpec>,
}

/// The parts of a [`Manifest`] that define the declared graph version.
#[derive(Serialize)]
struct GraphDigest<'a> {
    project: &'a project::Project,
    checks: &'a [checks::CheckSpec],
    features: &'a [features::FeatureSpec],
    modules: &'a [modules::ModuleSpec],
}

impl Manifest {
    /// Load every manifest file from `<root>/conf/`.
    ///
    /// Missing files are treated as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if any file exists but cannot be read or parsed.
    pub fn load(root: &Path) -> Result<Self, ManifestError> {
        let conf = root.join(CONF_DIR);
        Ok(Self {
            root: root.to_path_buf(),
            project: project::load(&conf.join("project.toml"))?,
            checks: checks::load(&conf.join("checks.toml"))?,
            features: features::load(&conf.join("features.toml"))?,
            modules: modules::load(&conf.join("modules.toml"))?,
        })
    }

    /// Look up a check by id.
    #[must_use]
    pub fn check(&self, id: &str) -> Option<&checks::CheckSpec> {
        self.checks.iter().find(|c| c.id == id)
    }

    /// Look up a feature by key.
    #[must_use]
    pub fn feature(&self, key: &str) -> Option<&features::FeatureSpec> {
        self.features.iter().find(|f| f.key == key)
    }

    /// Look up a module by name.
    #[must_use]
    pub fn module(&self, name: &str) -> Option<&modules::ModuleSpec> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// SHA-256 over the canonical JSON of the declared graph.
    ///
    /// Comments and formatting in the TOML files do not affect it; any
    /// change to a declaration does. The project root is not included.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn digest(&self) -> Result<String, serde_json::Error> {
        crate::cache::fingerprint::sha256_json(&GraphDigest {
            project: &self.project,
            checks: &self.checks,
            features: &self.features,
            modules: &self.modules,
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::fs;

    fn write_conf(root: &Path, name: &str, content: &str) {
        let conf = root.join(CONF_DIR);
        fs::create_dir_all(&conf).unwrap();
        fs::write(conf.join(name), content).unwrap();
    }

    #[test]
    fn load_empty_root() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = Manifest::load(dir.path()).unwrap();
        assert_eq!(manifest.project, project::Project::default());
        assert_eq!(manifest.checks.len(), 2, "implicit cc/cxx checks");
        assert!(manifest.features.is_empty());
        assert!(manifest.modules.is_empty());
    }

    #[test]
    fn load_full_root() {
        let dir = tempfile::tempdir().unwrap();
        write_conf(dir.path(), "project.toml", "name = \"ns\"\nversion = \"3-dev\"\n");
        write_conf(
            dir.path(),
            "checks.toml",
            "[pthread_header]\nkind = \"header\"\nheader = \"pthread.h\"\n",
        );
        write_conf(
            dir.path(),
            "features.toml",
            "[[feature]]\nkey = \"Threading\"\ndepends = [\"pthread_header\"]\n",
        );
        write_conf(
            dir.path(),
            "modules.toml",
            "[[module]]\nname = \"core\"\nrequires = [\"Threading\"]\n",
        );
        let manifest = Manifest::load(dir.path()).unwrap();
        assert_eq!(manifest.project.name, "ns");
        assert!(manifest.check("pthread_header").is_some());
        assert!(manifest.feature("Threading").is_some());
        assert!(manifest.module("core").is_some());
    }

    #[test]
    fn parse_error_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        write_conf(dir.path(), "features.toml", "[[feature]\n");
        let err = Manifest::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("features.toml"));
    }

    #[test]
    fn digest_ignores_formatting_and_root() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        write_conf(a.path(), "modules.toml", "[[module]]\nname = \"core\"\n");
        write_conf(
            b.path(),
            "modules.toml",
            "# the core module\n[[module]]\nname    = \"core\"\n",
        );
        let da = Manifest::load(a.path()).unwrap().digest().unwrap();
        let db = Manifest::load(b.path()).unwrap().digest().unwrap();
        assert_eq!(da, db);
    }

    #[test]
    fn digest_changes_with_declarations() {
        let dir = tempfile::tempdir().unwrap();
        let before = Manifest::load(dir.path()).unwrap().digest().unwrap();
        write_conf(dir.path(), "modules.toml", "[[module]]\nname = \"core\"\n");
        let after = Manifest::load(dir.path()).unwrap().digest().unwrap();
        assert_ne!(before, after);
    }
}
