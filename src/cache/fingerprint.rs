//! Input fingerprinting and the host environment signature.
//!
//! The fingerprint governs cache *reuse*: it covers every input that can
//! change a resolution outcome and nothing host-specific, so identical
//! inputs on two machines produce the same value. Host facts (absolute
//! compiler paths, the build directory, which search directories exist)
//! go into the separate [`environment_signature`].
use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::platform::Platform;
use crate::resolved::{BuildProfile, ToolchainId};

/// Version of the cache record layout; bump on incompatible changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Lowercase hex SHA-256 of the JSON serialization of `value`.
///
/// Callers must only hash types with deterministic serialization
/// (`BTreeMap`, `Vec`, plain structs), never `HashMap`.
///
/// # Errors
///
/// Returns an error if `value` cannot be serialized.
pub fn sha256_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let serialized = serde_json::to_vec(value)?;
    let mut hasher = Sha256::new();
    hasher.update(&serialized);
    Ok(format!("{:x}", hasher.finalize()))
}

/// The explicit module request, as given by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRequest {
    /// `None` requests every declared module.
    pub only: Option<Vec<String>>,
    /// Modules explicitly left out.
    pub exclude: Vec<String>,
}

impl ModuleRequest {
    /// The same request with both lists sorted and deduplicated.
    #[must_use]
    pub fn normalized(&self) -> Self {
        fn canonical(names: &[String]) -> Vec<String> {
            let mut names = names.to_vec();
            names.sort_unstable();
            names.dedup();
            names
        }
        Self {
            only: self.only.as_deref().map(canonical),
            exclude: canonical(&self.exclude),
        }
    }
}

/// Every input that determines a resolution outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FingerprintInputs {
    /// Cache record schema version.
    pub schema: u32,
    /// Compiler families and versions.
    pub toolchain: ToolchainId,
    /// Build profile.
    pub profile: BuildProfile,
    /// Installation prefix.
    pub prefix: String,
    /// Target platform.
    pub platform: Platform,
    /// User-supplied header search directories.
    pub include_paths: Vec<String>,
    /// User-supplied library search directories.
    pub library_paths: Vec<String>,
    /// User-supplied program search directories.
    pub tool_paths: Vec<String>,
    /// Explicitly requested C compiler.
    pub requested_cc: Option<String>,
    /// Explicitly requested C++ compiler.
    pub requested_cxx: Option<String>,
    /// Extra C flags.
    pub cflags: Vec<String>,
    /// Extra C++ flags.
    pub cxxflags: Vec<String>,
    /// Extra linker flags.
    pub ldflags: Vec<String>,
    /// Feature overrides (`true` = enable).
    pub overrides: BTreeMap<String, bool>,
    /// Module request.
    pub module_request: ModuleRequest,
    /// Digest of the declared checks, features and modules.
    pub manifest_digest: String,
}

/// Compute the fingerprint of `inputs`.
///
/// # Errors
///
/// Returns an error if `inputs` cannot be serialized.
pub fn fingerprint(inputs: &FingerprintInputs) -> Result<String, serde_json::Error> {
    sha256_json(inputs)
}

/// Host-specific facts that invalidate a cache without being inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentFacts {
    /// Absolute C compiler path.
    pub cc_path: Option<String>,
    /// Absolute C++ compiler path.
    pub cxx_path: Option<String>,
    /// Absolute build directory.
    pub build_dir: String,
    /// Each search directory and whether it exists.
    pub search_paths: Vec<(String, bool)>,
}

impl EnvironmentFacts {
    /// Gather facts, testing each search directory with `exists`.
    pub fn gather<'a>(
        cc_path: Option<&Path>,
        cxx_path: Option<&Path>,
        build_dir: &Path,
        search_paths: impl IntoIterator<Item = &'a Path>,
        exists: impl Fn(&Path) -> bool,
    ) -> Self {
        Self {
            cc_path: cc_path.map(|p| p.display().to_string()),
            cxx_path: cxx_path.map(|p| p.display().to_string()),
            build_dir: build_dir.display().to_string(),
            search_paths: search_paths
                .into_iter()
                .map(|p| (p.display().to_string(), exists(p)))
                .collect(),
        }
    }
}

/// Compute the environment signature of `facts`.
///
/// # Errors
///
/// Returns an error if `facts` cannot be serialized.
pub fn environment_signature(facts: &EnvironmentFacts) -> Result<String, serde_json::Error> {
    sha256_json(facts)
}
