//! The immutable outcome of one resolution run and its building blocks.
//!
//! A [`ResolvedConfig`] is constructed once by the engine, persisted by the
//! cache store and handed to every consumer as `Arc<ResolvedConfig>`.
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::platform::Platform;

/// Result of a single environment check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Id of the check that produced this result.
    pub check_id: String,
    /// Whether the check passed.
    pub outcome: bool,
    /// Path, version, flags or failure detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ProbeResult {
    /// A passing result.
    #[must_use]
    pub fn found(check_id: &str, detail: impl Into<String>) -> Self {
        Self {
            check_id: check_id.to_string(),
            outcome: true,
            detail: Some(detail.into()),
        }
    }

    /// A failing result with an explanation.
    #[must_use]
    pub fn missing(check_id: &str, detail: impl Into<String>) -> Self {
        Self {
            check_id: check_id.to_string(),
            outcome: false,
            detail: Some(detail.into()),
        }
    }
}

/// Enabled/disabled state of a feature.
///
/// The payload only exists on the enabled variant, so a disabled feature
/// can never carry stale link flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum FeatureState {
    /// The feature is on.
    Enabled {
        /// Non-boolean payload such as link flags.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<String>,
        /// Whether an explicit user override turned it on.
        via_override: bool,
    },
    /// The feature is off.
    Disabled {
        /// Why the feature is off.
        reason: String,
    },
}

/// Decision for one declared feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDecision {
    /// Feature key.
    pub key: String,
    /// Human-readable name.
    pub display_name: String,
    /// Preprocessor symbol defined when enabled.
    pub define: String,
    /// Resolved state.
    #[serde(flatten)]
    pub state: FeatureState,
}

impl FeatureDecision {
    /// Whether the feature is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        matches!(self.state, FeatureState::Enabled { .. })
    }

    /// The payload, if the feature is enabled and has one.
    #[must_use]
    pub fn payload(&self) -> Option<&str> {
        match &self.state {
            FeatureState::Enabled { payload, .. } => payload.as_deref(),
            FeatureState::Disabled { .. } => None,
        }
    }

    /// The single reason string shown in reports.
    #[must_use]
    pub fn reason(&self) -> &str {
        match &self.state {
            FeatureState::Enabled {
                via_override: true,
                ..
            } => "explicitly enabled by override",
            FeatureState::Enabled { .. } => "all dependencies satisfied",
            FeatureState::Disabled { reason } => reason,
        }
    }
}

/// Inclusion state of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ModuleStatus {
    /// The module will be built.
    Included,
    /// The module will not be built.
    Excluded {
        /// Why the module is not built.
        reason: String,
    },
}

/// Resolution outcome for one declared module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedModule {
    /// Module name.
    pub name: String,
    /// Inclusion state.
    #[serde(flatten)]
    pub status: ModuleStatus,
}

impl ResolvedModule {
    /// Whether the module is included.
    #[must_use]
    pub const fn is_included(&self) -> bool {
        matches!(self.status, ModuleStatus::Included)
    }

    /// The exclusion reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match &self.status {
            ModuleStatus::Included => None,
            ModuleStatus::Excluded { reason } => Some(reason),
        }
    }
}

/// Family and version of a detected compiler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompilerId {
    /// `gcc`, `clang`, `msvc`, or the executable's base name.
    pub family: String,
    /// Dotted version, e.g. `13.2.0`.
    pub version: String,
}

impl CompilerId {
    /// Whether the compiler takes MSVC-style flags.
    #[must_use]
    pub fn is_msvc(&self) -> bool {
        self.family == "msvc"
    }
}

impl fmt::Display for CompilerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.family, self.version)
    }
}

/// Host-independent identity of the toolchain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolchainId {
    /// C compiler, if one was found.
    pub cc: Option<CompilerId>,
    /// C++ compiler, if one was found.
    pub cxx: Option<CompilerId>,
}

/// Build profile selecting optimisation flags, defines and artifact suffix.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BuildProfile {
    /// Unoptimised with full debug info.
    #[default]
    Debug,
    /// Optimised, assertions off.
    Release,
    /// Optimised for the build machine.
    Optimized,
}

impl BuildProfile {
    /// Compiler flags implied by the profile.
    #[must_use]
    pub fn compile_flags(self, msvc: bool) -> Vec<String> {
        let flags: &[&str] = match (self, msvc) {
            (Self::Debug, false) => &["-O0", "-ggdb", "-g3"],
            (Self::Release, false) => &["-O3"],
            (Self::Optimized, false) => &["-O3", "-march=native", "-mtune=native"],
            (Self::Debug, true) => &["/Od", "/Zi"],
            (Self::Release | Self::Optimized, true) => &["/O2"],
        };
        flags.iter().map(ToString::to_string).collect()
    }

    /// Preprocessor defines implied by the profile.
    #[must_use]
    pub fn defines(self) -> Vec<String> {
        match self {
            Self::Debug => vec!["_DEBUG".to_string()],
            Self::Release | Self::Optimized => vec!["NDEBUG".to_string()],
        }
    }

    /// Suffix appended to built library names.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Debug => "-debug",
            Self::Release => "",
            Self::Optimized => "-optimized",
        }
    }
}

impl fmt::Display for BuildProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Release => write!(f, "release"),
            Self::Optimized => write!(f, "optimized"),
        }
    }
}

/// Final compiler and linker flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    /// C compiler flags (profile first, then user flags).
    pub cflags: Vec<String>,
    /// C++ compiler flags (profile first, then user flags).
    pub cxxflags: Vec<String>,
    /// Linker flags.
    pub ldflags: Vec<String>,
}

/// Immutable snapshot of one resolution run; the unit of caching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    /// Fingerprint of every input that produced this snapshot.
    pub fingerprint: String,
    /// Project name.
    pub app: String,
    /// Project version.
    pub version: String,
    /// Target platform.
    pub platform: Platform,
    /// Build profile.
    pub profile: BuildProfile,
    /// Compiler identities.
    pub toolchain: ToolchainId,
    /// Compiler and linker flags.
    pub flags: Flags,
    /// One result per distinct check.
    pub probe_results: BTreeMap<String, ProbeResult>,
    /// Symbol defined by each check that declares one.
    pub check_defines: BTreeMap<String, String>,
    /// One decision per declared feature.
    pub feature_decisions: BTreeMap<String, FeatureDecision>,
    /// Feature keys in declaration order.
    pub feature_order: Vec<String>,
    /// Included modules in build order, then excluded modules by name.
    pub module_order: Vec<ResolvedModule>,
    /// Module names in declaration order.
    pub module_declaration: Vec<String>,
    /// Host-specific absolute paths (install dirs, compilers, tools).
    pub derived_paths: BTreeMap<String, String>,
    /// Command templates for the downstream build orchestrator.
    pub tool_invocations: BTreeMap<String, String>,
}

impl ResolvedConfig {
    /// Decision for feature `key`.
    #[must_use]
    pub fn feature(&self, key: &str) -> Option<&FeatureDecision> {
        self.feature_decisions.get(key)
    }

    /// Resolution outcome for module `name`.
    #[must_use]
    pub fn module(&self, name: &str) -> Option<&ResolvedModule> {
        self.module_order.iter().find(|m| m.name == name)
    }

    /// Feature decisions in declaration order.
    pub fn features_in_order(&self) -> impl Iterator<Item = &FeatureDecision> {
        self.feature_order
            .iter()
            .filter_map(|k| self.feature_decisions.get(k))
    }

    /// Modules in declaration order.
    pub fn modules_in_declaration_order(&self) -> impl Iterator<Item = &ResolvedModule> {
        self.module_declaration
            .iter()
            .filter_map(|name| self.module(name))
    }

    /// Names of included modules in build order.
    #[must_use]
    pub fn included_modules(&self) -> Vec<&str> {
        self.module_order
            .iter()
            .filter(|m| m.is_included())
            .map(|m| m.name.as_str())
            .collect()
    }

    /// Names of excluded modules, sorted.
    #[must_use]
    pub fn excluded_modules(&self) -> Vec<&str> {
        self.module_order
            .iter()
            .filter(|m| !m.is_included())
            .map(|m| m.name.as_str())
            .collect()
    }

    /// Every preprocessor define: profile defines, passing check defines
    /// (`SYMBOL=1`, by check id), then enabled feature defines in
    /// declaration order.
    #[must_use]
    pub fn defines(&self) -> Vec<String> {
        let mut defines = self.profile.defines();
        defines.extend(
            self.probe_results
                .values()
                .filter(|r| r.outcome)
                .filter_map(|r| self.check_defines.get(&r.check_id))
                .map(|symbol| format!("{symbol}=1")),
        );
        defines.extend(
            self.features_in_order()
                .filter(|d| d.is_enabled())
                .map(|d| d.define.clone()),
        );
        defines
    }
}
