//! Manifest validation.
//!
//! Two tiers: [`check_authoring`] rejects manifests whose graph cannot be
//! resolved at all (duplicates, undeclared references, cycles), while the
//! [`ConfigValidator`] implementations report non-fatal
//! [`ValidationWarning`]s that are only logged.
use std::collections::HashSet;

use super::Manifest;
use crate::error::AuthoringError;
use crate::graph::DependencyGraph;

/// A validation warning detected during manifest loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The manifest file (e.g., "checks.toml", "features.toml").
    pub source: String,
    /// The specific item that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    /// Create a warning.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        item: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            item: item.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.source, self.item, self.message)
    }
}

/// Trait for non-fatal manifest validators.
pub trait ConfigValidator {
    /// Validate the manifest and return any warnings found.
    fn validate(&self, manifest: &Manifest) -> Vec<ValidationWarning>;

    /// Return a human-readable name for this validator.
    fn name(&self) -> &'static str;
}

/// Warns about checks that nothing consumes.
#[derive(Debug, Default)]
pub struct CheckValidator;

impl ConfigValidator for CheckValidator {
    fn validate(&self, manifest: &Manifest) -> Vec<ValidationWarning> {
        let referenced: HashSet<&str> = manifest
            .features
            .iter()
            .flat_map(|f| f.depends.iter().chain(f.payload_from.iter()))
            .map(String::as_str)
            .collect();

        manifest
            .checks
            .iter()
            .filter(|c| c.define.is_none() && !c.hard && !referenced.contains(c.id.as_str()))
            .map(|c| {
                ValidationWarning::new(
                    "checks.toml",
                    &c.id,
                    "check is not referenced by any feature and defines nothing",
                )
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "checks"
    }
}

/// Warns about suspicious feature declarations.
#[derive(Debug, Default)]
pub struct FeatureValidator;

impl ConfigValidator for FeatureValidator {
    fn validate(&self, manifest: &Manifest) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        for feature in &manifest.features {
            if let Some(source) = &feature.payload_from
                && !feature.depends.contains(source)
            {
                warnings.push(ValidationWarning::new(
                    "features.toml",
                    &feature.key,
                    format!("payload source '{source}' is not listed in depends"),
                ));
            }
            if feature.payload_from.is_some() && feature.payload.is_some() {
                warnings.push(ValidationWarning::new(
                    "features.toml",
                    &feature.key,
                    "static payload is only used when the payload check has no detail",
                ));
            }
            let mut seen = HashSet::new();
            for dep in &feature.depends {
                if !seen.insert(dep) {
                    warnings.push(ValidationWarning::new(
                        "features.toml",
                        &feature.key,
                        format!("dependency '{dep}' is listed more than once"),
                    ));
                }
            }
        }
        warnings
    }

    fn name(&self) -> &'static str {
        "features"
    }
}

/// Warns about modules that are off unless the user opts in.
#[derive(Debug, Default)]
pub struct ModuleValidator;

impl ConfigValidator for ModuleValidator {
    fn validate(&self, manifest: &Manifest) -> Vec<ValidationWarning> {
        let opt_in: HashSet<&str> = manifest
            .features
            .iter()
            .filter(|f| f.opt_in)
            .map(|f| f.key.as_str())
            .collect();
        manifest
            .modules
            .iter()
            .flat_map(|m| {
                m.requires
                    .iter()
                    .filter(|f| opt_in.contains(f.as_str()))
                    .map(|f| {
                        ValidationWarning::new(
                            "modules.toml",
                            &m.name,
                            format!("excluded by default: requires opt-in feature '{f}'"),
                        )
                    })
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "modules"
    }
}

/// Run every [`ConfigValidator`] and collect the warnings.
#[must_use]
pub fn collect_warnings(manifest: &Manifest) -> Vec<ValidationWarning> {
    let validators: [&dyn ConfigValidator; 3] =
        [&CheckValidator, &FeatureValidator, &ModuleValidator];
    validators
        .iter()
        .flat_map(|v| {
            tracing::debug!("running {} validator", v.name());
            v.validate(manifest)
        })
        .collect()
}

/// Reject manifests whose declared graph is malformed.
///
/// Runs before any probing.
///
/// # Errors
///
/// Returns the first [`AuthoringError`] found, checking in order: duplicate
/// keys, feature/check key collisions, undeclared references, cycles.
pub fn check_authoring(manifest: &Manifest) -> Result<(), AuthoringError> {
    let check_ids: HashSet<&str> = manifest.checks.iter().map(|c| c.id.as_str()).collect();

    let mut feature_keys = HashSet::new();
    for feature in &manifest.features {
        if !feature_keys.insert(feature.key.as_str()) {
            return Err(AuthoringError::DuplicateKey {
                kind: "feature",
                key: feature.key.clone(),
            });
        }
        if check_ids.contains(feature.key.as_str()) {
            return Err(AuthoringError::KeyCollision(feature.key.clone()));
        }
    }

    let mut module_names = HashSet::new();
    for module in &manifest.modules {
        if !module_names.insert(module.name.as_str()) {
            return Err(AuthoringError::DuplicateKey {
                kind: "module",
                key: module.name.clone(),
            });
        }
    }

    for feature in &manifest.features {
        if let Some(dep) = feature
            .depends
            .iter()
            .find(|d| !check_ids.contains(d.as_str()) && !feature_keys.contains(d.as_str()))
        {
            return Err(AuthoringError::UndeclaredDependency {
                feature: feature.key.clone(),
                dependency: dep.clone(),
            });
        }
        if let Some(source) = &feature.payload_from
            && !check_ids.contains(source.as_str())
        {
            return Err(AuthoringError::UndeclaredPayloadSource {
                feature: feature.key.clone(),
                check: source.clone(),
            });
        }
    }

    for module in &manifest.modules {
        if let Some(feature) = module
            .requires
            .iter()
            .find(|f| !feature_keys.contains(f.as_str()))
        {
            return Err(AuthoringError::UndeclaredFeature {
                module: module.name.clone(),
                feature: feature.clone(),
            });
        }
        if let Some(dep) = module
            .depends
            .iter()
            .find(|d| !module_names.contains(d.as_str()))
        {
            return Err(AuthoringError::UndeclaredModule {
                module: module.name.clone(),
                dependency: dep.clone(),
            });
        }
    }

    if let Some(cycle) = manifest.feature_graph().find_cycle() {
        return Err(AuthoringError::DependencyCycle {
            graph: "feature",
            cycle: cycle.to_string(),
        });
    }
    if let Some(cycle) = manifest.module_graph().find_cycle() {
        return Err(AuthoringError::DependencyCycle {
            graph: "module",
            cycle: cycle.to_string(),
        });
    }

    Ok(())
}

impl Manifest {
    /// Graph over feature keys; check ids are leaves and not nodes.
    #[must_use]
    pub fn feature_graph(&self) -> DependencyGraph {
        DependencyGraph::from_declarations(
            self.features
                .iter()
                .map(|f| (f.key.as_str(), f.depends.iter().map(String::as_str))),
        )
    }

    /// Graph over module names.
    #[must_use]
    pub fn module_graph(&self) -> DependencyGraph {
        DependencyGraph::from_declarations(
            self.modules
                .iter()
                .map(|m| (m.name.as_str(), m.depends.iter().map(String::as_str))),
        )
    }
}
