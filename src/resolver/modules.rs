//! Module selection: which modules are built, and in what order.
use std::collections::{BTreeMap, BTreeSet};

use crate::cache::fingerprint::ModuleRequest;
use crate::config::modules::ModuleSpec;
use crate::error::{AuthoringError, RequestError};
use crate::graph::{DependencyGraph, TieBreak};
use crate::resolved::{FeatureDecision, ModuleStatus, ResolvedModule};

/// Reject module requests that name undeclared modules.
///
/// # Errors
///
/// Returns [`RequestError::UnknownModule`] for the first unknown name.
pub fn validate_request(modules: &[ModuleSpec], request: &ModuleRequest) -> Result<(), RequestError> {
    request
        .only
        .iter()
        .flatten()
        .chain(&request.exclude)
        .find(|name| !modules.iter().any(|m| &m.name == *name))
        .map_or(Ok(()), |name| Err(RequestError::UnknownModule(name.clone())))
}

/// Resolve every declared module.
///
/// The result lists included modules in build order (dependencies first,
/// ties by name), then excluded modules by name, each with one reason.
///
/// # Errors
///
/// Returns an [`AuthoringError`] if the module graph is cyclic or refers to
/// undeclared modules or features.
pub fn resolve(
    modules: &[ModuleSpec],
    features: &BTreeMap<String, FeatureDecision>,
    request: &ModuleRequest,
) -> Result<Vec<ResolvedModule>, AuthoringError> {
    let graph = DependencyGraph::from_declarations(
        modules
            .iter()
            .map(|m| (m.name.as_str(), m.depends.iter().map(String::as_str))),
    );
    for module in modules {
        if let Some(feature) = module.requires.iter().find(|f| !features.contains_key(*f)) {
            return Err(AuthoringError::UndeclaredFeature {
                module: module.name.clone(),
                feature: feature.clone(),
            });
        }
        if let Some(dep) = module.depends.iter().find(|d| !graph.contains(d)) {
            return Err(AuthoringError::UndeclaredModule {
                module: module.name.clone(),
                dependency: dep.clone(),
            });
        }
    }
    graph
        .topological_order(TieBreak::Lexicographic)
        .map_err(|cycle| AuthoringError::DependencyCycle {
            graph: "module",
            cycle: cycle.to_string(),
        })?;

    let requested: BTreeSet<String> = match &request.only {
        Some(only) => graph.closure(only.iter().map(String::as_str)),
        None => graph.nodes().iter().cloned().collect(),
    };

    // seed
    let mut excluded: BTreeSet<&str> = modules
        .iter()
        .filter(|m| {
            !requested.contains(&m.name)
                || request.exclude.contains(&m.name)
                || m.requires
                    .iter()
                    .any(|f| !features.get(f).is_some_and(FeatureDecision::is_enabled))
        })
        .map(|m| m.name.as_str())
        .collect();

    // propagate to dependents until nothing changes
    let mut pending: Vec<&str> = excluded.iter().copied().collect();
    while let Some(name) = pending.pop() {
        for dependent in graph.dependents(name) {
            if excluded.insert(dependent) {
                pending.push(dependent);
            }
        }
    }

    let mut included_graph = DependencyGraph::new();
    for module in modules.iter().filter(|m| !excluded.contains(m.name.as_str())) {
        included_graph.add_node(&module.name);
    }
    for module in modules {
        for dep in &module.depends {
            included_graph.add_edge(&module.name, dep);
        }
    }
    let build_order = included_graph
        .topological_order(TieBreak::Lexicographic)
        .map_err(|cycle| AuthoringError::DependencyCycle {
            graph: "module",
            cycle: cycle.to_string(),
        })?;

    let mut out: Vec<ResolvedModule> = build_order
        .into_iter()
        .map(|name| ResolvedModule {
            name,
            status: ModuleStatus::Included,
        })
        .collect();

    let mut rejected: Vec<&ModuleSpec> = modules
        .iter()
        .filter(|m| excluded.contains(m.name.as_str()))
        .collect();
    rejected.sort_by(|a, b| a.name.cmp(&b.name));
    for module in rejected {
        out.push(ResolvedModule {
            name: module.name.clone(),
            status: ModuleStatus::Excluded {
                reason: exclusion_reason(module, &requested, request, features, &excluded),
            },
        });
    }
    Ok(out)
}

/// First failing item, checked in a fixed order against the final state.
fn exclusion_reason(
    module: &ModuleSpec,
    requested: &BTreeSet<String>,
    request: &ModuleRequest,
    features: &BTreeMap<String, FeatureDecision>,
    excluded: &BTreeSet<&str>,
) -> String {
    if !requested.contains(&module.name) {
        return "not requested".to_string();
    }
    if request.exclude.contains(&module.name) {
        return "excluded by request".to_string();
    }
    if let Some(feature) = module
        .requires
        .iter()
        .find(|f| !features.get(*f).is_some_and(FeatureDecision::is_enabled))
    {
        return format!("{feature} disabled");
    }
    module
        .depends
        .iter()
        .find(|d| excluded.contains(d.as_str()))
        .map_or_else(|| "excluded".to_string(), |dep| format!("{dep} excluded"))
}
