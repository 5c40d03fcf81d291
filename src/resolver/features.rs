//! Feature resolution against probe results and user overrides.
//!
//! Features are evaluated in dependency order. Overrides are applied with
//! this precedence:
//!
//! 1. an explicit disable always wins;
//! 2. an explicit enable wins over soft failures but not over a *hard*
//!    blocker (a failing `hard` check, or any disabled feature dependency),
//!    in which case the enable is reported as ineffective;
//! 3. without an override, the first unmet dependency in declaration order
//!    names the reason;
//! 4. opt-in features stay off until explicitly enabled.
use std::collections::BTreeMap;

use crate::config::checks::CheckSpec;
use crate::config::features::FeatureSpec;
use crate::error::{AuthoringError, RequestError};
use crate::graph::{DependencyGraph, TieBreak};
use crate::resolved::{FeatureDecision, FeatureState, ProbeResult};

/// Reason recorded for an explicit disable.
pub const DISABLED_BY_OVERRIDE: &str = "explicitly disabled by override";

/// Explicit per-feature user overrides (`true` = enable).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides(BTreeMap<String, bool>);

impl Overrides {
    /// Build overrides from enable and disable lists.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::ConflictingOverride`] if a key is in both.
    pub fn from_lists(enable: &[String], disable: &[String]) -> Result<Self, RequestError> {
        let mut map = BTreeMap::new();
        for key in enable {
            map.insert(key.clone(), true);
        }
        for key in disable {
            if map.get(key) == Some(&true) {
                return Err(RequestError::ConflictingOverride(key.clone()));
            }
            map.insert(key.clone(), false);
        }
        Ok(Self(map))
    }

    /// The override for `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<bool> {
        self.0.get(key).copied()
    }

    /// All overrides, by key.
    #[must_use]
    pub const fn as_map(&self) -> &BTreeMap<String, bool> {
        &self.0
    }

    /// Reject overrides that name undeclared features.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::UnknownFeature`] for the first unknown key.
    pub fn validate(&self, features: &[FeatureSpec]) -> Result<(), RequestError> {
        match self
            .0
            .keys()
            .find(|key| !features.iter().any(|f| &f.key == *key))
        {
            Some(key) => Err(RequestError::UnknownFeature(key.clone())),
            None => Ok(()),
        }
    }
}

/// Why a dependency is not satisfied.
struct Unmet {
    reason: String,
    hard: bool,
}

/// Decide every feature.
///
/// # Errors
///
/// Returns an [`AuthoringError`] if the feature graph is cyclic or a
/// feature depends on something that is neither a check nor a feature.
pub fn resolve(
    features: &[FeatureSpec],
    checks: &[CheckSpec],
    probes: &BTreeMap<String, ProbeResult>,
    overrides: &Overrides,
) -> Result<BTreeMap<String, FeatureDecision>, AuthoringError> {
    let graph = DependencyGraph::from_declarations(
        features
            .iter()
            .map(|f| (f.key.as_str(), f.depends.iter().map(String::as_str))),
    );
    let order = graph
        .topological_order(TieBreak::Declaration)
        .map_err(|cycle| AuthoringError::DependencyCycle {
            graph: "feature",
            cycle: cycle.to_string(),
        })?;

    let mut decisions: BTreeMap<String, FeatureDecision> = BTreeMap::new();
    for key in &order {
        let Some(feature) = features.iter().find(|f| &f.key == key) else {
            continue;
        };
        let unmet = unmet_dependencies(feature, checks, probes, &decisions)?;
        let state = decide(feature, &unmet, probes, overrides.get(&feature.key));
        decisions.insert(
            feature.key.clone(),
            FeatureDecision {
                key: feature.key.clone(),
                display_name: feature.display_name().to_string(),
                define: feature.define_symbol(),
                state,
            },
        );
    }
    Ok(decisions)
}

/// Unmet dependencies of `feature`, in declaration order.
fn unmet_dependencies(
    feature: &FeatureSpec,
    checks: &[CheckSpec],
    probes: &BTreeMap<String, ProbeResult>,
    decided: &BTreeMap<String, FeatureDecision>,
) -> Result<Vec<Unmet>, AuthoringError> {
    let mut unmet = Vec::new();
    for dep in &feature.depends {
        if let Some(decision) = decided.get(dep) {
            if !decision.is_enabled() {
                unmet.push(Unmet {
                    reason: format!("{dep} disabled"),
                    hard: true,
                });
            }
        } else if let Some(check) = checks.iter().find(|c| &c.id == dep) {
            if !probes.get(dep).is_some_and(|r| r.outcome) {
                unmet.push(Unmet {
                    reason: format!("{dep} unavailable"),
                    hard: check.hard,
                });
            }
        } else {
            return Err(AuthoringError::UndeclaredDependency {
                feature: feature.key.clone(),
                dependency: dep.clone(),
            });
        }
    }
    Ok(unmet)
}

fn decide(
    feature: &FeatureSpec,
    unmet: &[Unmet],
    probes: &BTreeMap<String, ProbeResult>,
    explicit: Option<bool>,
) -> FeatureState {
    let disabled = |reason: String| FeatureState::Disabled { reason };
    match explicit {
        Some(false) => disabled(DISABLED_BY_OVERRIDE.to_string()),
        Some(true) => match unmet.iter().find(|u| u.hard) {
            Some(blocker) => disabled(format!("explicit enable ineffective: {}", blocker.reason)),
            None => FeatureState::Enabled {
                payload: payload(feature, probes),
                via_override: true,
            },
        },
        None => match unmet.first() {
            Some(first) => disabled(first.reason.clone()),
            None if feature.opt_in => disabled(format!("not selected (use --enable {})", feature.key)),
            None => FeatureState::Enabled {
                payload: payload(feature, probes),
                via_override: false,
            },
        },
    }
}

/// Payload of an enabled feature: the detail of its passing payload
/// source check, else its static payload.
fn payload(feature: &FeatureSpec, probes: &BTreeMap<String, ProbeResult>) -> Option<String> {
    feature
        .payload_from
        .as_ref()
        .and_then(|check| probes.get(check))
        .filter(|r| r.outcome)
        .and_then(|r| r.detail.clone())
        .or_else(|| feature.payload.clone())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::checks::{CheckKind, implicit_checks};

    fn header(id: &str, header: &str) -> CheckSpec {
        CheckSpec::new(
            id,
            CheckKind::Header {
                header: header.to_string(),
            },
        )
    }

    fn pkg(id: &str) -> CheckSpec {
        CheckSpec::new(
            id,
            CheckKind::PkgConfig {
                package: id.to_string(),
                min_version: None,
            },
        )
    }

    fn checks() -> Vec<CheckSpec> {
        let mut checks = implicit_checks();
        checks.push(header("pthread_header", "pthread.h"));
        checks.push(header("tun_header", "linux/if_tun.h"));
        checks.push(pkg("gsl"));
        checks
    }

    fn probes(passing: &[&str], failing: &[&str]) -> BTreeMap<String, ProbeResult> {
        let mut map = BTreeMap::new();
        for id in passing {
            map.insert(id.to_string(), ProbeResult::found(id, "ok"));
        }
        for id in failing {
            map.insert(id.to_string(), ProbeResult::missing(id, "no"));
        }
        map
    }

    fn reason(decisions: &BTreeMap<String, FeatureDecision>, key: &str) -> String {
        decisions[key].reason().to_string()
    }

    // -----------------------------------------------------------------------
    // Overrides
    // -----------------------------------------------------------------------

    #[test]
    fn conflicting_override_is_rejected() {
        let err = Overrides::from_lists(&["GSL".to_string()], &["GSL".to_string()]).unwrap_err();
        assert_eq!(err, RequestError::ConflictingOverride("GSL".to_string()));
    }

    #[test]
    fn unknown_override_is_rejected() {
        let overrides = Overrides::from_lists(&["Nope".to_string()], &[]).unwrap();
        let features = vec![FeatureSpec::new("GSL", ["gsl"])];
        assert_eq!(
            overrides.validate(&features),
            Err(RequestError::UnknownFeature("Nope".to_string()))
        );
    }

    // -----------------------------------------------------------------------
    // Propagation
    // -----------------------------------------------------------------------

    #[test]
    fn missing_header_propagates_through_features() {
        let features = vec![
            FeatureSpec::new("RealTime", ["Threading"]),
            FeatureSpec::new("Threading", ["pthread_header"]),
        ];
        let decisions = resolve(
            &features,
            &checks(),
            &probes(&["cc"], &["pthread_header"]),
            &Overrides::default(),
        )
        .unwrap();
        assert_eq!(reason(&decisions, "Threading"), "pthread_header unavailable");
        assert_eq!(reason(&decisions, "RealTime"), "Threading disabled");
        assert!(!decisions["RealTime"].is_enabled());
    }

    #[test]
    fn first_unmet_dependency_in_declaration_order() {
        let features = vec![FeatureSpec::new("TapBridge", ["cc", "tun_header", "pthread_header"])];
        let decisions = resolve(
            &features,
            &checks(),
            &probes(&["cc"], &["tun_header", "pthread_header"]),
            &Overrides::default(),
        )
        .unwrap();
        assert_eq!(reason(&decisions, "TapBridge"), "tun_header unavailable");
    }

    #[test]
    fn payload_taken_from_source_check() {
        let mut gsl = FeatureSpec::new("GSL", ["gsl"]);
        gsl.payload_from = Some("gsl".to_string());
        let mut probes = probes(&[], &[]);
        probes.insert(
            "gsl".to_string(),
            ProbeResult::found("gsl", "-lgsl -lgslcblas -lm"),
        );
        let decisions = resolve(&[gsl], &checks(), &probes, &Overrides::default()).unwrap();
        assert_eq!(decisions["GSL"].payload(), Some("-lgsl -lgslcblas -lm"));
    }

    #[test]
    fn static_payload_only_when_enabled() {
        let mut threads = FeatureSpec::new("Threading", ["pthread_header"]);
        threads.payload = Some("-pthread".to_string());
        let on = resolve(
            std::slice::from_ref(&threads),
            &checks(),
            &probes(&["pthread_header"], &[]),
            &Overrides::default(),
        )
        .unwrap();
        assert_eq!(on["Threading"].payload(), Some("-pthread"));

        let off = resolve(
            &[threads],
            &checks(),
            &probes(&[], &["pthread_header"]),
            &Overrides::default(),
        )
        .unwrap();
        assert_eq!(off["Threading"].payload(), None);
    }

    // -----------------------------------------------------------------------
    // Overrides and precedence
    // -----------------------------------------------------------------------

    #[test]
    fn explicit_disable_wins_over_passing_probe() {
        let mut gsl = FeatureSpec::new("GSL", ["gsl"]);
        gsl.payload_from = Some("gsl".to_string());
        let overrides = Overrides::from_lists(&[], &["GSL".to_string()]).unwrap();
        let decisions = resolve(&[gsl], &checks(), &probes(&["gsl"], &[]), &overrides).unwrap();
        assert_eq!(reason(&decisions, "GSL"), DISABLED_BY_OVERRIDE);
        assert_eq!(decisions["GSL"].payload(), None);
    }

    #[test]
    fn explicit_enable_overrides_soft_failure() {
        let features = vec![FeatureSpec::new("GSL", ["gsl"])];
        let overrides = Overrides::from_lists(&["GSL".to_string()], &[]).unwrap();
        let decisions = resolve(&features, &checks(), &probes(&[], &["gsl"]), &overrides).unwrap();
        assert!(decisions["GSL"].is_enabled());
        assert_eq!(reason(&decisions, "GSL"), "explicitly enabled by override");
    }

    #[test]
    fn explicit_enable_cannot_beat_hard_check() {
        let features = vec![FeatureSpec::new("Bindings", ["cxx"])];
        let overrides = Overrides::from_lists(&["Bindings".to_string()], &[]).unwrap();
        let decisions = resolve(&features, &checks(), &probes(&["cc"], &["cxx"]), &overrides).unwrap();
        assert_eq!(
            reason(&decisions, "Bindings"),
            "explicit enable ineffective: cxx unavailable"
        );
    }

    #[test]
    fn explicit_enable_cannot_beat_disabled_feature() {
        let features = vec![
            FeatureSpec::new("Threading", ["pthread_header"]),
            FeatureSpec::new("RealTime", ["Threading"]),
        ];
        let overrides = Overrides::from_lists(&["RealTime".to_string()], &[]).unwrap();
        let decisions = resolve(
            &features,
            &checks(),
            &probes(&[], &["pthread_header"]),
            &overrides,
        )
        .unwrap();
        assert_eq!(
            reason(&decisions, "RealTime"),
            "explicit enable ineffective: Threading disabled"
        );
    }

    #[test]
    fn opt_in_feature_needs_enable() {
        let mut tests = FeatureSpec::new("Tests", Vec::<String>::new());
        tests.opt_in = true;
        let off = resolve(
            std::slice::from_ref(&tests),
            &checks(),
            &probes(&[], &[]),
            &Overrides::default(),
        )
        .unwrap();
        assert_eq!(reason(&off, "Tests"), "not selected (use --enable Tests)");

        let overrides = Overrides::from_lists(&["Tests".to_string()], &[]).unwrap();
        let on = resolve(&[tests], &checks(), &probes(&[], &[]), &overrides).unwrap();
        assert!(on["Tests"].is_enabled());
    }

    // -----------------------------------------------------------------------
    // Authoring faults
    // -----------------------------------------------------------------------

    #[test]
    fn cycle_is_authoring_error() {
        let features = vec![FeatureSpec::new("A", ["B"]), FeatureSpec::new("B", ["A"])];
        let err = resolve(&features, &checks(), &probes(&[], &[]), &Overrides::default())
            .unwrap_err();
        assert_eq!(
            err,
            AuthoringError::DependencyCycle {
                graph: "feature",
                cycle: "A → B → A".to_string()
            }
        );
    }

    #[test]
    fn undeclared_dependency_is_authoring_error() {
        let features = vec![FeatureSpec::new("A", ["nothing"])];
        let err = resolve(&features, &checks(), &probes(&[], &[]), &Overrides::default())
            .unwrap_err();
        assert!(matches!(err, AuthoringError::UndeclaredDependency { .. }));
    }

    #[test]
    fn every_feature_has_a_decision() {
        let features = vec![
            FeatureSpec::new("A", ["cc"]),
            FeatureSpec::new("B", ["A", "gsl"]),
            FeatureSpec::new("C", Vec::<String>::new()),
        ];
        let decisions = resolve(
            &features,
            &checks(),
            &probes(&["cc"], &["gsl"]),
            &Overrides::default(),
        )
        .unwrap();
        assert_eq!(decisions.len(), 3);
        assert!(decisions.values().all(|d| !d.reason().is_empty()));
    }
}
