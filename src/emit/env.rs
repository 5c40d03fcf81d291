//! `config.env`: flat `KEY = value` dump of every resolved variable.
//!
//! Values use a small literal syntax: `'quoted strings'`, `True`/`False`,
//! `['lists']` and `('tuples',)`. Keys are sorted.
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::config::features::screaming_snake;
use crate::resolved::{CompilerId, FeatureDecision, ResolvedConfig};

/// Render the flat variable dump.
#[must_use]
pub fn render(config: &ResolvedConfig) -> String {
    let mut vars: BTreeMap<String, String> = BTreeMap::new();
    let mut set = |key: &str, value: String| {
        vars.insert(key.to_string(), value);
    };

    set("APPNAME", quote(&config.app));
    set("VERSION", quote(&config.version));
    set("PLATFORM", quote(&config.platform.to_string()));
    set("BUILD_PROFILE", quote(&config.profile.to_string()));
    set("BUILD_SUFFIX", quote(config.profile.suffix()));
    for (prefix, id) in [("CC", &config.toolchain.cc), ("CXX", &config.toolchain.cxx)] {
        if let Some(id) = id {
            set(&format!("{prefix}_NAME"), quote(&id.family));
            set(&format!("{prefix}_VERSION"), version_tuple(id));
        }
    }
    set("CCFLAGS", list(&config.flags.cflags));
    set("CXXFLAGS", list(&config.flags.cxxflags));
    set("LINKFLAGS", list(&config.flags.ldflags));
    set("CCDEFINES", list(&config.profile.defines()));
    set("CXXDEFINES", list(&config.profile.defines()));
    set("DEFINES", list(&config.defines()));
    set(
        "define_key",
        list(
            config
                .check_defines
                .iter()
                .filter(|(check, _)| config.probe_results.get(*check).is_some_and(|r| r.outcome))
                .map(|(_, symbol)| symbol),
        ),
    );
    for decision in config.feature_decisions.values() {
        set(
            &format!("ENABLE_{}", screaming_snake(&decision.key)),
            enable_value(decision),
        );
    }
    set(
        "OPTIONAL_FEATURES",
        format!(
            "[{}]",
            config
                .features_in_order()
                .map(|d| format!(
                    "({}, {}, {}, {})",
                    quote(&d.key),
                    quote(&d.display_name),
                    boolean(d.is_enabled()),
                    quote(d.reason())
                ))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    );
    set("MODULES_ENABLED", list(config.included_modules()));
    set("MODULES_NOT_BUILT", list(config.excluded_modules()));

    for (key, value) in config.derived_paths.iter().chain(&config.tool_invocations) {
        vars.insert(key.clone(), quote(value));
    }

    let mut out = String::new();
    for (key, value) in &vars {
        let _ = writeln!(out, "{key} = {value}");
    }
    out
}

/// `False` when disabled, the quoted payload when there is one, else `True`.
fn enable_value(decision: &FeatureDecision) -> String {
    match (decision.is_enabled(), decision.payload()) {
        (false, _) => boolean(false),
        (true, Some(payload)) => quote(payload),
        (true, None) => boolean(true),
    }
}

fn version_tuple(id: &CompilerId) -> String {
    let parts: Vec<String> = id.version.split('.').map(quote).collect();
    match parts.as_slice() {
        [single] => format!("({single},)"),
        _ => format!("({})", parts.join(", ")),
    }
}

fn boolean(b: bool) -> String {
    if b { "True" } else { "False" }.to_string()
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let items: Vec<String> = items.into_iter().map(|s| quote(s.as_ref())).collect();
    format!("[{}]", items.join(", "))
}
