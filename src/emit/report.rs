//! Operator report: every feature and module with its state and reason.
use std::fmt::Write as _;

use crate::resolved::{CompilerId, ModuleStatus, ResolvedConfig};

const INCLUDED_REASON: &str = "all requirements met";

/// Render the report shown after `configure` and by `status`.
///
/// Features and modules are listed in declaration order, each with exactly
/// one reason.
#[must_use]
pub fn render(config: &ResolvedConfig) -> String {
    let compiler = |id: Option<&CompilerId>| {
        id.map_or_else(|| "not found".to_string(), ToString::to_string)
    };
    let sections: Vec<(&str, Vec<(String, String)>)> = vec![
        (
            "Configuration:",
            vec![
                ("Platform".to_string(), config.platform.to_string()),
                ("Build profile".to_string(), config.profile.to_string()),
                ("C compiler".to_string(), compiler(config.toolchain.cc.as_ref())),
                ("C++ compiler".to_string(), compiler(config.toolchain.cxx.as_ref())),
            ],
        ),
        (
            "Features:",
            config
                .features_in_order()
                .map(|d| {
                    let state = if d.is_enabled() { "enabled" } else { "disabled" };
                    (d.display_name.clone(), format!("{state} ({})", d.reason()))
                })
                .collect(),
        ),
        (
            "Modules:",
            config
                .modules_in_declaration_order()
                .map(|m| {
                    let value = match &m.status {
                        ModuleStatus::Included => format!("included ({INCLUDED_REASON})"),
                        ModuleStatus::Excluded { reason } => format!("excluded ({reason})"),
                    };
                    (m.name.clone(), value)
                })
                .collect(),
        ),
    ];
    let width = sections
        .iter()
        .flat_map(|(_, rows)| rows.iter().map(|(label, _)| label.chars().count()))
        .max()
        .unwrap_or(0);

    let mut out = format!("{} {} configuration summary\n", config.app, config.version);
    for (title, rows) in &sections {
        if rows.is_empty() {
            continue;
        }
        let _ = write!(out, "\n{title}\n");
        for (label, value) in rows {
            let _ = writeln!(out, "  {label:<width$} : {value}");
        }
    }
    let _ = write!(
        out,
        "\n{} of {} modules will be built\n",
        config.included_modules().len(),
        config.module_order.len()
    );
    out
}
