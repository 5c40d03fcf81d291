//! `defines.txt`: one `SYMBOL=value` line per define.
use crate::resolved::ResolvedConfig;

/// Render every define, defaulting the value to `1`.
#[must_use]
pub fn render(config: &ResolvedConfig) -> String {
    config
        .defines()
        .into_iter()
        .map(|define| {
            if define.contains('=') {
                format!("{define}\n")
            } else {
                format!("{define}=1\n")
            }
        })
        .collect()
}
