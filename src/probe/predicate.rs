//! Checks that need no external process.
use super::Probed;
use crate::context::Context;
use crate::platform::{Arch, Os};

/// Match the target platform against accepted values; empty lists accept
/// anything.
#[must_use]
pub fn platform(ctx: &Context, id: &str, os: &[Os], arch: &[Arch]) -> Probed {
    let target = ctx.platform;
    let os_ok = os.is_empty() || os.contains(&target.os);
    let arch_ok = arch.is_empty() || arch.contains(&target.arch);
    if os_ok && arch_ok {
        Probed::found(id, target.to_string())
    } else {
        Probed::missing(id, format!("target is {target}"))
    }
}

/// Require environment variable `var` to be set and non-empty.
#[must_use]
pub fn env_var(id: &str, var: &str) -> Probed {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => Probed::found(id, value),
        _ => Probed::missing(id, format!("{var} not set")),
    }
}
