//! Command: resolve the configuration and write artifacts.
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use super::{Layout, write_stdout};
use crate::cancel::CancelToken;
use crate::cli::ConfigureOpts;
use crate::config::{CONF_DIR, options};
use crate::emit::{self, Format, artifact::ArtifactChange};
use crate::engine::{Engine, Settings};
use crate::exec::SystemExecutor;
use crate::logging::{Log, Logger, StepStatus};

/// User option defaults under `conf/`.
pub const OPTIONS_FILE: &str = "options.toml";

/// Run the `configure` command.
///
/// # Errors
///
/// Returns an error if the options cannot be loaded, resolution fails, or
/// an artifact cannot be written.
pub fn run(layout: &Layout, opts: &ConfigureOpts, log: &Arc<Logger>) -> Result<()> {
    std::fs::create_dir_all(&layout.build_dir)
        .with_context(|| format!("creating {}", layout.build_dir.display()))?;
    let root = dunce::canonicalize(&layout.root)
        .with_context(|| format!("project root {} not found", layout.root.display()))?;
    let build_dir = dunce::canonicalize(&layout.build_dir)
        .with_context(|| format!("resolving {}", layout.build_dir.display()))?;

    let settings = load_settings(&root, &build_dir, opts)?;
    log.debug(&format!("settings: {settings:?}"));

    let cancel = CancelToken::with_ctrlc_handler()?;
    let executor = Arc::new(SystemExecutor::new(settings.probe_timeout, cancel.clone()));
    let engine = Engine::new(Arc::clone(log) as Arc<dyn Log>, executor, cancel);

    let resolution = match engine.configure(&settings) {
        Ok(resolution) => resolution,
        Err(e) => {
            log.error(&e.to_string());
            log.print_summary();
            return Err(e).context("configuration failed");
        }
    };
    if resolution.cache_hit {
        log.info("configuration is up to date");
    } else {
        log.info(&format!("ran {} probe(s)", resolution.probes_run));
    }

    log.stage("Writing artifacts");
    let changes = emit::write_artifacts(&resolution.config, &settings.build_dir)
        .inspect_err(|e| {
            log.record_step("write artifacts", StepStatus::Failed, Some(&e.to_string()));
        })?;
    let mut written = 0;
    for (path, change) in &changes {
        match change {
            ArtifactChange::Written => {
                written += 1;
                log.info(&format!("wrote {}", path.display()));
            }
            ArtifactChange::Unchanged => log.debug(&format!("{} unchanged", path.display())),
        }
    }
    log.record_step(
        "write artifacts",
        if written == 0 {
            StepStatus::Cached
        } else {
            StepStatus::Ok
        },
        Some(&format!("{written}/{} written", changes.len())),
    );

    write_stdout(&emit::emit(&resolution.config, Format::Report))?;
    log.print_summary();
    Ok(())
}

/// Merge `conf/options.toml` under the command-line options.
///
/// # Errors
///
/// Returns an error if `options.toml` exists but cannot be parsed.
pub fn load_settings(root: &Path, build_dir: &Path, opts: &ConfigureOpts) -> Result<Settings> {
    let path = root.join(CONF_DIR).join(OPTIONS_FILE);
    let defaults =
        options::load(&path).with_context(|| format!("loading {}", path.display()))?;
    Ok(apply_cli(
        Settings::new(root, build_dir).with_options(&defaults),
        opts,
    ))
}

/// Command-line values take precedence over persisted defaults.
///
/// Feature overrides merge per key: a feature named on the command line
/// drops its opposite entry from the defaults.
fn apply_cli(mut s: Settings, opts: &ConfigureOpts) -> Settings {
    s.enable.retain(|k| !opts.disable.contains(k));
    s.disable.retain(|k| !opts.enable.contains(k));
    extend_unique(&mut s.enable, &opts.enable);
    extend_unique(&mut s.disable, &opts.disable);

    if let Some(only) = &opts.modules {
        s.modules.only = Some(only.clone());
    }
    if !opts.exclude_modules.is_empty() {
        s.modules.exclude.clone_from(&opts.exclude_modules);
    }
    if let Some(profile) = opts.build_profile {
        s.profile = profile;
    }
    if let Some(prefix) = &opts.prefix {
        s.prefix.clone_from(prefix);
    }
    for (target, given) in [
        (&mut s.include_paths, &opts.include_paths),
        (&mut s.library_paths, &opts.library_paths),
        (&mut s.tool_paths, &opts.tool_paths),
    ] {
        if !given.is_empty() {
            target.clone_from(given);
        }
    }
    if opts.cc.is_some() {
        s.cc.clone_from(&opts.cc);
    }
    if opts.cxx.is_some() {
        s.cxx.clone_from(&opts.cxx);
    }
    for (target, given) in [
        (&mut s.cflags, &opts.cflags),
        (&mut s.cxxflags, &opts.cxxflags),
        (&mut s.ldflags, &opts.ldflags),
    ] {
        if let Some(flags) = given {
            *target = flags.split_whitespace().map(str::to_string).collect();
        }
    }
    s.target_os = opts.target_os.or(s.target_os);
    s.target_arch = opts.target_arch.or(s.target_arch);
    s.jobs = opts.jobs.or(s.jobs);
    if let Some(secs) = opts.probe_timeout {
        s.probe_timeout = std::time::Duration::from_secs(secs);
    }
    s.force = opts.force;
    s
}

fn extend_unique(list: &mut Vec<String>, extra: &[String]) {
    for key in extra {
        if !list.contains(key) {
            list.push(key.clone());
        }
    }
}
