//! One resolution run, from manifest to persisted snapshot.
//!
//! ```text
//! manifest → authoring checks → request validation → toolchain
//!          → cache key ─┬─ hit  → cached snapshot
//!                       └─ miss → probe batch → features → modules
//!                                 → snapshot → persist
//! ```
//!
//! Authoring and request faults surface before any probe runs. The cache
//! is only written once every step succeeded and the run was not cancelled.
pub mod derived;
pub mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::fingerprint::{
    self, EnvironmentFacts, FingerprintInputs, SCHEMA_VERSION, environment_signature,
};
use crate::cache::{CacheKey, CacheStore};
use crate::cancel::CancelToken;
use crate::config::Manifest;
use crate::config::validation::{check_authoring, collect_warnings};
use crate::context::Context;
use crate::error::{CacheError, ConfigureError};
use crate::exec::Executor;
use crate::logging::{Log, StepStatus};
use crate::operations::{FileSystemOps, SystemFileSystemOps};
use crate::platform::Platform;
use crate::probe::toolchain::{self, Toolchain};
use crate::probe::{self, ProbeEnv};
use crate::resolved::{Flags, ResolvedConfig};
use crate::resolver::{self, Overrides};
pub use settings::Settings;

/// Outcome of [`Engine::configure`].
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The resolved snapshot.
    pub config: Arc<ResolvedConfig>,
    /// Whether the snapshot was served from the cache.
    pub cache_hit: bool,
    /// Number of checks probed; zero on a cache hit.
    pub probes_run: usize,
}

/// Runs resolutions against injected process and filesystem services.
pub struct Engine {
    log: Arc<dyn Log>,
    executor: Arc<dyn Executor>,
    fs_ops: Arc<dyn FileSystemOps>,
    cancel: CancelToken,
    host: Platform,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("fs_ops", &self.fs_ops)
            .field("cancel", &self.cancel)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create an engine for the detected host platform.
    #[must_use]
    pub fn new(log: Arc<dyn Log>, executor: Arc<dyn Executor>, cancel: CancelToken) -> Self {
        Self {
            log,
            executor,
            fs_ops: Arc::new(SystemFileSystemOps),
            cancel,
            host: Platform::detect(),
        }
    }

    /// Replace the filesystem implementation used by probes.
    #[must_use]
    pub fn with_fs_ops(mut self, fs_ops: Arc<dyn FileSystemOps>) -> Self {
        self.fs_ops = fs_ops;
        self
    }

    /// Pretend to run on `host`.
    #[must_use]
    pub const fn with_host(mut self, host: Platform) -> Self {
        self.host = host;
        self
    }

    /// Resolve the configuration described by `settings`.
    ///
    /// A cached snapshot is reused when the fingerprint and environment
    /// signature match, unless `settings.force` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest is unreadable or malformed, the
    /// request names unknown features or modules, no compiler exists, a
    /// probe faults, the run is cancelled, or the cache cannot be written.
    pub fn configure(&self, settings: &Settings) -> Result<Resolution, ConfigureError> {
        let log = &self.log;

        log.stage("Loading manifest");
        let manifest = Manifest::load(&settings.root).inspect_err(|e| {
            log.record_step("load manifest", StepStatus::Failed, Some(&e.to_string()));
        })?;
        log.info(&format!(
            "{} {}: {} checks, {} features, {} modules",
            manifest.project.name,
            manifest.project.version,
            manifest.checks.len(),
            manifest.features.len(),
            manifest.modules.len()
        ));
        check_authoring(&manifest)?;
        let warnings = collect_warnings(&manifest);
        if !warnings.is_empty() {
            log.warn(&format!("found {} manifest warning(s):", warnings.len()));
            for warning in &warnings {
                log.warn(&format!("  {warning}"));
            }
        }

        let overrides = Overrides::from_lists(&settings.enable, &settings.disable)?;
        overrides.validate(&manifest.features)?;
        resolver::modules::validate_request(&manifest.modules, &settings.modules)?;
        log.record_step("load manifest", StepStatus::Ok, None);

        let platform = self
            .host
            .with_overrides(settings.target_os, settings.target_arch);
        let ctx = Context::new(
            settings.root.clone(),
            platform,
            Arc::clone(&self.log),
            Arc::clone(&self.executor),
            self.cancel.clone(),
        )
        .with_search_paths(
            &settings.include_paths,
            &settings.library_paths,
            &settings.tool_paths,
        )
        .with_jobs(settings.jobs)
        .with_probe_timeout(settings.probe_timeout)
        .with_fs_ops(Arc::clone(&self.fs_ops));
        log.debug(&format!("context: {ctx:?}"));

        log.stage("Detecting toolchain");
        let toolchain = toolchain::detect(&ctx, settings.cc.as_deref(), settings.cxx.as_deref())
            .inspect_err(|e| {
                log.record_step("detect toolchain", StepStatus::Failed, Some(&e.to_string()));
            })?;
        log.record_step("detect toolchain", StepStatus::Ok, None);

        let flags = final_flags(settings, &toolchain);
        let key = self.cache_key(settings, &manifest, &ctx, &toolchain, &overrides, &flags)?;
        log.debug(&format!("fingerprint {}", key.fingerprint));

        let store = CacheStore::new(&settings.build_dir);
        if settings.force {
            log.record_step("reuse cache", StepStatus::Skipped, Some("--force"));
        } else if let Some(config) = store.load(&key) {
            log.info("inputs unchanged, reusing cached configuration");
            log.record_step("probe environment", StepStatus::Cached, None);
            log.record_step("resolve features", StepStatus::Cached, None);
            log.record_step("resolve modules", StepStatus::Cached, None);
            return Ok(Resolution {
                config: Arc::new(config),
                cache_hit: true,
                probes_run: 0,
            });
        }

        log.stage("Probing environment");
        let env = ProbeEnv {
            ctx: &ctx,
            toolchain: &toolchain,
            flags: &flags,
        };
        let batch = probe::batch(&manifest.checks, &env).inspect_err(|e| {
            log.record_step("probe environment", StepStatus::Failed, Some(&e.to_string()));
        })?;
        let passed = batch.results.values().filter(|r| r.outcome).count();
        log.record_step(
            "probe environment",
            StepStatus::Ok,
            Some(&format!("{passed}/{} checks passed", batch.results.len())),
        );

        log.stage("Resolving features");
        let features = resolver::features::resolve(
            &manifest.features,
            &manifest.checks,
            &batch.results,
            &overrides,
        )?;
        let enabled = features.values().filter(|d| d.is_enabled()).count();
        log.record_step(
            "resolve features",
            StepStatus::Ok,
            Some(&format!("{enabled}/{} enabled", features.len())),
        );

        log.stage("Resolving modules");
        let modules = resolver::modules::resolve(&manifest.modules, &features, &settings.modules)?;
        let included = modules.iter().filter(|m| m.is_included()).count();
        log.record_step(
            "resolve modules",
            StepStatus::Ok,
            Some(&format!("{included}/{} included", modules.len())),
        );

        let config = ResolvedConfig {
            fingerprint: key.fingerprint.clone(),
            app: manifest.project.name.clone(),
            version: manifest.project.version.clone(),
            platform,
            profile: settings.profile,
            toolchain: toolchain.id(),
            flags,
            probe_results: batch.results,
            check_defines: manifest
                .checks
                .iter()
                .filter_map(|c| c.define.clone().map(|d| (c.id.clone(), d)))
                .collect(),
            feature_decisions: features,
            feature_order: manifest.features.iter().map(|f| f.key.clone()).collect(),
            module_order: modules,
            module_declaration: manifest.modules.iter().map(|m| m.name.clone()).collect(),
            derived_paths: derived::derived_paths(
                &settings.prefix,
                &manifest.project.name,
                &settings.build_dir,
                &toolchain,
                &batch.locations,
            ),
            tool_invocations: derived::tool_invocations(platform, &toolchain),
        };

        if self.cancel.is_cancelled() {
            log.record_step("persist cache", StepStatus::Failed, Some("cancelled"));
            return Err(ConfigureError::Cancelled);
        }
        store.store(&key, &config).inspect_err(|e| {
            log.record_step("persist cache", StepStatus::Failed, Some(&e.to_string()));
        })?;
        log.record_step("persist cache", StepStatus::Ok, None);

        Ok(Resolution {
            config: Arc::new(config),
            cache_hit: false,
            probes_run: manifest.checks.len(),
        })
    }

    fn cache_key(
        &self,
        settings: &Settings,
        manifest: &Manifest,
        ctx: &Context,
        toolchain: &Toolchain,
        overrides: &Overrides,
        flags: &Flags,
    ) -> Result<CacheKey, ConfigureError> {
        let strings = |paths: &[PathBuf]| -> Vec<String> {
            paths.iter().map(|p| p.display().to_string()).collect()
        };
        let inputs = FingerprintInputs {
            schema: SCHEMA_VERSION,
            toolchain: toolchain.id(),
            profile: settings.profile,
            prefix: settings.prefix.display().to_string(),
            platform: ctx.platform,
            include_paths: strings(&settings.include_paths),
            library_paths: strings(&settings.library_paths),
            tool_paths: strings(&settings.tool_paths),
            requested_cc: settings.cc.clone(),
            requested_cxx: settings.cxx.clone(),
            cflags: flags.cflags.clone(),
            cxxflags: flags.cxxflags.clone(),
            ldflags: flags.ldflags.clone(),
            overrides: overrides.as_map().clone(),
            module_request: settings.modules.normalized(),
            manifest_digest: manifest.digest().map_err(CacheError::from)?,
        };
        let facts = EnvironmentFacts::gather(
            toolchain.cc.as_ref().map(|c| c.path.as_path()),
            toolchain.cxx.as_ref().map(|c| c.path.as_path()),
            &settings.build_dir,
            ctx.search_paths().map(PathBuf::as_path),
            |p| self.fs_ops.is_dir(p),
        );
        Ok(CacheKey {
            fingerprint: fingerprint::fingerprint(&inputs).map_err(CacheError::from)?,
            environment: environment_signature(&facts).map_err(CacheError::from)?,
        })
    }
}

/// Profile flags first, then the user's.
fn final_flags(settings: &Settings, toolchain: &Toolchain) -> Flags {
    let profile = settings.profile.compile_flags(toolchain.is_msvc());
    let join = |extra: &[String]| -> Vec<String> {
        profile.iter().chain(extra).cloned().collect()
    };
    Flags {
        cflags: join(&settings.cflags),
        cxxflags: join(&settings.cxxflags),
        ldflags: settings.ldflags.clone(),
    }
}
