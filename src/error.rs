//! Domain-specific error types for the configuration engine.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Internal modules return typed errors (e.g., [`AuthoringError`], [`ProbeError`])
//! while command handlers at the CLI boundary convert them to [`anyhow::Error`]
//! via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! ConfigureError
//! ├── Manifest(ManifestError)        reading/parsing conf/*.toml
//! ├── Authoring(AuthoringError)      cycles, undeclared or duplicate keys
//! ├── Request(RequestError)          overrides/module requests naming unknown keys
//! ├── Environment(EnvironmentError)  no usable toolchain at all
//! ├── Probe(ProbeError)              prober faults, timeouts, cancellation
//! ├── Cache(CacheError)              cache cannot be durably written
//! └── Cancelled                      run aborted before the snapshot was persisted
//! ```
//!
//! Expected negative probe outcomes (missing header, absent tool) are *data*,
//! never errors; they surface as `outcome = false` in a probe result.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for one resolution run.
#[derive(Error, Debug)]
pub enum ConfigureError {
    /// The project manifest could not be read or parsed.
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// The declared check/feature/module graph is malformed.
    #[error("Configuration authoring error: {0}")]
    Authoring(#[from] AuthoringError),

    /// The user request names features or modules that do not exist.
    #[error("Invalid request: {0}")]
    Request(#[from] RequestError),

    /// The host cannot support any build at all.
    #[error("Environment error: {0}")]
    Environment(#[from] EnvironmentError),

    /// The prober itself failed (not a negative probe outcome).
    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    /// The resolved snapshot could not be persisted.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// The run was interrupted; the persisted cache was left untouched.
    #[error("configuration cancelled; previous cache left intact")]
    Cancelled,
}

/// Errors that arise from reading the TOML project manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// An I/O error occurred while reading a manifest file.
    #[error("IO error reading manifest file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the expected schema.
    #[error("Invalid TOML in {path}: {message}")]
    Parse {
        /// Path to the offending file.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },
}

/// Faults in the declared graph. Always detected before any probing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthoringError {
    /// The same key is declared twice.
    #[error("duplicate {kind} '{key}'")]
    DuplicateKey {
        /// What was duplicated (`check`, `feature`, `module`).
        kind: &'static str,
        /// The duplicated key.
        key: String,
    },

    /// A feature key is also used as a check id, making dependencies ambiguous.
    #[error("feature '{0}' shadows a check with the same id")]
    KeyCollision(String),

    /// A feature depends on something that is neither a check nor a feature.
    #[error("feature '{feature}' depends on undeclared '{dependency}'")]
    UndeclaredDependency {
        /// The declaring feature.
        feature: String,
        /// The missing dependency.
        dependency: String,
    },

    /// A feature takes its payload from a check that does not exist.
    #[error("feature '{feature}' takes its payload from undeclared check '{check}'")]
    UndeclaredPayloadSource {
        /// The declaring feature.
        feature: String,
        /// The missing check.
        check: String,
    },

    /// A module requires a feature that is not declared.
    #[error("module '{module}' requires undeclared feature '{feature}'")]
    UndeclaredFeature {
        /// The declaring module.
        module: String,
        /// The missing feature.
        feature: String,
    },

    /// A module depends on a module that is not declared.
    #[error("module '{module}' depends on undeclared module '{dependency}'")]
    UndeclaredModule {
        /// The declaring module.
        module: String,
        /// The missing module.
        dependency: String,
    },

    /// The feature or module graph is cyclic.
    #[error("{graph} dependency cycle detected: {cycle}")]
    DependencyCycle {
        /// Which graph (`feature` or `module`).
        graph: &'static str,
        /// The offending cycle rendered as `A → B → A`.
        cycle: String,
    },
}

/// Errors in the user's request (overrides and module selection).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// An override names a feature that is not declared.
    #[error("unknown feature '{0}' in override")]
    UnknownFeature(String),

    /// A module request names a module that is not declared.
    #[error("unknown module '{0}' in module request")]
    UnknownModule(String),

    /// The same feature is both enabled and disabled.
    #[error("feature '{0}' is both enabled and disabled")]
    ConflictingOverride(String),
}

/// Environment faults that block all downstream work.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentError {
    /// Neither a C nor a C++ compiler could be found.
    #[error("no usable C or C++ compiler found (tried: {tried})")]
    NoCompiler {
        /// Comma-separated list of candidates that were tried.
        tried: String,
    },
}

/// Internal faults of the prober. Negative outcomes are not errors.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// A scratch directory for a compile test could not be created.
    #[error("check '{check}': cannot create temporary directory: {source}")]
    TempDir {
        /// The check being run.
        check: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A scratch file for a compile test could not be written.
    #[error("check '{check}': cannot write probe source {path}: {source}")]
    WriteSource {
        /// The check being run.
        check: String,
        /// Path of the scratch file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A probe process did not finish within the probe timeout.
    #[error("check '{check}': '{program}' did not finish within {secs}s")]
    TimedOut {
        /// The check being run.
        check: String,
        /// The hung program.
        program: String,
        /// Timeout in seconds.
        secs: u64,
    },

    /// The run was cancelled while probing.
    #[error("probing cancelled")]
    Cancelled,

    /// The worker pool could not be created.
    #[error("cannot start probe worker pool: {0}")]
    Pool(String),
}

/// Resource faults while persisting the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The cache directory could not be created.
    #[error("cannot create cache directory {path}: {source}")]
    CreateDir {
        /// Directory path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The snapshot could not be serialised.
    #[error("cannot serialise cache record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The staged temporary file could not be written.
    #[error("cannot write cache record {path}: {source}")]
    Write {
        /// Path of the staged file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The writer lock could not be acquired.
    #[error("cannot lock cache directory {path}: {source}")]
    Lock {
        /// Path of the lock file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The atomic rename into place failed.
    #[error("cannot replace cache record {path}: {source}")]
    Persist {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
