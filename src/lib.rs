//! Configuration resolution and caching engine for modular native builds.
//!
//! A project declares environment checks, optional features and modules in
//! TOML files under `conf/`. One run probes the environment, decides every
//! feature and module with a reason, persists the result keyed by a
//! fingerprint of its inputs, and renders it for the build system.
//!
//! The public API is organised into these layers:
//!
//! - **[`config`]**: parse and validate the manifest in `conf/`
//! - **[`probe`]**: run environment checks against an injected [`exec::Executor`]
//! - **[`resolver`]**: decide features and modules from probe results
//! - **[`cache`]**: fingerprinted, atomically written snapshots
//! - **[`emit`]**: render a [`resolved::ResolvedConfig`] into artifacts
//! - **[`engine`]**: one resolution run wiring the layers together
//! - **[`commands`]**: top-level subcommand orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cache;
pub mod cancel;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod emit;
pub mod engine;
pub mod error;
pub mod exec;
pub mod graph;
pub mod logging;
pub mod operations;
pub mod platform;
pub mod probe;
pub mod resolved;
pub mod resolver;
