use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::emit::Format;
use crate::platform::{Arch, Os};
use crate::resolved::BuildProfile;

/// Top-level CLI entry point for the configuration engine.
#[derive(Parser, Debug)]
#[command(
    name = "buildconf",
    about = "Configuration resolution and caching for modular native builds",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Override project root directory (the one containing conf/)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Build directory for the cache and generated files [default: <root>/build]
    #[arg(long, global = true)]
    pub build_dir: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Probe the environment and resolve features and modules
    Configure(ConfigureOpts),
    /// Print the report of the last configuration
    Status,
    /// Render the last configuration in one format
    Emit(EmitOpts),
    /// Remove the cache and generated files
    Clean,
    /// Generate shell completions
    Completions(CompletionsOpts),
    /// Print version information
    Version,
}

/// Options for the `configure` subcommand.
///
/// Unset options fall back to `conf/options.toml`.
#[derive(Parser, Debug, Clone, Default)]
pub struct ConfigureOpts {
    /// Force features on
    #[arg(long, value_delimiter = ',')]
    pub enable: Vec<String>,

    /// Force features off
    #[arg(long, value_delimiter = ',')]
    pub disable: Vec<String>,

    /// Build only these modules and their dependencies
    #[arg(long, value_delimiter = ',')]
    pub modules: Option<Vec<String>>,

    /// Leave these modules out
    #[arg(long, value_delimiter = ',')]
    pub exclude_modules: Vec<String>,

    /// Build profile
    #[arg(long, value_enum)]
    pub build_profile: Option<BuildProfile>,

    /// Installation prefix
    #[arg(long)]
    pub prefix: Option<PathBuf>,

    /// Extra header search directory (repeatable)
    #[arg(long = "include-path")]
    pub include_paths: Vec<PathBuf>,

    /// Extra library search directory (repeatable)
    #[arg(long = "library-path")]
    pub library_paths: Vec<PathBuf>,

    /// Extra program search directory (repeatable)
    #[arg(long = "tool-path")]
    pub tool_paths: Vec<PathBuf>,

    /// C compiler to use
    #[arg(long)]
    pub cc: Option<String>,

    /// C++ compiler to use
    #[arg(long)]
    pub cxx: Option<String>,

    /// Extra C compiler flags (whitespace separated)
    #[arg(long, allow_hyphen_values = true)]
    pub cflags: Option<String>,

    /// Extra C++ compiler flags (whitespace separated)
    #[arg(long, allow_hyphen_values = true)]
    pub cxxflags: Option<String>,

    /// Extra linker flags (whitespace separated)
    #[arg(long, allow_hyphen_values = true)]
    pub ldflags: Option<String>,

    /// Target operating system [default: host]
    #[arg(long)]
    pub target_os: Option<Os>,

    /// Target CPU architecture [default: host]
    #[arg(long)]
    pub target_arch: Option<Arch>,

    /// Number of parallel probes [default: available CPUs]
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Seconds before a hung probe is killed
    #[arg(long)]
    pub probe_timeout: Option<u64>,

    /// Ignore the cached configuration
    #[arg(short, long)]
    pub force: bool,
}

/// Options for the `emit` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct EmitOpts {
    /// Output format
    #[arg(long, value_enum)]
    pub format: Format,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Options for the `completions` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CompletionsOpts {
    /// Target shell
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn configure(args: &[&str]) -> ConfigureOpts {
        let cli = Cli::parse_from(args);
        assert!(
            matches!(&cli.command, Command::Configure(_)),
            "Expected Configure command"
        );
        if let Command::Configure(opts) = cli.command {
            opts
        } else {
            ConfigureOpts::default()
        }
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_configure_overrides() {
        let opts = configure(&[
            "buildconf",
            "configure",
            "--enable",
            "Tests,Examples",
            "--disable",
            "GSL",
        ]);
        assert_eq!(opts.enable, ["Tests", "Examples"]);
        assert_eq!(opts.disable, ["GSL"]);
    }

    #[test]
    fn parse_module_request() {
        let opts = configure(&[
            "buildconf",
            "configure",
            "--modules",
            "network,core",
            "--exclude-modules",
            "visualizer",
        ]);
        assert_eq!(
            opts.modules,
            Some(vec!["network".to_string(), "core".to_string()])
        );
        assert_eq!(opts.exclude_modules, ["visualizer"]);
    }

    #[test]
    fn modules_default_to_all() {
        assert!(configure(&["buildconf", "configure"]).modules.is_none());
    }

    #[test]
    fn parse_profile_and_target() {
        let opts = configure(&[
            "buildconf",
            "configure",
            "--build-profile",
            "release",
            "--target-os",
            "darwin",
            "--target-arch",
            "arm64",
        ]);
        assert_eq!(opts.build_profile, Some(BuildProfile::Release));
        assert_eq!(opts.target_os, Some(Os::Macos));
        assert_eq!(opts.target_arch, Some(Arch::Aarch64));
    }

    #[test]
    fn parse_flags_with_leading_hyphen() {
        let opts = configure(&["buildconf", "configure", "--cflags", "-Wall -Wextra"]);
        assert_eq!(opts.cflags.as_deref(), Some("-Wall -Wextra"));
    }

    #[test]
    fn parse_repeatable_paths() {
        let opts = configure(&[
            "buildconf",
            "configure",
            "--include-path",
            "/opt/a/include",
            "--include-path",
            "/opt/b/include",
        ]);
        assert_eq!(opts.include_paths.len(), 2);
    }

    #[test]
    fn parse_force_and_jobs() {
        let opts = configure(&["buildconf", "configure", "-f", "-j", "4"]);
        assert!(opts.force);
        assert_eq!(opts.jobs, Some(4));
    }

    #[test]
    fn parse_global_dirs() {
        let cli = Cli::parse_from([
            "buildconf",
            "--root",
            "/src/sim",
            "status",
            "--build-dir",
            "/tmp/build",
        ]);
        assert_eq!(cli.global.root, Some(PathBuf::from("/src/sim")));
        assert_eq!(cli.global.build_dir, Some(PathBuf::from("/tmp/build")));
        assert!(matches!(cli.command, Command::Status));
    }

    #[test]
    fn parse_emit() {
        let cli = Cli::parse_from(["buildconf", "emit", "--format", "header", "-o", "config.h"]);
        assert!(
            matches!(&cli.command, Command::Emit(_)),
            "Expected Emit command"
        );
        if let Command::Emit(opts) = cli.command {
            assert_eq!(opts.format, Format::Header);
            assert_eq!(opts.output, Some(PathBuf::from("config.h")));
        }
    }

    #[test]
    fn emit_requires_format() {
        assert!(Cli::try_parse_from(["buildconf", "emit"]).is_err());
    }

    #[test]
    fn parse_completions() {
        let cli = Cli::parse_from(["buildconf", "completions", "bash"]);
        assert!(matches!(cli.command, Command::Completions(_)));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::parse_from(["buildconf", "-v", "version"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Version));
    }
}
