//! CLI argument definitions using clap derive

use crate::layer::DEFAULT_BUILD_FILE;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Strata - Incremental build-layer cache
///
/// Plans and runs layered builds, re-executing only the layers whose
/// instruction, inputs, or upstream layers changed.
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "STRATA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cache index directory (overrides cache.dir)
    #[arg(long, global = true, env = "STRATA_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show which layers would run, without running anything
    Plan(PlanArgs),

    /// Run a build, reusing cached layers
    Build(BuildArgs),

    /// Manage the layer cache
    Cache(CacheArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the plan command
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Build file
    #[arg(short, long, default_value = DEFAULT_BUILD_FILE)]
    pub file: PathBuf,

    /// Output format
    #[arg(long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Build file
    #[arg(short, long, default_value = DEFAULT_BUILD_FILE)]
    pub file: PathBuf,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., cache.gc_days)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Output format for listings
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cached layers
    List {
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },

    /// Remove cached layers older than N days
    Gc {
        /// Remove entries older than N days (default: from config)
        #[arg(long)]
        days: Option<u32>,

        /// Dry run - show what would be removed
        #[arg(long)]
        dry_run: bool,
    },

    /// Remove every cached layer
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the cache index directory
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_plan_defaults() {
        let cli = Cli::parse_from(["strata", "plan"]);
        match cli.command {
            Commands::Plan(args) => {
                assert_eq!(args.file, PathBuf::from("Strata.toml"));
                assert!(matches!(args.format, OutputFormat::Table));
            }
            _ => panic!("expected Plan command"),
        }
    }

    #[test]
    fn cli_parses_plan_json() {
        let cli = Cli::parse_from(["strata", "plan", "-f", "app.toml", "--format", "json"]);
        match cli.command {
            Commands::Plan(args) => {
                assert_eq!(args.file, PathBuf::from("app.toml"));
                assert!(matches!(args.format, OutputFormat::Json));
            }
            _ => panic!("expected Plan command"),
        }
    }

    #[test]
    fn cli_parses_build() {
        let cli = Cli::parse_from(["strata", "build", "--file", "x.toml"]);
        match cli.command {
            Commands::Build(args) => assert_eq!(args.file, PathBuf::from("x.toml")),
            _ => panic!("expected Build command"),
        }
    }

    #[test]
    fn cli_parses_cache_gc() {
        let cli = Cli::parse_from(["strata", "cache", "gc", "--days", "7", "--dry-run"]);
        match cli.command {
            Commands::Cache(CacheArgs {
                action: CacheAction::Gc { days, dry_run },
            }) => {
                assert_eq!(days, Some(7));
                assert!(dry_run);
            }
            _ => panic!("expected Cache Gc command"),
        }
    }

    #[test]
    fn cli_global_cache_dir() {
        let cli = Cli::parse_from(["strata", "cache", "path", "--cache-dir", "/tmp/layers"]);
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/layers")));
    }

    #[test]
    fn cli_verbose_levels() {
        let cli = Cli::parse_from(["strata", "plan"]);
        assert_eq!(cli.verbose, 0);

        let cli = Cli::parse_from(["strata", "-v", "plan"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["strata", "-vv", "plan"]);
        assert_eq!(cli.verbose, 2);
    }
}
