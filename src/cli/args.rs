//! CLI argument definitions using clap derive

use crate::cache::BuildMode;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// buildc - Dependency cache manager
///
/// Keeps local working copies of prebuilt libraries in sync with the
/// declared Subversion repositories.
#[derive(Parser, Debug)]
#[command(name = "buildc")]
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
    #[arg(short, long, global = true, env = "BUILDC_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the local library cache
    Cache(CacheArgs),

    /// Fetch one library version for this platform
    Dep(DepArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
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
    /// Discover the declared repositories and check out every library
    Init {
        #[command(flatten)]
        sync: SyncArgs,

        /// Replace an existing libraries map
        #[arg(short, long)]
        force: bool,
    },

    /// Rediscover the repositories, keeping what is already cached
    Upgrade {
        #[command(flatten)]
        sync: SyncArgs,
    },

    /// Verify the libraries map against the configuration
    Check,

    /// Bring every cached library up to date
    Update {
        #[command(flatten)]
        sync: SyncArgs,
    },

    /// List cached libraries
    List {
        /// Build mode (defaults to cache.mode)
        #[arg(short, long)]
        mode: Option<BuildMode>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Remove cached libraries and prune empty directories
    Remove {
        /// Build mode (defaults to cache.mode)
        #[arg(short, long)]
        mode: Option<BuildMode>,

        /// Only remove this library
        #[arg(short, long)]
        library: Option<String>,

        /// Only remove this version (requires --library)
        #[arg(long, value_name = "VERSION", requires = "library")]
        lib_version: Option<String>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Options shared by the synchronizing cache subcommands
#[derive(Parser, Debug, Clone, Copy)]
pub struct SyncArgs {
    /// Build mode (defaults to cache.mode)
    #[arg(short, long)]
    pub mode: Option<BuildMode>,

    /// Query every revision again instead of reusing earlier answers
    #[arg(long)]
    pub fresh: bool,

    /// Log checkout/update failures and carry on
    #[arg(long)]
    pub ignore_errors: bool,
}

/// Arguments for the dep command
#[derive(Parser, Debug)]
pub struct DepArgs {
    /// Library name
    pub library: String,

    /// Library version
    #[arg(value_name = "VERSION")]
    pub lib_version: String,

    /// Build mode (defaults to cache.mode)
    #[arg(short, long)]
    pub mode: Option<BuildMode>,

    /// Update an existing working copy when the remote has moved on
    #[arg(short, long)]
    pub force: bool,
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
}

/// Output format for list command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_cache_update() {
        let cli = Cli::parse_from(["buildc", "cache", "update", "--fresh", "--mode", "debug"]);
        match cli.command {
            Commands::Cache(CacheArgs {
                action: CacheAction::Update { sync },
            }) => {
                assert!(sync.fresh);
                assert!(!sync.ignore_errors);
                assert_eq!(sync.mode, Some(BuildMode::Debug));
            }
            _ => panic!("expected cache update"),
        }
    }

    #[test]
    fn cli_parses_cache_init_force() {
        let cli = Cli::parse_from(["buildc", "cache", "init", "--force", "--ignore-errors"]);
        match cli.command {
            Commands::Cache(CacheArgs {
                action: CacheAction::Init { sync, force },
            }) => {
                assert!(force);
                assert!(sync.ignore_errors);
                assert_eq!(sync.mode, None);
            }
            _ => panic!("expected cache init"),
        }
    }

    #[test]
    fn cli_parses_dep() {
        let cli = Cli::parse_from(["buildc", "dep", "libX", "2.0", "--force"]);
        match cli.command {
            Commands::Dep(args) => {
                assert_eq!(args.library, "libX");
                assert_eq!(args.lib_version, "2.0");
                assert!(args.force);
                assert_eq!(args.mode, None);
            }
            _ => panic!("expected dep"),
        }
    }

    #[test]
    fn cli_remove_lib_version_requires_library() {
        assert!(
            Cli::try_parse_from(["buildc", "cache", "remove", "--lib-version", "1.0"]).is_err()
        );

        let cli = Cli::parse_from([
            "buildc",
            "cache",
            "remove",
            "-l",
            "libX",
            "--lib-version",
            "1.0",
            "-y",
        ]);
        match cli.command {
            Commands::Cache(CacheArgs {
                action:
                    CacheAction::Remove {
                        library,
                        lib_version,
                        yes,
                        ..
                    },
            }) => {
                assert_eq!(library.as_deref(), Some("libX"));
                assert_eq!(lib_version.as_deref(), Some("1.0"));
                assert!(yes);
            }
            _ => panic!("expected cache remove"),
        }
    }

    #[test]
    fn cli_parses_list_format() {
        let cli = Cli::parse_from(["buildc", "cache", "list", "--format", "json"]);
        assert!(matches!(
            cli.command,
            Commands::Cache(CacheArgs {
                action: CacheAction::List {
                    format: OutputFormat::Json,
                    ..
                }
            })
        ));
    }

    #[test]
    fn cli_parses_completions() {
        let cli = Cli::parse_from(["buildc", "completions", "bash"]);
        assert!(matches!(
            cli.command,
            Commands::Completions { shell: Shell::Bash }
        ));
    }

    #[test]
    fn cli_verbose_levels() {
        let cli = Cli::parse_from(["buildc", "cache", "check"]);
        assert_eq!(cli.verbose, 0);

        let cli = Cli::parse_from(["buildc", "-v", "cache", "check"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["buildc", "-vv", "cache", "check"]);
        assert_eq!(cli.verbose, 2);
    }
}
