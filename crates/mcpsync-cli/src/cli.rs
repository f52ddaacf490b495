//! CLI argument parsing using clap derive

use clap::{Args, Parser, Subcommand, ValueEnum};
use mcpsync_core::SyncOptions;
use std::path::PathBuf;

/// mcpsync - Keep MCP server configurations valid and in sync
#[derive(Parser, Debug)]
#[command(name = "mcpsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (defaults to ./mcpsync.toml when present)
    #[arg(long, global = true, env = "MCPSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Canonical registry file
    #[arg(long, global = true)]
    pub canonical: Option<PathBuf>,

    /// Target application config file
    #[arg(long, global = true)]
    pub target: Option<PathBuf>,

    /// Secrets file
    #[arg(long, global = true)]
    pub secrets: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Validate the servers of both stores
    Validate {
        /// Also probe each server's health
        #[arg(long)]
        health: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show and optionally apply repairs for one server
    ///
    /// Examples:
    ///   mcpsync repair github                 # Preview suggestions
    ///   mcpsync repair github --apply         # Apply automatic fixes
    ///   mcpsync repair github --apply --yes   # Also apply manual fixes
    Repair {
        /// Server name
        server: String,

        /// Store holding the server
        #[arg(long, value_enum, default_value_t = StoreKind::Canonical)]
        store: StoreKind,

        /// Write the repaired configuration
        #[arg(long)]
        apply: bool,

        /// Apply manual and destructive actions without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Push canonical servers into the target config
    Push(SyncArgs),

    /// Pull target servers back into the canonical registry
    Pull(SyncArgs),

    /// Probe every server of both stores
    Health,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct SyncArgs {
    /// Preview changes without applying them
    #[arg(long)]
    pub dry_run: bool,

    /// Probe servers and abort when none is healthy
    #[arg(long)]
    pub health_check: bool,

    /// Load secrets into pushed servers, or save pulled secrets
    #[arg(long)]
    pub sync_secrets: bool,
}

impl SyncArgs {
    pub fn options(&self) -> SyncOptions {
        SyncOptions {
            dry_run: self.dry_run,
            health_check: self.health_check,
            sync_secrets: self.sync_secrets,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Canonical,
    Target,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn push_flags_map_to_options() {
        let cli = Cli::parse_from(["mcpsync", "push", "--dry-run", "--sync-secrets"]);
        let Commands::Push(args) = cli.command else {
            panic!("expected push");
        };
        let options = args.options();
        assert!(options.dry_run);
        assert!(options.sync_secrets);
        assert!(!options.health_check);
    }

    #[test]
    fn repair_defaults_to_canonical_store() {
        let cli = Cli::parse_from(["mcpsync", "repair", "github"]);
        assert_eq!(
            cli.command,
            Commands::Repair {
                server: "github".into(),
                store: StoreKind::Canonical,
                apply: false,
                yes: false,
            }
        );
    }

    #[test]
    fn global_paths_after_subcommand() {
        let cli = Cli::parse_from(["mcpsync", "validate", "--target", "/tmp/t.json", "-v"]);
        assert_eq!(cli.target, Some(PathBuf::from("/tmp/t.json")));
        assert!(cli.verbose);
    }
}
