//! mcpsync CLI
//!
//! Validate, repair and synchronize MCP server configurations between the
//! canonical registry and an application's config file.

mod cli;
mod commands;
mod context;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use context::Context;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: could not set up logging: {e}", "warning".yellow().bold());
    }
    tracing::debug!(command = ?cli.command, "Parsed command line");

    let ctx = Context::from_cli(&cli)?;
    execute_command(&ctx, cli.command)
}

fn execute_command(ctx: &Context, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Validate { health, json } => commands::run_validate(ctx, health, json),
        Commands::Repair {
            server,
            store,
            apply,
            yes,
        } => commands::run_repair(ctx, &server, store, apply, yes),
        Commands::Push(args) => commands::run_push(ctx, &args.options()),
        Commands::Pull(args) => commands::run_pull(ctx, &args.options()),
        Commands::Health => commands::run_health(ctx),
    }
}
