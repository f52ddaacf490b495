//! Push and pull command implementations

use colored::Colorize;

use mcpsync_core::{SyncOptions, SyncReport};

use crate::context::Context;
use crate::error::{CliError, Result};

/// Run the push command
///
/// Writes canonical servers into the target config.
pub fn run_push(ctx: &Context, options: &SyncOptions) -> Result<()> {
    let engine = ctx.sync_engine();
    println!(
        "{} Pushing {} -> {}",
        "=>".blue().bold(),
        engine.canonical_path().display(),
        engine.target_path().display()
    );
    finish(engine.push(options))
}

/// Run the pull command
///
/// Reads target servers back into the canonical registry.
pub fn run_pull(ctx: &Context, options: &SyncOptions) -> Result<()> {
    let engine = ctx.sync_engine();
    println!(
        "{} Pulling {} -> {}",
        "=>".blue().bold(),
        engine.target_path().display(),
        engine.canonical_path().display()
    );
    finish(engine.pull(options))
}

fn finish(report: SyncReport) -> Result<()> {
    if !report.rendered_diff.is_empty() {
        println!("{}", report.rendered_diff);
    }

    if let Some(health) = &report.health {
        println!(
            "{} {}/{} servers healthy",
            "=>".blue().bold(),
            health.healthy,
            health.total
        );
    }

    for action in &report.actions {
        println!("   {} {}", "+".green(), action);
    }
    for warning in &report.warnings {
        println!("   {} {}", "!".yellow(), warning);
    }
    if !report.placeholders.is_empty() {
        println!("{} Values still needing a real secret:", "=>".blue().bold());
        for placeholder in &report.placeholders {
            println!(
                "   {} {}.{}",
                "-".yellow(),
                placeholder.server.cyan(),
                placeholder.variable
            );
        }
    }
    if let Some(backup) = &report.backup {
        println!("{} Backup saved to {}", "=>".blue().bold(), backup.display());
    }

    if !report.success {
        for error in &report.errors {
            println!("   {} {}", "!".red(), error);
        }
        return Err(CliError::user(format!("{} failed", report.direction)));
    }

    if report.dry_run {
        println!("{} Dry run, nothing written.", "OK".green().bold());
    } else {
        println!("{} {} complete.", "OK".green().bold(), report.direction);
    }
    Ok(())
}
