//! Health command implementation

use colored::Colorize;

use mcpsync_core::health_check_all;

use crate::cli::StoreKind;
use crate::commands::validate::store_label;
use crate::context::Context;
use crate::error::{CliError, Result};

/// Run the health command
///
/// Probes every server of both stores. Fails when any probe fails.
pub fn run_health(ctx: &Context) -> Result<()> {
    let engine = ctx.settings.validation_engine();
    let mut failing = 0;

    for kind in [StoreKind::Canonical, StoreKind::Target] {
        let Some(servers) = ctx.servers(kind)? else {
            continue;
        };
        println!(
            "{} Probing {} servers in {}",
            "=>".blue().bold(),
            store_label(kind),
            ctx.store_path(kind).display().to_string().cyan()
        );
        let summary = health_check_all(engine.probe(), &servers);
        for issue in &summary.issues {
            println!("   {} {}", "!".red(), issue);
        }
        if summary.all_healthy() {
            println!("{} {}/{} healthy", "OK".green().bold(), summary.healthy, summary.total);
        } else {
            println!(
                "{} {}/{} healthy",
                "UNHEALTHY".red().bold(),
                summary.healthy,
                summary.total
            );
            failing += summary.total - summary.healthy;
        }
    }

    if failing > 0 {
        return Err(CliError::user(format!("{failing} server(s) failed health checks")));
    }
    Ok(())
}
