//! Validate command implementation

use colored::Colorize;
use indexmap::IndexMap;
use serde::Serialize;

use mcpsync_core::{Severity, ValidationResult, ValidationSummary};

use crate::cli::StoreKind;
use crate::context::Context;
use crate::error::{CliError, Result};

#[derive(Serialize)]
struct StoreReport {
    store: &'static str,
    path: String,
    summary: ValidationSummary,
    servers: IndexMap<String, ValidationResult>,
}

/// Run the validate command
///
/// Validates every server of the canonical and target stores. Fails when any
/// server is invalid.
pub fn run_validate(ctx: &Context, health: bool, json: bool) -> Result<()> {
    let engine = ctx.settings.validation_engine();
    let mut reports = Vec::new();

    for kind in [StoreKind::Canonical, StoreKind::Target] {
        let path = ctx.store_path(kind);
        let Some(servers) = ctx.servers(kind)? else {
            tracing::debug!(path = %path.display(), "Store has no servers, skipping");
            continue;
        };
        let results = engine.validate_all(&servers, health);
        reports.push(StoreReport {
            store: store_label(kind),
            path: path.display().to_string(),
            summary: engine.summarize(&results),
            servers: results,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print_reports(&reports);
    }

    let invalid: usize = reports.iter().map(|r| r.summary.invalid).sum();
    if invalid > 0 {
        return Err(CliError::user(format!(
            "{invalid} server(s) failed validation"
        )));
    }
    Ok(())
}

pub(crate) fn store_label(kind: StoreKind) -> &'static str {
    match kind {
        StoreKind::Canonical => "canonical",
        StoreKind::Target => "target",
    }
}

fn print_reports(reports: &[StoreReport]) {
    if reports.is_empty() {
        println!("{} No servers configured.", "=>".blue().bold());
        return;
    }

    for report in reports {
        println!(
            "{} Validating {} servers in {}",
            "=>".blue().bold(),
            report.store,
            report.path.cyan()
        );
        for (name, result) in &report.servers {
            print_result(name, result);
        }
        let summary = &report.summary;
        println!(
            "   {}/{} valid, average score {:.0}",
            summary.valid, summary.total, summary.average_score
        );
        println!();
    }
}

pub(crate) fn print_result(name: &str, result: &ValidationResult) {
    let status = if result.valid() {
        "OK".green().bold()
    } else {
        "INVALID".red().bold()
    };
    println!("   {} {} (score {})", status, name.cyan(), result.score());
    for issue in result.issues() {
        let marker = match issue.severity {
            Severity::Error => "!".red(),
            Severity::Warning => "!".yellow(),
            Severity::Info => "-".dimmed(),
        };
        println!("      {} {}", marker, issue);
    }
}
