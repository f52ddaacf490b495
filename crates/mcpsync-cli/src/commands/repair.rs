//! Repair command implementation

use colored::Colorize;
use serde_json::Value;

use mcpsync_core::{RepairEngine, RepairSuggestion, ValidateOptions};
use mcpsync_fs::backup_file;
use mcpsync_meta::SERVERS_KEY;

use crate::cli::StoreKind;
use crate::commands::validate::print_result;
use crate::context::Context;
use crate::error::{CliError, Result};

/// Run the repair command
///
/// Validates one server without the cache and prints ranked repair
/// suggestions. With `apply`, the repaired configuration is written back after
/// backing up the store. Manual and destructive actions run only with `yes`.
pub fn run_repair(
    ctx: &Context,
    server: &str,
    kind: StoreKind,
    apply: bool,
    yes: bool,
) -> Result<()> {
    let path = ctx.store_path(kind);
    let mut document = ctx.load(kind)?;
    let config = document
        .get(SERVERS_KEY)
        .and_then(Value::as_object)
        .and_then(|servers| servers.get(server))
        .cloned()
        .ok_or_else(|| mcpsync_core::Error::ServerNotFound {
            name: server.to_string(),
            path: path.clone(),
        })?;

    let validator = ctx.settings.validation_engine();
    let result = validator.validate_with(server, &config, ValidateOptions::default().without_cache());
    print_result(server, &result);

    let engine = RepairEngine::new();
    let suggestions = engine.analyze_issues(&result, &config);
    if suggestions.is_empty() {
        println!("{} No repairs needed.", "OK".green().bold());
        return Ok(());
    }

    println!();
    for suggestion in &suggestions {
        print_suggestion(suggestion);
    }

    if !apply {
        println!();
        println!(
            "Run {} to apply automatic fixes.",
            format!("mcpsync repair {server} --apply").cyan()
        );
        return Ok(());
    }

    let outcome = engine.apply_all(&suggestions, &config, yes);
    for note in &outcome.errors {
        println!("   {} {}", "!".yellow(), note);
    }
    if outcome.applied.is_empty() {
        return Err(CliError::user(format!(
            "No repairs applied to '{server}'. Re-run with --yes to include manual fixes."
        )));
    }

    if let Some(servers) = document.get_mut(SERVERS_KEY).and_then(Value::as_object_mut) {
        servers.insert(server.to_string(), outcome.config);
    }
    if let Some(backup) = backup_file(&path)? {
        println!("{} Backup saved to {}", "=>".blue().bold(), backup.display());
    }
    ctx.store(kind).save(&document)?;

    println!(
        "{} Applied {} action(s) to {}: {}",
        "OK".green().bold(),
        outcome.applied.len(),
        server.cyan(),
        outcome.applied.join(", ")
    );
    Ok(())
}

fn print_suggestion(suggestion: &RepairSuggestion) {
    let mode = if suggestion.is_fully_automatic() {
        "auto".green()
    } else {
        "manual".yellow()
    };
    println!(
        "{} {} [{}] confidence {:.0}%, est. {}",
        "=>".blue().bold(),
        suggestion.title.bold(),
        mode,
        suggestion.confidence() * 100.0,
        suggestion.estimated_time
    );
    for action in &suggestion.actions {
        let marker = if action.destructive {
            "!".red()
        } else if action.needs_confirmation() {
            "?".yellow()
        } else {
            "+".green()
        };
        println!("   {} {}: {}", marker, action.title, action.description);
        if let Some(preview) = &action.preview {
            println!("      {}", preview.dimmed());
        }
    }
}
