//! Push and pull between the canonical and the target store
//!
//! Both directions run the same pipeline: load and normalize the source,
//! validate, handle secrets, adapt launch commands, probe health, diff, and
//! finally back up and atomically rewrite the destination. Any failure stops
//! the pipeline before the destination is touched.

use super::diff::DeploymentDiff;
use super::merge::merge_servers;
use crate::health::{HealthSummary, health_check_all};
use crate::portability::CommandAdapter;
use crate::secrets::{self, PlaceholderRef, SecretsVault};
use crate::validation::{IssueCategory, Severity, ValidationEngine};
use crate::{Error, Result};
use mcpsync_fs::{JsonStore, backup_file};
use mcpsync_meta::{SERVERS_KEY, ServerMap, normalize_servers_key};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

/// Indentation of the canonical store, which is kept under version control.
pub const CANONICAL_INDENT: usize = 4;

/// Sync direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Canonical store to target store
    Push,
    /// Target store to canonical store
    Pull,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Pull => "pull",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for push and pull
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Stop after computing the diff; nothing is written
    pub dry_run: bool,
    /// Probe every server and abort when none is healthy
    pub health_check: bool,
    /// Fill placeholders from the vault on push, store real values on pull
    pub sync_secrets: bool,
}

/// Report from a push or pull
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub direction: Direction,
    /// Whether the operation completed successfully
    pub success: bool,
    pub dry_run: bool,
    /// Steps taken during the operation
    pub actions: Vec<String>,
    /// Problems that did not stop the operation
    pub warnings: Vec<String>,
    /// Errors that stopped the operation
    pub errors: Vec<String>,
    pub diff: DeploymentDiff,
    pub rendered_diff: String,
    /// Backup of the destination taken before writing
    pub backup: Option<PathBuf>,
    /// Values in the written servers that still need a real secret
    pub placeholders: Vec<PlaceholderRef>,
    pub health: Option<HealthSummary>,
}

impl SyncReport {
    fn new(direction: Direction, dry_run: bool) -> Self {
        Self {
            direction,
            success: true,
            dry_run,
            actions: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            diff: DeploymentDiff::default(),
            rendered_diff: String::new(),
            backup: None,
            placeholders: Vec::new(),
            health: None,
        }
    }

    fn action(&mut self, action: impl Into<String>) {
        self.actions.push(action.into());
    }

    fn set_diff(&mut self, diff: DeploymentDiff) {
        self.rendered_diff = diff.render(self.direction.as_str());
        self.diff = diff;
    }

    fn fail(&mut self, error: Error) {
        tracing::error!(direction = %self.direction, error = %error, "Sync failed");
        self.success = false;
        self.errors.push(error.to_string());
    }
}

/// Load a store and rename the legacy servers key.
fn load_normalized(store: &JsonStore) -> Result<Map<String, Value>> {
    let mut document = store.load()?;
    normalize_servers_key(&mut document);
    Ok(document)
}

/// The server map of a document, `None` when absent.
fn servers_in(document: &Map<String, Value>, path: &Path) -> Result<Option<ServerMap>> {
    match document.get(SERVERS_KEY) {
        None => Ok(None),
        Some(Value::Object(servers)) => Ok(Some(servers.clone())),
        Some(_) => Err(Error::InvalidServerMap {
            path: path.to_path_buf(),
        }),
    }
}

/// Engine for moving server definitions between the two stores
pub struct SyncEngine {
    canonical: JsonStore,
    target: JsonStore,
    vault: SecretsVault,
    adapter: CommandAdapter,
    validator: ValidationEngine,
}

impl fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncEngine")
            .field("canonical", &self.canonical.path())
            .field("target", &self.target.path())
            .field("secrets", &self.vault.path())
            .field("adapter", &self.adapter)
            .finish_non_exhaustive()
    }
}

impl SyncEngine {
    /// Create a new SyncEngine
    ///
    /// # Arguments
    ///
    /// * `canonical` - The canonical registry file
    /// * `target` - The application config file
    /// * `secrets` - The secrets side file
    pub fn new(
        canonical: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
        secrets: impl Into<PathBuf>,
    ) -> Self {
        Self {
            canonical: JsonStore::new(canonical).with_indent(CANONICAL_INDENT),
            target: JsonStore::new(target),
            vault: SecretsVault::new(secrets),
            adapter: CommandAdapter::default(),
            validator: ValidationEngine::new(),
        }
    }

    pub fn with_adapter(mut self, adapter: CommandAdapter) -> Self {
        self.adapter = adapter;
        self
    }

    pub fn with_validator(mut self, validator: ValidationEngine) -> Self {
        self.validator = validator;
        self
    }

    pub fn canonical_path(&self) -> &Path {
        self.canonical.path()
    }

    pub fn target_path(&self) -> &Path {
        self.target.path()
    }

    pub fn validator(&self) -> &ValidationEngine {
        &self.validator
    }

    /// Push canonical servers into the target store.
    ///
    /// Never panics; failures are reported with `success == false`.
    pub fn push(&self, options: &SyncOptions) -> SyncReport {
        tracing::info!(
            source = %self.canonical.path().display(),
            target = %self.target.path().display(),
            dry_run = options.dry_run,
            health_check = options.health_check,
            sync_secrets = options.sync_secrets,
            "Starting push"
        );
        let mut report = SyncReport::new(Direction::Push, options.dry_run);
        if let Err(e) = self.run_push(options, &mut report) {
            report.fail(e);
        }
        report
    }

    /// Pull target servers back into the canonical store.
    pub fn pull(&self, options: &SyncOptions) -> SyncReport {
        tracing::info!(
            source = %self.target.path().display(),
            target = %self.canonical.path().display(),
            dry_run = options.dry_run,
            health_check = options.health_check,
            sync_secrets = options.sync_secrets,
            "Starting pull"
        );
        let mut report = SyncReport::new(Direction::Pull, options.dry_run);
        if let Err(e) = self.run_pull(options, &mut report) {
            report.fail(e);
        }
        report
    }

    fn run_push(&self, options: &SyncOptions, report: &mut SyncReport) -> Result<()> {
        let source = load_normalized(&self.canonical)?;
        let mut servers = servers_in(&source, self.canonical.path())?.ok_or_else(|| {
            Error::NoServerMap {
                path: self.canonical.path().to_path_buf(),
            }
        })?;
        report.action(format!("Found {} server(s) to push", servers.len()));

        self.check_source(&servers, report)?;

        if options.sync_secrets {
            let stored = self.vault.load()?;
            if !stored.is_empty() {
                servers = secrets::merge(&servers, &stored);
                report.action(format!("Loaded secrets for {} server(s)", stored.len()));
            }
        }

        servers = self.adapter.wrap_all(&servers);

        if options.health_check {
            self.check_health(&servers, report)?;
        }

        let mut destination = load_normalized(&self.target)?;
        let current = servers_in(&destination, self.target.path())?.unwrap_or_default();
        let (merged, stats) = merge_servers(&current, &servers);
        report.set_diff(DeploymentDiff::compute(&current, &merged));

        if options.dry_run {
            report.action("Dry run complete, no changes made");
            return Ok(());
        }

        let written: ServerMap = merged
            .iter()
            .filter(|(name, _)| servers.contains_key(name.as_str()))
            .map(|(name, config)| (name.clone(), config.clone()))
            .collect();
        report.placeholders = secrets::find_placeholders(&written);
        if !report.placeholders.is_empty() {
            tracing::warn!(count = report.placeholders.len(), "Found placeholders that need real values");
        }

        report.backup = backup_file(self.target.path())?;
        destination.insert(SERVERS_KEY.to_string(), Value::Object(merged));
        self.target.save(&destination)?;

        report.action(format!(
            "Updated {}: {} added, {} updated, {} secret(s) preserved",
            self.target.path().display(),
            stats.added,
            stats.updated,
            stats.preserved_secrets
        ));
        Ok(())
    }

    fn run_pull(&self, options: &SyncOptions, report: &mut SyncReport) -> Result<()> {
        let source = load_normalized(&self.target)?;
        let servers = match servers_in(&source, self.target.path())? {
            Some(servers) if !servers.is_empty() => servers,
            _ => {
                tracing::info!("No servers found in target store");
                report.action("No servers found in target store");
                report.set_diff(DeploymentDiff::default());
                return Ok(());
            }
        };
        report.action(format!("Found {} server(s) to pull", servers.len()));

        self.check_source(&servers, report)?;

        if options.health_check {
            self.check_health(&servers, report)?;
        }

        let mut destination = load_normalized(&self.canonical)?;
        let current = servers_in(&destination, self.canonical.path())?.unwrap_or_default();

        let servers = self.adapter.unwrap_all(&servers);

        if options.sync_secrets && !options.dry_run {
            let extracted = secrets::extract(&servers);
            if extracted.is_empty() {
                report.action("No secrets found to extract");
            } else {
                let mut stored = self.vault.load()?;
                let count = extracted.value_count();
                stored.extend(extracted);
                self.vault.save(&stored)?;
                report.action(format!(
                    "Saved {count} secret(s) to {}",
                    self.vault.path().display()
                ));
            }
        }

        let servers = secrets::sanitize(&servers);
        let (merged, stats) = merge_servers(&current, &servers);
        report.set_diff(DeploymentDiff::compute(&current, &merged));

        if options.dry_run {
            report.action("Dry run complete, no changes made");
            return Ok(());
        }

        report.backup = backup_file(self.canonical.path())?;
        destination.insert(SERVERS_KEY.to_string(), Value::Object(merged));
        self.canonical.save(&destination)?;

        report.action(format!(
            "Updated {}: {} added, {} updated",
            self.canonical.path().display(),
            stats.added,
            stats.updated
        ));
        Ok(())
    }

    /// Validate the source servers.
    ///
    /// Structural errors abort; host-dependent errors are only reported.
    fn check_source(&self, servers: &ServerMap, report: &mut SyncReport) -> Result<()> {
        let results = self.validator.validate_all(servers, false);
        let mut failed = Vec::new();

        for (name, result) in &results {
            for issue in result.errors() {
                let line = format!("{name}: {}", issue.message);
                if matches!(
                    issue.category,
                    IssueCategory::RequiredField | IssueCategory::Format
                ) {
                    report.errors.push(line);
                    if !failed.contains(name) {
                        failed.push(name.clone());
                    }
                } else {
                    report.warnings.push(line);
                }
            }
            let warnings = result.count(Severity::Warning);
            if warnings > 0 {
                tracing::debug!(server = %name, warnings, "Server has validation warnings");
            }
        }

        if failed.is_empty() {
            tracing::info!(count = results.len(), "All server configurations are valid");
            Ok(())
        } else {
            Err(Error::ValidationFailed { servers: failed })
        }
    }

    fn check_health(&self, servers: &ServerMap, report: &mut SyncReport) -> Result<()> {
        let summary = health_check_all(self.validator.probe(), servers);
        report.warnings.extend(summary.issues.iter().cloned());
        let none_healthy = !summary.issues.is_empty() && summary.healthy == 0;
        report.action(format!(
            "Health check: {}/{} server(s) healthy",
            summary.healthy, summary.total
        ));
        report.health = Some(summary);
        if none_healthy {
            return Err(Error::NoHealthyServers);
        }
        Ok(())
    }
}
