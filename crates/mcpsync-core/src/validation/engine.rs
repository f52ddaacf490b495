//! Validation engine
//!
//! Runs the rule pipeline over one server configuration, optionally probes
//! its health and caches the outcome by content fingerprint.

use super::cache::ValidationCache;
use super::issue::{FixAction, IssueCategory, ValidationIssue};
use super::result::{ValidationResult, ValidationSummary};
use super::rules::{RuleContext, ValidationRule, default_rules};
use crate::health::{HealthProbe, SystemHealthProbe, guarded_probe, panic_message};
use indexmap::IndexMap;
use mcpsync_fs::fingerprint;
use serde_json::{Map, Value};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Per-call switches for [`ValidationEngine::validate_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Probe the server after running the rules
    pub check_health: bool,
    /// Serve and store results through the cache
    pub use_cache: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            check_health: false,
            use_cache: true,
        }
    }
}

impl ValidateOptions {
    pub fn with_health(mut self) -> Self {
        self.check_health = true;
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }
}

/// Rule-based validator for server configurations.
///
/// The engine is `Send + Sync`; share it behind an `Arc` to validate from
/// several threads against one cache.
pub struct ValidationEngine {
    rules: Vec<Box<dyn ValidationRule>>,
    cache: ValidationCache,
    probe: Arc<dyn HealthProbe>,
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationEngine {
    /// Engine with the standard rules, a default cache and the system probe.
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
            cache: ValidationCache::default(),
            probe: Arc::new(SystemHealthProbe::default()),
        }
    }

    pub fn with_cache(mut self, cache: ValidationCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn HealthProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Replace the rule pipeline.
    pub fn with_rules(mut self, rules: Vec<Box<dyn ValidationRule>>) -> Self {
        self.rules = rules;
        self
    }

    pub fn cache(&self) -> &ValidationCache {
        &self.cache
    }

    pub fn probe(&self) -> &dyn HealthProbe {
        self.probe.as_ref()
    }

    /// Validate with default options: cached, no health probe.
    pub fn validate(&self, server_name: &str, config: &Value) -> ValidationResult {
        self.validate_with(server_name, config, ValidateOptions::default())
    }

    pub fn validate_with(
        &self,
        server_name: &str,
        config: &Value,
        options: ValidateOptions,
    ) -> ValidationResult {
        let fingerprint = fingerprint(config);

        if options.use_cache
            && let Some(cached) = self.cache.get(server_name, &fingerprint)
            && (!options.check_health || cached.health_checked)
        {
            tracing::debug!(server = server_name, "Using cached validation result");
            return cached;
        }

        tracing::debug!(server = server_name, "Validating server configuration");
        let mut result = match config {
            Value::Object(map) => ValidationResult::new(server_name, self.run_rules(server_name, map)),
            _ => ValidationResult::new(
                server_name,
                vec![
                    ValidationIssue::error(
                        IssueCategory::Format,
                        "Server configuration must be a JSON object",
                    )
                    .with_fix(FixAction::FixFormat)
                    .with_auto_fixable(false),
                ],
            ),
        };

        if options.check_health {
            result.health_checked = true;
            let report = guarded_probe(self.probe.as_ref(), server_name, config);
            if report.healthy {
                result.health_status = Some("healthy".into());
            } else {
                let detail = report.detail.unwrap_or_else(|| "unhealthy".into());
                result.push_issue(
                    ValidationIssue::warning(
                        IssueCategory::Health,
                        format!("Health check failed: {detail}"),
                    )
                    .with_fix(FixAction::CheckRequirements),
                );
                result.health_status = Some(detail);
            }
        }

        if options.use_cache {
            self.cache.insert(server_name, &fingerprint, result.clone());
        }
        result
    }

    fn run_rules(&self, server_name: &str, config: &Map<String, Value>) -> Vec<ValidationIssue> {
        let ctx = RuleContext {
            server_name,
            config,
        };
        let mut issues = Vec::new();

        for rule in &self.rules {
            let failure = match catch_unwind(AssertUnwindSafe(|| rule.check(&ctx))) {
                Ok(Ok(found)) => {
                    issues.extend(found);
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(payload) => panic_message(payload.as_ref()),
            };
            tracing::warn!(rule = rule.name(), error = %failure, "Validation rule failed");
            issues.push(ValidationIssue::warning(
                IssueCategory::ValidatorError,
                format!("Validation rule '{}' failed: {failure}", rule.name()),
            ));
        }
        issues
    }

    /// Validate every server independently, keeping input order.
    pub fn validate_all(
        &self,
        servers: &Map<String, Value>,
        check_health: bool,
    ) -> IndexMap<String, ValidationResult> {
        tracing::info!(count = servers.len(), "Validating all server configurations");
        let options = ValidateOptions {
            check_health,
            ..ValidateOptions::default()
        };
        servers
            .iter()
            .map(|(name, config)| (name.clone(), self.validate_with(name, config, options)))
            .collect()
    }

    pub fn summarize(&self, results: &IndexMap<String, ValidationResult>) -> ValidationSummary {
        ValidationSummary::from_results(results.values())
    }

    /// Forget cached results for one server.
    pub fn invalidate(&self, server_name: &str) {
        self.cache.remove_server(server_name);
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
