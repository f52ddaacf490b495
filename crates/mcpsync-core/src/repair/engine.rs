//! Grouping, ranking and application of repair actions

use super::action::{RepairAction, RepairError};
use super::strategy::{RepairStrategy, default_strategies};
use crate::validation::{IssueCategory, Severity, ValidationIssue, ValidationResult};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};

const AUTO_ACTION_SECS: u64 = 5;
const MANUAL_ACTION_SECS: u64 = 60;

/// A ranked bundle of actions for issues sharing a category and severity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepairSuggestion {
    pub suggestion_id: String,
    pub title: String,
    pub description: String,
    pub issues_addressed: Vec<ValidationIssue>,
    pub actions: Vec<RepairAction>,
    pub estimated_time: String,
    pub success_rate: f64,
}

impl RepairSuggestion {
    /// Mean action confidence, or 0 without actions.
    pub fn confidence(&self) -> f64 {
        if self.actions.is_empty() {
            return 0.0;
        }
        self.actions.iter().map(|a| a.confidence).sum::<f64>() / self.actions.len() as f64
    }

    pub fn is_fully_automatic(&self) -> bool {
        self.actions.iter().all(|a| !a.needs_confirmation())
    }
}

/// Result of applying a suggestion.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionOutcome {
    pub success: bool,
    /// The configuration after every action that succeeded
    pub config: Value,
    /// Ids of the applied actions, in order
    pub applied: Vec<String>,
    /// Skip notes and action failures
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairKind {
    Action,
    Suggestion,
}

/// One entry of the repair history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepairRecord {
    pub timestamp: DateTime<Utc>,
    pub kind: RepairKind,
    pub id: String,
    pub title: String,
    pub success: bool,
    pub applied: usize,
    pub total: usize,
    pub errors: Vec<String>,
}

/// Static success estimate per category.
pub fn success_rate(category: IssueCategory) -> f64 {
    match category {
        IssueCategory::Format => 0.9,
        IssueCategory::CommonTypo => 0.95,
        IssueCategory::RequiredField => 0.6,
        IssueCategory::ApiKey => 0.4,
        IssueCategory::Path => 0.7,
        IssueCategory::Suggestion => 0.8,
        _ => 0.5,
    }
}

/// Human-readable effort estimate for a set of actions.
pub fn estimate_time(actions: &[RepairAction]) -> String {
    let secs: u64 = actions
        .iter()
        .map(|a| {
            if a.auto_applicable {
                AUTO_ACTION_SECS
            } else {
                MANUAL_ACTION_SECS
            }
        })
        .sum();
    if secs < 60 {
        format!("{secs} seconds")
    } else {
        format!("{} minute(s)", secs / 60)
    }
}

/// Turns validation results into suggestions and applies them.
pub struct RepairEngine {
    strategies: Vec<Box<dyn RepairStrategy>>,
    history: Mutex<Vec<RepairRecord>>,
}

impl Default for RepairEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RepairEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("RepairEngine")
            .field("strategies", &names)
            .finish_non_exhaustive()
    }
}

impl RepairEngine {
    pub fn new() -> Self {
        Self::with_strategies(default_strategies())
    }

    pub fn with_strategies(strategies: Vec<Box<dyn RepairStrategy>>) -> Self {
        Self {
            strategies,
            history: Mutex::new(Vec::new()),
        }
    }

    fn action_for(
        &self,
        issue: &ValidationIssue,
        server_name: &str,
        config: &Value,
    ) -> Option<RepairAction> {
        let strategy = self.strategies.iter().find(|s| s.can_handle(issue))?;
        tracing::debug!(strategy = strategy.name(), issue = %issue, "Creating repair action");
        strategy.create_action(issue, server_name, config)
    }

    /// Build ranked suggestions for every issue of `result`.
    pub fn analyze_issues(&self, result: &ValidationResult, config: &Value) -> Vec<RepairSuggestion> {
        let server = result.server_name.as_str();
        let mut groups: IndexMap<(IssueCategory, Severity), Vec<&ValidationIssue>> = IndexMap::new();
        for issue in result.issues() {
            groups
                .entry((issue.category, issue.severity))
                .or_default()
                .push(issue);
        }

        let mut suggestions: Vec<RepairSuggestion> = groups
            .into_iter()
            .filter_map(|((category, severity), issues)| {
                let actions: Vec<RepairAction> = issues
                    .iter()
                    .filter_map(|issue| self.action_for(issue, server, config))
                    .collect();
                if actions.is_empty() {
                    return None;
                }
                let count = issues.len();
                Some(RepairSuggestion {
                    suggestion_id: format!("{server}_{category}_{severity}_{count}"),
                    title: format!("Fix {count} {severity} {category} issue(s)"),
                    description: format!("Address {category} issues in {server}"),
                    issues_addressed: issues.into_iter().cloned().collect(),
                    estimated_time: estimate_time(&actions),
                    success_rate: success_rate(category),
                    actions,
                })
            })
            .collect();

        suggestions.sort_by(|a, b| {
            b.confidence()
                .total_cmp(&a.confidence())
                .then_with(|| b.issues_addressed.len().cmp(&a.issues_addressed.len()))
        });
        tracing::debug!(server, count = suggestions.len(), "Analyzed repair suggestions");
        suggestions
    }

    /// Apply one action to a copy of `config`.
    pub fn apply_action(&self, action: &RepairAction, config: &Value) -> Result<Value, RepairError> {
        let outcome = action.apply(config);
        let errors = match &outcome {
            Ok(_) => {
                tracing::info!(action = %action.action_id, "Applied repair action");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(action = %action.action_id, error = %e, "Repair action failed");
                vec![e.to_string()]
            }
        };
        self.record(RepairRecord {
            timestamp: Utc::now(),
            kind: RepairKind::Action,
            id: action.action_id.clone(),
            title: action.title.clone(),
            success: outcome.is_ok(),
            applied: usize::from(outcome.is_ok()),
            total: 1,
            errors,
        });
        outcome
    }

    /// Apply every action of `suggestion` in order.
    ///
    /// Actions that need confirmation are skipped unless `skip_confirmations`.
    pub fn apply_suggestion(
        &self,
        suggestion: &RepairSuggestion,
        config: &Value,
        skip_confirmations: bool,
    ) -> SuggestionOutcome {
        let mut current = config.clone();
        let mut applied = Vec::new();
        let mut errors = Vec::new();

        for action in &suggestion.actions {
            if !skip_confirmations && action.destructive {
                errors.push(format!("Skipped destructive action: {}", action.title));
                continue;
            }
            if !skip_confirmations && !action.auto_applicable {
                errors.push(format!("Skipped manual action: {}", action.title));
                continue;
            }
            match action.apply(&current) {
                Ok(next) => {
                    current = next;
                    applied.push(action.action_id.clone());
                }
                Err(e) => errors.push(format!("{}: {e}", action.title)),
            }
        }

        let success = !applied.is_empty() && errors.is_empty();
        tracing::info!(
            suggestion = %suggestion.suggestion_id,
            applied = applied.len(),
            errors = errors.len(),
            "Applied repair suggestion"
        );
        self.record(RepairRecord {
            timestamp: Utc::now(),
            kind: RepairKind::Suggestion,
            id: suggestion.suggestion_id.clone(),
            title: suggestion.title.clone(),
            success,
            applied: applied.len(),
            total: suggestion.actions.len(),
            errors: errors.clone(),
        });

        SuggestionOutcome {
            success,
            config: current,
            applied,
            errors,
        }
    }

    /// Apply suggestions one after another, threading the config through.
    pub fn apply_all(
        &self,
        suggestions: &[RepairSuggestion],
        config: &Value,
        skip_confirmations: bool,
    ) -> SuggestionOutcome {
        let mut total = SuggestionOutcome {
            success: false,
            config: config.clone(),
            applied: Vec::new(),
            errors: Vec::new(),
        };
        for suggestion in suggestions {
            let outcome = self.apply_suggestion(suggestion, &total.config, skip_confirmations);
            total.config = outcome.config;
            total.applied.extend(outcome.applied);
            total.errors.extend(outcome.errors);
        }
        total.success = !total.applied.is_empty() && total.errors.is_empty();
        total
    }

    /// Applied actions and suggestions, oldest first.
    pub fn history(&self) -> Vec<RepairRecord> {
        self.lock_history().clone()
    }

    pub fn clear_history(&self) {
        self.lock_history().clear();
    }

    fn record(&self, record: RepairRecord) {
        self.lock_history().push(record);
    }

    fn lock_history(&self) -> MutexGuard<'_, Vec<RepairRecord>> {
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }
}
