//! Validation results and summaries

use super::issue::{IssueCategory, Severity, ValidationIssue};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Minimum score for a result to count as valid.
pub const VALID_SCORE_THRESHOLD: u32 = 70;

/// Outcome of validating one server configuration.
///
/// `score` and `valid` are derived from the issue list, which can only be
/// changed through methods that recompute them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ResultRecord")]
pub struct ValidationResult {
    pub server_name: String,
    valid: bool,
    issues: Vec<ValidationIssue>,
    score: u32,
    pub timestamp: DateTime<Utc>,
    pub health_checked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_status: Option<String>,
}

/// Serialized form of [`ValidationResult`]. Stored `valid` and `score` are
/// ignored and derived again from the issues.
#[derive(Deserialize)]
struct ResultRecord {
    server_name: String,
    issues: Vec<ValidationIssue>,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    health_checked: bool,
    #[serde(default)]
    health_status: Option<String>,
}

impl From<ResultRecord> for ValidationResult {
    fn from(record: ResultRecord) -> Self {
        let mut result = Self {
            server_name: record.server_name,
            valid: true,
            issues: record.issues,
            score: 100,
            timestamp: record.timestamp,
            health_checked: record.health_checked,
            health_status: record.health_status,
        };
        result.recompute();
        result
    }
}

impl ValidationResult {
    pub fn new(server_name: impl Into<String>, issues: Vec<ValidationIssue>) -> Self {
        let mut result = Self {
            server_name: server_name.into(),
            valid: true,
            issues,
            score: 100,
            timestamp: Utc::now(),
            health_checked: false,
            health_status: None,
        };
        result.recompute();
        result
    }

    pub fn valid(&self) -> bool {
        self.valid
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn push_issue(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
        self.recompute();
    }

    pub fn clear_issues(&mut self) {
        self.issues.clear();
        self.recompute();
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    fn recompute(&mut self) {
        let penalty: u32 = self.issues.iter().map(|i| i.severity.penalty()).sum();
        self.score = 100u32.saturating_sub(penalty);
        self.valid = self.score >= VALID_SCORE_THRESHOLD && !self.has_errors();
    }
}

/// Aggregate statistics over many results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    /// Mean score rounded to one decimal place
    pub average_score: f64,
    pub issues_by_category: IndexMap<IssueCategory, usize>,
    pub issues_by_severity: IndexMap<Severity, usize>,
}

impl ValidationSummary {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a ValidationResult>) -> Self {
        let mut summary = Self {
            total: 0,
            valid: 0,
            invalid: 0,
            average_score: 0.0,
            issues_by_category: IndexMap::new(),
            issues_by_severity: IndexMap::new(),
        };
        let mut score_total = 0u64;

        for result in results {
            summary.total += 1;
            if result.valid() {
                summary.valid += 1;
            } else {
                summary.invalid += 1;
            }
            score_total += u64::from(result.score());
            for issue in result.issues() {
                *summary.issues_by_category.entry(issue.category).or_default() += 1;
                *summary.issues_by_severity.entry(issue.severity).or_default() += 1;
            }
        }

        if summary.total > 0 {
            let mean = score_total as f64 / summary.total as f64;
            summary.average_score = (mean * 10.0).round() / 10.0;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn issue(severity: Severity) -> ValidationIssue {
        ValidationIssue::new(severity, IssueCategory::Suggestion, "x")
    }

    #[test]
    fn deserializing_recomputes_score_and_validity() {
        let result = ValidationResult::new("a", vec![issue(Severity::Error)]);
        let mut json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["score"], serde_json::json!(70));
        json["valid"] = serde_json::json!(true);
        json["score"] = serde_json::json!(100);

        let restored: ValidationResult = serde_json::from_value(json).unwrap();
        assert_eq!(restored.score(), 70);
        assert!(!restored.valid());
        assert_eq!(restored, result);
    }

    #[test]
    fn no_issues_is_perfect() {
        let result = ValidationResult::new("a", vec![]);
        assert_eq!(result.score(), 100);
        assert!(result.valid());
    }

    #[test]
    fn single_error_is_invalid_even_with_high_score() {
        let result = ValidationResult::new("a", vec![issue(Severity::Error)]);
        assert_eq!(result.score(), 70);
        assert!(!result.valid());
    }

    #[test]
    fn warnings_can_drop_below_threshold() {
        let result = ValidationResult::new("a", vec![issue(Severity::Warning); 4]);
        assert_eq!(result.score(), 60);
        assert!(!result.valid());
    }

    #[test]
    fn score_floors_at_zero() {
        let result = ValidationResult::new("a", vec![issue(Severity::Error); 5]);
        assert_eq!(result.score(), 0);
    }

    #[test]
    fn push_issue_recomputes() {
        let mut result = ValidationResult::new("a", vec![issue(Severity::Info)]);
        assert_eq!(result.score(), 95);
        result.push_issue(issue(Severity::Error));
        assert_eq!(result.score(), 65);
        assert!(!result.valid());
        result.clear_issues();
        assert_eq!(result.score(), 100);
        assert!(result.valid());
    }

    #[test]
    fn summary_counts_and_rounds() {
        let results = [
            ValidationResult::new("a", vec![]),
            ValidationResult::new("b", vec![issue(Severity::Info)]),
            ValidationResult::new("c", vec![issue(Severity::Error)]),
        ];
        let summary = ValidationSummary::from_results(&results);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.valid, 2);
        assert_eq!(summary.invalid, 1);
        assert_eq!(summary.average_score, 88.3);
        assert_eq!(summary.issues_by_category[&IssueCategory::Suggestion], 2);
        assert_eq!(summary.issues_by_severity[&Severity::Error], 1);
    }

    #[test]
    fn empty_summary() {
        let summary = ValidationSummary::from_results(std::iter::empty());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.average_score, 0.0);
    }

    fn severity() -> impl Strategy<Value = Severity> {
        prop_oneof![
            Just(Severity::Info),
            Just(Severity::Warning),
            Just(Severity::Error)
        ]
    }

    proptest! {
        #[test]
        fn adding_an_issue_never_raises_the_score(
            existing in proptest::collection::vec(severity(), 0..8),
            extra in severity(),
        ) {
            let mut result = ValidationResult::new("p", existing.into_iter().map(issue).collect());
            let before = result.score();
            result.push_issue(issue(extra));
            prop_assert!(result.score() <= before);
        }

        #[test]
        fn validity_rule_holds(severities in proptest::collection::vec(severity(), 0..8)) {
            let result = ValidationResult::new("p", severities.into_iter().map(issue).collect());
            let expected = result.score() >= VALID_SCORE_THRESHOLD && !result.has_errors();
            prop_assert_eq!(result.valid(), expected);
        }
    }
}
