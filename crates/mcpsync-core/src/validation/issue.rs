//! Validation issue types

use serde::{Deserialize, Serialize};
use std::fmt;

/// How serious an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Advisory only
    Info,
    /// Lowers the score, never blocks
    Warning,
    /// Blocks validity and sync
    Error,
}

impl Severity {
    /// Points subtracted from the score for one issue of this severity.
    pub fn penalty(&self) -> u32 {
        match self {
            Self::Error => 30,
            Self::Warning => 10,
            Self::Info => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an issue is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    RequiredField,
    ApiKey,
    Format,
    CommonTypo,
    Path,
    Security,
    Suggestion,
    Health,
    MissingValue,
    ValidatorError,
}

impl IssueCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequiredField => "required_field",
            Self::ApiKey => "api_key",
            Self::Format => "format",
            Self::CommonTypo => "common_typo",
            Self::Path => "path",
            Self::Security => "security",
            Self::Suggestion => "suggestion",
            Self::Health => "health",
            Self::MissingValue => "missing_value",
            Self::ValidatorError => "validator_error",
        }
    }

    /// Categories whose issues are auto-fixable unless a rule says otherwise.
    pub fn auto_fixable_by_default(&self) -> bool {
        matches!(self, Self::Format | Self::CommonTypo)
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The corrective step a rule recommends for an issue.
///
/// Repair strategies dispatch on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixAction {
    SetServerType,
    AddCommand,
    AddUrl,
    FixFormat,
    FixArgsFormat,
    FixEnvFormat,
    FixUrlFormat,
    FixUrlProtocol,
    UpgradeToHttps,
    SetEnvValue,
    SetApiKey,
    VerifyApiKey,
    VerifyApiKeyFormat,
    CheckCommandPath,
    BrowseForCommand,
    FixPermissions,
    ParseJsonValue,
    FixJsonSyntax,
    FixFieldName,
    FixCommandName,
    PinPackageVersion,
    AddDescription,
    AddTags,
    SuggestEnvFile,
    CheckRequirements,
}

/// A single problem found in a server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub category: IssueCategory,
    pub message: String,
    /// Dotted path of the offending field, e.g. `env.API_KEY`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_action: Option<FixAction>,
    pub auto_fixable: bool,
}

impl ValidationIssue {
    /// Create an issue; `auto_fixable` follows the category default.
    pub fn new(severity: Severity, category: IssueCategory, message: impl Into<String>) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            field: None,
            suggested_value: None,
            fix_action: None,
            auto_fixable: category.auto_fixable_by_default(),
        }
    }

    pub fn error(category: IssueCategory, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, category, message)
    }

    pub fn warning(category: IssueCategory, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, category, message)
    }

    pub fn info(category: IssueCategory, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, category, message)
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_suggestion(mut self, value: impl Into<String>) -> Self {
        self.suggested_value = Some(value.into());
        self
    }

    pub fn with_fix(mut self, action: FixAction) -> Self {
        self.fix_action = Some(action);
        self
    }

    /// Override the category default.
    pub fn with_auto_fixable(mut self, auto_fixable: bool) -> Self {
        self.auto_fixable = auto_fixable;
        self
    }

    /// Variable name for issues raised against `env.<NAME>`.
    pub fn env_key(&self) -> Option<&str> {
        self.field.as_deref()?.strip_prefix("env.")
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)?;
        if let Some(field) = &self.field {
            write!(f, " ({field})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_fixable_follows_category() {
        assert!(ValidationIssue::warning(IssueCategory::CommonTypo, "x").auto_fixable);
        assert!(ValidationIssue::error(IssueCategory::Format, "x").auto_fixable);
        assert!(!ValidationIssue::error(IssueCategory::RequiredField, "x").auto_fixable);
        assert!(!ValidationIssue::info(IssueCategory::Suggestion, "x").auto_fixable);
    }

    #[test]
    fn auto_fixable_can_be_overridden() {
        let issue = ValidationIssue::error(IssueCategory::RequiredField, "bad type")
            .with_auto_fixable(true);
        assert!(issue.auto_fixable);
        let issue = ValidationIssue::error(IssueCategory::Format, "x").with_auto_fixable(false);
        assert!(!issue.auto_fixable);
    }

    #[test]
    fn env_key_from_field() {
        let issue = ValidationIssue::warning(IssueCategory::ApiKey, "x").with_field("env.TOKEN");
        assert_eq!(issue.env_key(), Some("TOKEN"));
        let issue = ValidationIssue::warning(IssueCategory::Path, "x").with_field("command");
        assert_eq!(issue.env_key(), None);
    }

    #[test]
    fn serializes_tags_in_snake_case() {
        let issue = ValidationIssue::warning(IssueCategory::CommonTypo, "typo")
            .with_fix(FixAction::FixFieldName);
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["category"], "common_typo");
        assert_eq!(json["fix_action"], "fix_field_name");
        assert!(json.get("field").is_none());
    }

    #[test]
    fn display_includes_field() {
        let issue = ValidationIssue::error(IssueCategory::RequiredField, "Missing required field: command")
            .with_field("command");
        assert_eq!(
            issue.to_string(),
            "[error] Missing required field: command (command)"
        );
    }
}
