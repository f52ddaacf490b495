//! Rule-based validation of server configurations

pub mod cache;
pub mod engine;
pub mod issue;
pub mod result;
pub mod rules;

pub use cache::{Clock, DEFAULT_TTL, ManualClock, SystemClock, ValidationCache};
pub use engine::{ValidateOptions, ValidationEngine};
pub use issue::{FixAction, IssueCategory, Severity, ValidationIssue};
pub use result::{VALID_SCORE_THRESHOLD, ValidationResult, ValidationSummary};
pub use rules::{RuleContext, RuleError, ValidationRule, default_rules};
