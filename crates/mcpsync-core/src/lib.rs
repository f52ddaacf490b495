//! Core engines for mcpsync
//!
//! This crate implements the three coupled subsystems that keep MCP server
//! definitions consistent between a canonical registry and an application's
//! own config file:
//!
//! - **Validation**: ordered rules, a 0-100 score, a fingerprint-keyed cache
//!   and optional health probes
//! - **Repair**: strategies turning issues into ranked, confidence-scored
//!   suggestions applied to copies of a configuration
//! - **Sync**: push/pull with a secrets vault, launch command portability,
//!   a rendered diff, backups and atomic writes
//!
//! # Architecture
//!
//! `mcpsync-core` sits above the Layer 0 crates and below the CLI:
//!
//! ```text
//!                  mcpsync-cli
//!                       |
//!                  mcpsync-core
//!                       |
//!              +--------+--------+
//!              |                 |
//!         mcpsync-fs       mcpsync-meta
//! ```
//!
//! # Example
//!
//! ```no_run
//! use mcpsync_core::{ValidationEngine, RepairEngine};
//! use serde_json::json;
//!
//! let config = json!({"type": "http", "url": "example.com/api"});
//! let result = ValidationEngine::new().validate("api", &config);
//! let repairs = RepairEngine::new();
//! for suggestion in repairs.analyze_issues(&result, &config) {
//!     let outcome = repairs.apply_suggestion(&suggestion, &config, false);
//!     println!("{}: {}", suggestion.title, outcome.config);
//! }
//! ```

pub mod config;
pub mod error;
pub mod health;
pub mod portability;
pub mod repair;
pub mod secrets;
pub mod sync;
pub mod validation;

pub use config::Settings;
pub use error::{Error, Result};
pub use health::{HealthProbe, HealthReport, HealthSummary, SystemHealthProbe, health_check_all};
pub use portability::{CommandAdapter, HostFamily};
pub use repair::{RepairAction, RepairEngine, RepairError, RepairSuggestion, SuggestionOutcome};
pub use secrets::{PlaceholderRef, SecretsStore, SecretsVault};
pub use sync::{DeploymentDiff, Direction, SyncEngine, SyncOptions, SyncReport};
pub use validation::{
    IssueCategory, Severity, ValidateOptions, ValidationEngine, ValidationIssue, ValidationResult,
    ValidationSummary,
};
