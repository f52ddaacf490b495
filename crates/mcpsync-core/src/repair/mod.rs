//! Repair of validation issues
//!
//! Strategies map each issue to a [`RepairAction`] carrying a data-only
//! [`RepairTransform`]; the [`RepairEngine`] groups actions into ranked
//! [`RepairSuggestion`]s and applies them to copies of a configuration.

pub mod action;
pub mod engine;
pub mod strategy;

pub use action::{RepairAction, RepairError, RepairTransform};
pub use engine::{
    RepairEngine, RepairKind, RepairRecord, RepairSuggestion, SuggestionOutcome, estimate_time,
    success_rate,
};
pub use strategy::{
    ApiKeyStrategy, FormatStrategy, PathStrategy, RepairStrategy, RequiredFieldStrategy,
    SuggestionStrategy, TypoStrategy, default_strategies,
};
