//! Push/pull synchronization between the canonical and the target store
//!
//! This module provides:
//! - **diff**: server-level change sets and their text preview
//! - **merge**: the preserve-existing-secrets server merge
//! - **engine**: the push and pull pipelines

mod diff;
mod engine;
mod merge;

pub use diff::{ChangeKind, DeploymentDiff, FieldChange, ServerChange, ServerEntry, mask};
pub use engine::{CANONICAL_INDENT, Direction, SyncEngine, SyncOptions, SyncReport};
pub use merge::{MergeStats, merge_servers, preserve_secrets};
