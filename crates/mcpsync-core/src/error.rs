//! Error types for mcpsync-core

use crate::repair::RepairError;
use std::path::PathBuf;

/// Result type for mcpsync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mcpsync-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Fs(#[from] mcpsync_fs::Error),

    #[error(transparent)]
    Repair(#[from] RepairError),

    #[error("Server '{name}' not found in {path}")]
    ServerNotFound { name: String, path: PathBuf },

    #[error("{path} must contain 'mcpServers' or 'mcps'")]
    NoServerMap { path: PathBuf },

    #[error("'mcpServers' in {path} is not an object")]
    InvalidServerMap { path: PathBuf },

    #[error("Validation failed for {} server(s): {}", .servers.len(), .servers.join(", "))]
    ValidationFailed { servers: Vec<String> },

    #[error("No servers passed health checks")]
    NoHealthyServers,
}
