//! Workspace settings
//!
//! Settings come from `mcpsync.toml`. Every field is optional; unset paths
//! fall back to the conventional dotfiles layout.

use crate::health::SystemHealthProbe;
use crate::portability::{CommandAdapter, HostFamily};
use crate::sync::SyncEngine;
use crate::validation::{ValidationCache, ValidationEngine};
use crate::Result;
use mcpsync_fs::ConfigStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Settings file looked up in the working directory.
pub const SETTINGS_FILE: &str = "mcpsync.toml";

/// File name of the canonical registry.
pub const CANONICAL_FILE: &str = "mcp-servers.json";

/// Target store inside the home directory.
pub const TARGET_FILE: &str = ".claude.json";

/// Secrets file relative to the canonical store's directory.
pub const SECRETS_RELATIVE_PATH: &str = "secrets/api-keys/mcp-env.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    pub cache_ttl_secs: u64,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            cache_ttl_secs: crate::validation::DEFAULT_TTL.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthSettings {
    pub http_timeout_secs: u64,
    pub docker_timeout_secs: u64,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            http_timeout_secs: crate::health::DEFAULT_HTTP_TIMEOUT.as_secs(),
            docker_timeout_secs: crate::health::DEFAULT_DOCKER_TIMEOUT.as_secs(),
        }
    }
}

/// Contents of `mcpsync.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secrets: Option<PathBuf>,
    /// Overrides the detected host family
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<HostFamily>,
    pub validation: ValidationSettings,
    pub health: HealthSettings,
}

impl Settings {
    /// Load settings from `path`, or from `mcpsync.toml` in the working
    /// directory when it exists, or defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit `path` is missing or any settings
    /// file cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let store = ConfigStore::new();
        if let Some(path) = path {
            return Ok(store.load(path)?);
        }
        let local = Path::new(SETTINGS_FILE);
        if local.is_file() {
            tracing::debug!(path = %local.display(), "Loading settings");
            return Ok(store.load(local)?);
        }
        Ok(Self::default())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        Ok(ConfigStore::new().save(path, self)?)
    }

    pub fn canonical_path(&self) -> PathBuf {
        match &self.canonical {
            Some(path) => expand_home(path),
            None => find_canonical(&std::env::current_dir().unwrap_or_default()),
        }
    }

    pub fn target_path(&self) -> PathBuf {
        match &self.target {
            Some(path) => expand_home(path),
            None => dirs::home_dir().unwrap_or_default().join(TARGET_FILE),
        }
    }

    pub fn secrets_path(&self) -> PathBuf {
        match &self.secrets {
            Some(path) => expand_home(path),
            None => {
                let canonical = self.canonical_path();
                let dir = canonical.parent().unwrap_or(Path::new(""));
                dir.join(SECRETS_RELATIVE_PATH)
            }
        }
    }

    pub fn host_family(&self) -> HostFamily {
        self.host.unwrap_or_else(HostFamily::current)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.validation.cache_ttl_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.health.http_timeout_secs)
    }

    pub fn docker_timeout(&self) -> Duration {
        Duration::from_secs(self.health.docker_timeout_secs)
    }

    /// A validation engine using these cache and probe settings.
    pub fn validation_engine(&self) -> ValidationEngine {
        ValidationEngine::new()
            .with_cache(ValidationCache::new(self.cache_ttl()))
            .with_probe(Arc::new(SystemHealthProbe::new(
                self.http_timeout(),
                self.docker_timeout(),
            )))
    }

    /// A sync engine for the configured stores.
    pub fn sync_engine(&self) -> SyncEngine {
        SyncEngine::new(self.canonical_path(), self.target_path(), self.secrets_path())
            .with_adapter(CommandAdapter::new(self.host_family()))
            .with_validator(self.validation_engine())
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

/// Locate the canonical registry: `start`, its parent, then `~/dotfiles`.
///
/// Falls back to `start/mcp-servers.json`.
pub fn find_canonical(start: &Path) -> PathBuf {
    let mut candidates = vec![start.to_path_buf()];
    if let Some(parent) = start.parent() {
        candidates.push(parent.to_path_buf());
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join("dotfiles"));
    }

    candidates
        .into_iter()
        .map(|dir| dir.join(CANONICAL_FILE))
        .find(|candidate| candidate.is_file())
        .unwrap_or_else(|| {
            tracing::debug!(dir = %start.display(), "No canonical store found, using working directory");
            start.join(CANONICAL_FILE)
        })
}
