//! Resolved settings for one CLI invocation

use mcpsync_core::sync::CANONICAL_INDENT;
use mcpsync_core::{Settings, SyncEngine};
use mcpsync_fs::JsonStore;
use mcpsync_meta::{ServerMap, normalize_servers_key, servers_of};
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::cli::{Cli, StoreKind};
use crate::error::Result;

/// Settings with command-line overrides applied.
#[derive(Debug, Clone)]
pub struct Context {
    pub settings: Settings,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut settings = Settings::load(cli.config.as_deref())?;
        if let Some(path) = &cli.canonical {
            settings.canonical = Some(path.clone());
        }
        if let Some(path) = &cli.target {
            settings.target = Some(path.clone());
        }
        if let Some(path) = &cli.secrets {
            settings.secrets = Some(path.clone());
        }
        tracing::debug!(settings = ?settings, "Resolved settings");
        Ok(Self { settings })
    }

    pub fn store_path(&self, kind: StoreKind) -> PathBuf {
        match kind {
            StoreKind::Canonical => self.settings.canonical_path(),
            StoreKind::Target => self.settings.target_path(),
        }
    }

    /// The JSON store for `kind`, with that store's indentation.
    pub fn store(&self, kind: StoreKind) -> JsonStore {
        let store = JsonStore::new(self.store_path(kind));
        match kind {
            StoreKind::Canonical => store.with_indent(CANONICAL_INDENT),
            StoreKind::Target => store,
        }
    }

    /// Load the document of `kind` with the legacy servers key renamed.
    pub fn load(&self, kind: StoreKind) -> Result<Map<String, Value>> {
        let mut document = self.store(kind).load()?;
        normalize_servers_key(&mut document);
        Ok(document)
    }

    /// The server map of `kind`, or `None` when the store has none.
    pub fn servers(&self, kind: StoreKind) -> Result<Option<ServerMap>> {
        let document = self.load(kind)?;
        Ok(servers_of(&document).cloned())
    }

    pub fn sync_engine(&self) -> SyncEngine {
        self.settings.sync_engine()
    }
}
