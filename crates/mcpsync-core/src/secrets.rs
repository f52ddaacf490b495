//! Secrets vault
//!
//! Real credential values live in a side file keyed by server name and
//! variable name, so the portable server stores only ever carry
//! placeholders. Top-level keys starting with `_` are comments: they survive
//! every save but never take part in merging.

use crate::Result;
use indexmap::IndexMap;
use mcpsync_fs::{JsonStore, backup_file};
use mcpsync_meta::{ServerMap, is_placeholder, is_secret_like, placeholder_for};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

const COMMENT_PREFIX: char = '_';

fn is_comment(key: &str) -> bool {
    key.starts_with(COMMENT_PREFIX)
}

/// Server name to variable name to real value, insertion-ordered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecretsStore {
    servers: IndexMap<String, IndexMap<String, Value>>,
}

impl SecretsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, server: &str, variable: &str) -> Option<&Value> {
        self.servers.get(server)?.get(variable)
    }

    pub fn server(&self, server: &str) -> Option<&IndexMap<String, Value>> {
        self.servers.get(server)
    }

    pub fn insert(&mut self, server: impl Into<String>, variable: impl Into<String>, value: Value) {
        self.servers
            .entry(server.into())
            .or_default()
            .insert(variable.into(), value);
    }

    /// Fold `other` into this store, `other` winning on conflicts.
    pub fn extend(&mut self, other: SecretsStore) {
        for (server, vars) in other.servers {
            self.servers.entry(server).or_default().extend(vars);
        }
    }

    pub fn servers(&self) -> impl Iterator<Item = (&String, &IndexMap<String, Value>)> {
        self.servers.iter()
    }

    /// Number of servers with at least one stored value
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Total number of stored values
    pub fn value_count(&self) -> usize {
        self.servers.values().map(IndexMap::len).sum()
    }

    fn from_document(document: Map<String, Value>) -> Self {
        let mut store = Self::new();
        for (server, vars) in document {
            if is_comment(&server) {
                continue;
            }
            let Value::Object(vars) = vars else {
                tracing::warn!(server = %server, "Ignoring secrets entry that is not an object");
                continue;
            };
            store.servers.insert(server, vars.into_iter().collect());
        }
        store
    }

    fn into_document(self) -> Map<String, Value> {
        self.servers
            .into_iter()
            .map(|(server, vars)| (server, Value::Object(vars.into_iter().collect())))
            .collect()
    }
}

/// A still-unfilled credential found in a server map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceholderRef {
    pub server: String,
    pub variable: String,
    pub value: String,
}

/// The on-disk secrets file.
#[derive(Debug, Clone)]
pub struct SecretsVault {
    store: JsonStore,
}

impl SecretsVault {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: JsonStore::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Load stored secrets without comment entries.
    ///
    /// A missing file is empty. A file that is not a JSON object is also
    /// treated as empty, with a warning.
    pub fn load(&self) -> Result<SecretsStore> {
        let document = match self.store.load() {
            Ok(document) => document,
            Err(e @ (mcpsync_fs::Error::Parse { .. } | mcpsync_fs::Error::NotAnObject { .. })) => {
                tracing::warn!(path = %self.path().display(), error = %e, "Could not load secrets file");
                return Ok(SecretsStore::new());
            }
            Err(e) => return Err(e.into()),
        };
        let store = SecretsStore::from_document(document);
        tracing::info!(path = %self.path().display(), servers = store.len(), "Loaded secrets");
        Ok(store)
    }

    /// Write `secrets`, keeping comment entries already in the file.
    ///
    /// The current file is backed up first. A file that cannot be parsed is
    /// an error and stays untouched.
    pub fn save(&self, secrets: &SecretsStore) -> Result<()> {
        let existing = self.store.load()?;
        backup_file(self.path())?;
        let mut document: Map<String, Value> = existing
            .into_iter()
            .filter(|(key, _)| is_comment(key))
            .collect();
        document.extend(secrets.clone().into_document());
        self.store.save(&document)?;
        tracing::info!(path = %self.path().display(), servers = secrets.len(), "Saved secrets");
        Ok(())
    }
}

fn env_of(config: &Value) -> Option<&Map<String, Value>> {
    config.get("env")?.as_object()
}

fn env_of_mut(config: &mut Value) -> Option<&mut Map<String, Value>> {
    config.get_mut("env")?.as_object_mut()
}

/// Fill placeholders in `servers` with stored values.
///
/// A value is replaced only when it is a placeholder and the stored value is
/// not. Variables absent from a server's `env` are not added.
pub fn merge(servers: &ServerMap, secrets: &SecretsStore) -> ServerMap {
    let mut merged = servers.clone();
    let mut loaded = 0usize;

    for (name, config) in merged.iter_mut() {
        let Some(stored) = secrets.server(name) else {
            continue;
        };
        let Some(env) = env_of_mut(config) else {
            continue;
        };
        for (variable, value) in env.iter_mut() {
            if let Some(secret) = stored.get(variable)
                && is_placeholder(value)
                && !is_placeholder(secret)
            {
                *value = secret.clone();
                loaded += 1;
                tracing::debug!(server = %name, variable = %variable, "Loaded secret for server");
            }
        }
    }

    if loaded > 0 {
        tracing::info!(count = loaded, "Merged secrets into server configurations");
    }
    merged
}

/// Collect real values of secret-like variables.
pub fn extract(servers: &ServerMap) -> SecretsStore {
    let mut store = SecretsStore::new();
    for (name, config) in servers {
        let Some(env) = env_of(config) else {
            continue;
        };
        for (variable, value) in env {
            if is_secret_like(variable) && !is_placeholder(value) {
                store.insert(name.clone(), variable.clone(), value.clone());
            }
        }
    }
    if !store.is_empty() {
        tracing::info!(count = store.value_count(), "Extracted secrets from server configurations");
    }
    store
}

/// Replace every real secret-like value with a descriptive placeholder.
pub fn sanitize(servers: &ServerMap) -> ServerMap {
    let mut sanitized = servers.clone();
    let mut count = 0usize;

    for (name, config) in sanitized.iter_mut() {
        let Some(env) = env_of_mut(config) else {
            continue;
        };
        for (variable, value) in env.iter_mut() {
            if is_secret_like(variable) && !is_placeholder(value) {
                *value = Value::String(placeholder_for(variable));
                count += 1;
                tracing::debug!(server = %name, variable = %variable, "Sanitized secret");
            }
        }
    }

    if count > 0 {
        tracing::info!(count, "Sanitized secrets");
    }
    sanitized
}

/// Every env value that still needs a real secret.
pub fn find_placeholders(servers: &ServerMap) -> Vec<PlaceholderRef> {
    servers
        .iter()
        .filter_map(|(name, config)| env_of(config).map(|env| (name, env)))
        .flat_map(|(name, env)| {
            env.iter()
                .filter(|(_, value)| is_placeholder(value))
                .map(move |(variable, value)| PlaceholderRef {
                    server: name.clone(),
                    variable: variable.clone(),
                    value: value.as_str().unwrap_or_default().to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn servers(value: Value) -> ServerMap {
        value.as_object().cloned().unwrap()
    }

    fn store_of(value: Value) -> SecretsStore {
        SecretsStore::from_document(servers(value))
    }

    #[test]
    fn merge_fills_placeholders_only() {
        let input = servers(json!({
            "gh": {"env": {"GITHUB_TOKEN": "YOUR_TOKEN_HERE", "OTHER": "keep"}},
            "ai": {"env": {"API_KEY": "already-real-value"}}
        }));
        let secrets = store_of(json!({
            "gh": {"GITHUB_TOKEN": "ghp_real", "OTHER": "ignored", "EXTRA": "x"},
            "ai": {"API_KEY": "from-vault"}
        }));

        let merged = merge(&input, &secrets);
        assert_eq!(merged["gh"]["env"], json!({"GITHUB_TOKEN": "ghp_real", "OTHER": "keep"}));
        assert_eq!(merged["ai"]["env"]["API_KEY"], json!("already-real-value"));
        assert_eq!(input["gh"]["env"]["GITHUB_TOKEN"], json!("YOUR_TOKEN_HERE"));
    }

    #[test]
    fn merge_skips_placeholder_secrets() {
        let input = servers(json!({"s": {"env": {"API_KEY": ""}}}));
        let secrets = store_of(json!({"s": {"API_KEY": "REPLACE_ME"}}));
        assert_eq!(merge(&input, &secrets)["s"]["env"]["API_KEY"], json!(""));
    }

    #[test]
    fn extract_takes_real_secret_like_values() {
        let input = servers(json!({
            "a": {"env": {"API_KEY": "real", "DEBUG": "1", "DB_PASS": "hunter2", "TOKEN": "YOUR_TOKEN_HERE"}},
            "b": {"command": "node"},
            "c": {"env": {"LOG_LEVEL": "info"}}
        }));
        let store = extract(&input);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a", "API_KEY"), Some(&json!("real")));
        assert_eq!(store.get("a", "DB_PASS"), Some(&json!("hunter2")));
        assert_eq!(store.get("a", "TOKEN"), None);
        assert_eq!(store.value_count(), 2);
    }

    #[test]
    fn sanitize_writes_descriptive_placeholders() {
        let input = servers(json!({
            "s": {"env": {
                "OPENAI_API_KEY": "sk-123",
                "GITHUB_TOKEN": "ghp_x",
                "CLIENT_SECRET": "s",
                "DB_PASS": "p",
                "MODE": "prod"
            }}
        }));
        let out = sanitize(&input);
        assert_eq!(
            out["s"]["env"],
            json!({
                "OPENAI_API_KEY": "YOUR_API_KEY_HERE",
                "GITHUB_TOKEN": "YOUR_TOKEN_HERE",
                "CLIENT_SECRET": "YOUR_SECRET_HERE",
                "DB_PASS": "YOUR_DB_PASS_HERE",
                "MODE": "prod"
            })
        );
        assert_eq!(sanitize(&out), out);
    }

    #[test]
    fn find_placeholders_lists_unfilled_values() {
        let input = servers(json!({
            "a": {"env": {"API_KEY": "YOUR_API_KEY_HERE", "HOST": "x"}},
            "b": {"env": {"EMPTY": ""}}
        }));
        let found = find_placeholders(&input);
        assert_eq!(
            found,
            vec![
                PlaceholderRef {
                    server: "a".into(),
                    variable: "API_KEY".into(),
                    value: "YOUR_API_KEY_HERE".into()
                },
                PlaceholderRef {
                    server: "b".into(),
                    variable: "EMPTY".into(),
                    value: String::new()
                },
            ]
        );
    }

    #[test]
    fn vault_round_trip_keeps_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp-env.json");
        std::fs::write(
            &path,
            r#"{"_comment": "do not commit", "old": {"API_KEY": "k"}}"#,
        )
        .unwrap();

        let vault = SecretsVault::new(&path);
        let mut store = vault.load().unwrap();
        assert_eq!(store.len(), 1);
        store.insert("new", "TOKEN", json!("t"));
        vault.save(&store).unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            raw,
            json!({"_comment": "do not commit", "old": {"API_KEY": "k"}, "new": {"TOKEN": "t"}})
        );
        let keys: Vec<_> = raw.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys[0], "_comment");
    }

    fn backups_in(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".backup."))
            .count()
    }

    #[test]
    fn save_backs_up_the_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp-env.json");
        std::fs::write(&path, r#"{"gh": {"GITHUB_TOKEN": "ghp_real123456"}}"#).unwrap();

        let vault = SecretsVault::new(&path);
        let mut store = vault.load().unwrap();
        store.insert("other", "API_KEY", json!("sk-other-123456"));
        vault.save(&store).unwrap();

        assert_eq!(backups_in(dir.path()), 1);
        assert_eq!(vault.load().unwrap().len(), 2);
    }

    #[test]
    fn save_refuses_to_overwrite_a_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp-env.json");
        let broken = r#"{"gh": {"GITHUB_TOKEN": "ghp_real123456"},}"#;
        std::fs::write(&path, broken).unwrap();

        let vault = SecretsVault::new(&path);
        let mut store = vault.load().unwrap();
        assert!(store.is_empty());
        store.insert("other", "API_KEY", json!("sk-other-123456"));

        assert!(vault.save(&store).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), broken);
    }

    #[test]
    fn first_save_needs_no_backup() {
        let dir = tempfile::tempdir().unwrap();
        let vault = SecretsVault::new(dir.path().join("nested").join("mcp-env.json"));
        let mut store = SecretsStore::new();
        store.insert("gh", "GITHUB_TOKEN", json!("ghp_real123456"));
        vault.save(&store).unwrap();
        assert_eq!(backups_in(&dir.path().join("nested")), 0);
    }

    #[test]
    fn missing_and_malformed_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let vault = SecretsVault::new(dir.path().join("absent.json"));
        assert!(vault.load().unwrap().is_empty());

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{not json").unwrap();
        assert!(SecretsVault::new(&broken).load().unwrap().is_empty());
    }
}
