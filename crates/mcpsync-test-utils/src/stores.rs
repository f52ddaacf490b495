//! [`TestStores`] fixture for sync scenarios.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory laid out like a dotfiles checkout:
///
/// - `mcp-servers.json` (canonical store)
/// - `home/.claude.json` (target store)
/// - `secrets/api-keys/mcp-env.json` (secrets file)
///
/// Files are only created when written.
///
/// # Example
///
/// ```rust,no_run
/// use mcpsync_test_utils::TestStores;
/// use serde_json::json;
///
/// let stores = TestStores::new();
/// stores.write_canonical(&json!({"mcpServers": {}}));
/// assert!(stores.canonical().exists());
/// ```
pub struct TestStores {
    temp_dir: TempDir,
}

impl Default for TestStores {
    fn default() -> Self {
        Self::new()
    }
}

impl TestStores {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Root of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn canonical(&self) -> PathBuf {
        self.root().join("mcp-servers.json")
    }

    pub fn target(&self) -> PathBuf {
        self.root().join("home").join(".claude.json")
    }

    pub fn secrets(&self) -> PathBuf {
        self.root().join("secrets").join("api-keys").join("mcp-env.json")
    }

    pub fn write_canonical(&self, document: &Value) {
        write_json(&self.canonical(), document);
    }

    pub fn write_target(&self, document: &Value) {
        write_json(&self.target(), document);
    }

    pub fn write_secrets(&self, document: &Value) {
        write_json(&self.secrets(), document);
    }

    pub fn read_canonical(&self) -> Value {
        read_json(&self.canonical())
    }

    pub fn read_target(&self) -> Value {
        read_json(&self.target())
    }

    pub fn read_secrets(&self) -> Value {
        read_json(&self.secrets())
    }

    /// Backup files created next to `path`.
    ///
    /// # Panics
    /// Panics if the parent directory cannot be read.
    pub fn backups_of(&self, path: &Path) -> Vec<PathBuf> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let prefix = format!("{name}.backup.");
        let mut backups: Vec<PathBuf> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with(&prefix))
            })
            .collect();
        backups.sort();
        backups
    }
}

/// Write `value` as pretty JSON, creating parent directories.
pub fn write_json(path: &Path, value: &Value) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

/// Read and parse a JSON file.
///
/// # Panics
/// Panics with the path if the file is missing or not JSON.
pub fn read_json(path: &Path) -> Value {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Could not read {}: {e}", path.display()));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Invalid JSON in {}: {e}", path.display()))
}
