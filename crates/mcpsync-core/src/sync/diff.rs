//! Server-level diffs and their plain-text rendering

use mcpsync_meta::{ServerMap, is_secret_like};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt::Write;

/// Values of secret-like variables longer than this are masked.
const MASK_THRESHOLD: usize = 10;

/// Kind of change to a field or env variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

impl ChangeKind {
    fn marker(&self) -> char {
        match self {
            Self::Added => '+',
            Self::Removed => '-',
            Self::Modified => '~',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub key: String,
    pub kind: ChangeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<Value>,
}

/// A server present on one side only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerEntry {
    pub name: String,
    pub server_type: String,
}

/// A server present on both sides with different configurations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerChange {
    pub name: String,
    pub server_type: String,
    /// Top-level field changes, except env variables when both sides have
    /// an env mapping
    pub fields: Vec<FieldChange>,
    pub env: Vec<FieldChange>,
}

/// Differences between the current and the incoming server maps.
///
/// All lists are sorted by name for stable output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeploymentDiff {
    pub added: Vec<ServerEntry>,
    pub removed: Vec<ServerEntry>,
    pub modified: Vec<ServerChange>,
}

fn type_label(config: &Value) -> String {
    config
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string()
}

fn sorted_keys<'a>(a: &'a Map<String, Value>, b: &'a Map<String, Value>) -> BTreeSet<&'a String> {
    a.keys().chain(b.keys()).collect()
}

fn compare_maps(old: &Map<String, Value>, new: &Map<String, Value>) -> Vec<FieldChange> {
    sorted_keys(old, new)
        .into_iter()
        .filter_map(|key| {
            let (before, after) = (old.get(key), new.get(key));
            let kind = match (before, after) {
                (None, Some(_)) => ChangeKind::Added,
                (Some(_), None) => ChangeKind::Removed,
                (Some(b), Some(a)) if b != a => ChangeKind::Modified,
                _ => return None,
            };
            Some(FieldChange {
                key: key.clone(),
                kind,
                old: before.cloned(),
                new: after.cloned(),
            })
        })
        .collect()
}

fn compare_server(name: &str, old: &Value, new: &Value) -> ServerChange {
    let empty = Map::new();
    let old_fields = old.as_object().unwrap_or(&empty);
    let new_fields = new.as_object().unwrap_or(&empty);

    let mut fields = compare_maps(old_fields, new_fields);
    let mut env = Vec::new();
    let (old_env, new_env) = (old_fields.get("env"), new_fields.get("env"));
    if old_env != new_env
        && (matches!(old_env, Some(Value::Object(_))) || matches!(new_env, Some(Value::Object(_))))
    {
        // A side without an env mapping diffs as empty so every key is masked
        fields.retain(|change| change.key != "env");
        env = compare_maps(
            old_env.and_then(Value::as_object).unwrap_or(&empty),
            new_env.and_then(Value::as_object).unwrap_or(&empty),
        );
    }

    ServerChange {
        name: name.to_string(),
        server_type: type_label(new),
        fields,
        env,
    }
}

impl DeploymentDiff {
    /// Diff `current` (the destination) against `incoming`.
    pub fn compute(current: &ServerMap, incoming: &ServerMap) -> Self {
        let mut diff = Self::default();
        for name in sorted_keys(current, incoming) {
            match (current.get(name), incoming.get(name)) {
                (None, Some(new)) => diff.added.push(ServerEntry {
                    name: name.clone(),
                    server_type: type_label(new),
                }),
                (Some(old), None) => diff.removed.push(ServerEntry {
                    name: name.clone(),
                    server_type: type_label(old),
                }),
                (Some(old), Some(new)) if old != new => {
                    diff.modified.push(compare_server(name, old, new));
                }
                _ => {}
            }
        }
        tracing::debug!(
            added = diff.added.len(),
            removed = diff.removed.len(),
            modified = diff.modified.len(),
            "Computed deployment diff"
        );
        diff
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Number of servers touched
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }

    /// Plain-text preview under a `=== CHANGES PREVIEW (<MODE> MODE) ===` header.
    pub fn render(&self, mode: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== CHANGES PREVIEW ({} MODE) ===", mode.to_uppercase());

        if !self.added.is_empty() {
            let _ = writeln!(out, "\n+ SERVERS TO ADD ({}):", self.added.len());
            for entry in &self.added {
                let _ = writeln!(out, "  + {} ({})", entry.name, entry.server_type);
            }
        }

        if !self.removed.is_empty() {
            let _ = writeln!(out, "\n- SERVERS TO REMOVE ({}):", self.removed.len());
            for entry in &self.removed {
                let _ = writeln!(out, "  - {} ({})", entry.name, entry.server_type);
            }
        }

        if !self.modified.is_empty() {
            let _ = writeln!(out, "\n~ SERVERS TO UPDATE ({}):", self.modified.len());
            for change in &self.modified {
                let _ = writeln!(out, "  ~ {} ({})", change.name, change.server_type);
                for field in &change.fields {
                    let _ = writeln!(out, "    {}", render_change(&field.key, field, false));
                }
                for var in &change.env {
                    let label = format!("env.{}", var.key);
                    let _ = writeln!(
                        out,
                        "      {}",
                        render_change(&label, var, is_secret_like(&var.key))
                    );
                }
            }
        }

        if self.is_empty() {
            let _ = writeln!(out, "\n[OK] No changes detected");
        }
        out
    }
}

fn render_change(label: &str, change: &FieldChange, secret: bool) -> String {
    let show = |value: &Option<Value>| {
        let text = value.as_ref().map(display_value).unwrap_or_default();
        if secret { mask(&text) } else { text }
    };
    let marker = change.kind.marker();
    match change.kind {
        ChangeKind::Added => format!("{marker} {label}: {}", show(&change.new)),
        ChangeKind::Removed => format!("{marker} {label}: {}", show(&change.old)),
        ChangeKind::Modified => format!(
            "{marker} {label}: {} -> {}",
            show(&change.old),
            show(&change.new)
        ),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `***` plus the last four characters for values longer than ten.
pub fn mask(value: &str) -> String {
    let count = value.chars().count();
    if count <= MASK_THRESHOLD {
        return value.to_string();
    }
    let tail: String = value.chars().skip(count - 4).collect();
    format!("***{tail}")
}
