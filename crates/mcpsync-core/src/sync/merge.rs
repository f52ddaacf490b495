//! Server-by-server merge that keeps real secrets in the destination

use mcpsync_meta::{ServerMap, is_placeholder};
use serde_json::Value;

/// Counts from one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub added: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Real values kept because the incoming value was a placeholder
    pub preserved_secrets: usize,
}

/// `source` with every placeholder env value replaced by the real value
/// `existing` has for the same variable.
pub fn preserve_secrets(source: &Value, existing: &Value) -> (Value, usize) {
    let mut merged = source.clone();
    let Some(existing_env) = existing.get("env").and_then(Value::as_object) else {
        return (merged, 0);
    };
    let Some(env) = merged.get_mut("env").and_then(Value::as_object_mut) else {
        return (merged, 0);
    };

    let mut preserved = 0;
    for (key, value) in env.iter_mut() {
        if let Some(current) = existing_env.get(key)
            && is_placeholder(value)
            && !is_placeholder(current)
        {
            tracing::debug!(variable = %key, "Preserving existing secret");
            *value = current.clone();
            preserved += 1;
        }
    }
    (merged, preserved)
}

/// Merge `incoming` into `current`.
///
/// New names are appended, existing names are replaced by the incoming
/// configuration with their real secrets kept. Names only in `current` stay.
pub fn merge_servers(current: &ServerMap, incoming: &ServerMap) -> (ServerMap, MergeStats) {
    let mut merged = current.clone();
    let mut stats = MergeStats::default();

    for (name, config) in incoming {
        match current.get(name) {
            Some(existing) => {
                let (next, preserved) = preserve_secrets(config, existing);
                stats.preserved_secrets += preserved;
                if &next == existing {
                    stats.unchanged += 1;
                } else {
                    tracing::debug!(server = %name, "Updating existing server");
                    stats.updated += 1;
                }
                merged.insert(name.clone(), next);
            }
            None => {
                tracing::debug!(server = %name, "Adding new server");
                stats.added += 1;
                merged.insert(name.clone(), config.clone());
            }
        }
    }

    tracing::info!(
        added = stats.added,
        updated = stats.updated,
        preserved = stats.preserved_secrets,
        "Merged servers"
    );
    (merged, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn map(value: Value) -> ServerMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn placeholder_never_overwrites_real_key() {
        let existing = json!({"command": "npx", "env": {"API_KEY": "sk-real-12345678"}});
        let source = json!({"command": "npx", "env": {"API_KEY": "YOUR_API_KEY_HERE"}});
        let (merged, preserved) = preserve_secrets(&source, &existing);
        assert_eq!(merged["env"]["API_KEY"], json!("sk-real-12345678"));
        assert_eq!(preserved, 1);
    }

    #[test]
    fn real_source_value_wins() {
        let existing = json!({"env": {"API_KEY": "old-real"}});
        let source = json!({"env": {"API_KEY": "new-real"}});
        let (merged, preserved) = preserve_secrets(&source, &existing);
        assert_eq!(merged["env"]["API_KEY"], json!("new-real"));
        assert_eq!(preserved, 0);
    }

    #[test]
    fn merge_keeps_destination_only_servers() {
        let current = map(json!({
            "keep": {"command": "node"},
            "same": {"command": "npx"},
            "change": {"command": "npx", "args": ["a"]}
        }));
        let incoming = map(json!({
            "same": {"command": "npx"},
            "change": {"command": "npx", "args": ["b"]},
            "new": {"type": "http", "url": "https://x"}
        }));
        let (merged, stats) = merge_servers(&current, &incoming);

        let names: Vec<_> = merged.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["keep", "same", "change", "new"]);
        assert_eq!(merged["change"]["args"], json!(["b"]));
        assert_eq!(
            stats,
            MergeStats {
                added: 1,
                updated: 1,
                unchanged: 1,
                preserved_secrets: 0
            }
        );
    }
}
