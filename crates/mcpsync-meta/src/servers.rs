//! Top-level server map handling

use serde_json::{Map, Value};

/// Key holding the server map in every store.
pub const SERVERS_KEY: &str = "mcpServers";

/// Older stores used this key; it is accepted on read and never written.
pub const LEGACY_SERVERS_KEY: &str = "mcps";

/// Insertion-ordered map of server name to raw configuration.
pub type ServerMap = Map<String, Value>;

/// Rename the legacy key to [`SERVERS_KEY`] in place.
///
/// Returns `true` when the document was changed. A document that already has
/// [`SERVERS_KEY`] keeps the legacy entry untouched.
pub fn normalize_servers_key(document: &mut Map<String, Value>) -> bool {
    if document.contains_key(SERVERS_KEY) {
        return false;
    }
    match document.remove(LEGACY_SERVERS_KEY) {
        Some(servers) => {
            tracing::debug!("Normalized legacy servers key");
            document.insert(SERVERS_KEY.to_string(), servers);
            true
        }
        None => false,
    }
}

/// Borrow the server map of a normalized document.
pub fn servers_of(document: &Map<String, Value>) -> Option<&ServerMap> {
    document.get(SERVERS_KEY).and_then(Value::as_object)
}
