//! Sample server configurations.

use serde_json::{Value, json};

/// A stdio server launched through `npx`.
pub fn npx_server(package: &str) -> Value {
    json!({"type": "stdio", "command": "npx", "args": ["-y", package]})
}

/// A stdio server with one credential variable.
pub fn npx_server_with_env(package: &str, key: &str, value: &str) -> Value {
    json!({
        "type": "stdio",
        "command": "npx",
        "args": ["-y", package],
        "env": {key: value}
    })
}

/// A remote server.
pub fn http_server(url: &str) -> Value {
    json!({"type": "http", "url": url})
}

/// A document holding `servers` under `mcpServers`.
pub fn servers_document(servers: Value) -> Value {
    json!({"mcpServers": servers})
}
