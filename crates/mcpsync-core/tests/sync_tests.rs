//! Push and pull against temporary stores.

use mcpsync_core::portability::{CommandAdapter, HostFamily};
use mcpsync_core::{HealthProbe, HealthReport, SyncEngine, SyncOptions, ValidationEngine};
use mcpsync_test_utils::TestStores;
use mcpsync_test_utils::fixtures::{http_server, npx_server, npx_server_with_env, servers_document};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;

/// Reports every server as healthy or every server as broken.
struct FixedProbe(bool);

impl HealthProbe for FixedProbe {
    fn probe(&self, _server_name: &str, _config: &Value) -> HealthReport {
        if self.0 {
            HealthReport::healthy()
        } else {
            HealthReport::unhealthy("probe says no")
        }
    }
}

fn engine(stores: &TestStores) -> SyncEngine {
    SyncEngine::new(stores.canonical(), stores.target(), stores.secrets())
        .with_adapter(CommandAdapter::new(HostFamily::Unix))
}

fn write(dry_run: bool) -> SyncOptions {
    SyncOptions {
        dry_run,
        ..SyncOptions::default()
    }
}

#[test]
fn push_creates_target_and_keeps_other_keys() {
    let stores = TestStores::new();
    stores.write_canonical(&servers_document(json!({"fs": npx_server("fs-server")})));
    stores.write_target(&json!({"theme": "dark"}));

    let report = engine(&stores).push(&write(false));

    assert!(report.success, "errors: {:?}", report.errors);
    let target = stores.read_target();
    assert_eq!(target["theme"], json!("dark"));
    assert_eq!(target["mcpServers"]["fs"], npx_server("fs-server"));
    assert_eq!(stores.backups_of(&stores.target()).len(), 1);
    assert!(report.backup.is_some());
}

#[test]
fn push_preserves_real_secrets() {
    let stores = TestStores::new();
    stores.write_canonical(&servers_document(json!({
        "ai": npx_server_with_env("ai-server", "API_KEY", "YOUR_API_KEY_HERE")
    })));
    stores.write_target(&servers_document(json!({
        "ai": npx_server_with_env("ai-server", "API_KEY", "sk-real-12345678")
    })));

    let report = engine(&stores).push(&write(false));

    assert!(report.success);
    assert!(report.diff.is_empty());
    assert!(report.placeholders.is_empty());
    assert_eq!(
        stores.read_target()["mcpServers"]["ai"]["env"]["API_KEY"],
        json!("sk-real-12345678")
    );
}

#[test]
fn push_diff_preview() {
    let stores = TestStores::new();
    stores.write_target(&servers_document(json!({
        "old": {"type": "stdio", "command": "node", "args": ["old.js"]},
        "shared": {
            "type": "stdio",
            "command": "npx",
            "args": ["-y", "a"],
            "env": {"API_KEY": "sk-real-12345678", "MODE": "dev"}
        }
    })));
    stores.write_canonical(&servers_document(json!({
        "shared": {
            "type": "stdio",
            "command": "npx",
            "args": ["-y", "a@1.0"],
            "env": {"API_KEY": "YOUR_API_KEY_HERE", "MODE": "prod"}
        },
        "web": http_server("https://example.com/mcp")
    })));

    let report = engine(&stores).push(&write(true));

    assert!(report.success);
    insta::assert_snapshot!(report.rendered_diff, @r#"
    === CHANGES PREVIEW (PUSH MODE) ===

    + SERVERS TO ADD (1):
      + web (http)

    ~ SERVERS TO UPDATE (1):
      ~ shared (stdio)
        ~ args: ["-y","a"] -> ["-y","a@1.0"]
          ~ env.MODE: dev -> prod
    "#);
}

#[test]
fn dry_run_writes_nothing() {
    let stores = TestStores::new();
    stores.write_canonical(&servers_document(json!({"fs": npx_server("fs-server")})));

    let report = engine(&stores).push(&write(true));

    assert!(report.success);
    assert!(report.dry_run);
    assert_eq!(report.diff.added.len(), 1);
    assert!(!stores.target().exists());
    assert!(report.backup.is_none());
}

#[test]
fn structural_errors_abort_push() {
    let stores = TestStores::new();
    stores.write_canonical(&servers_document(json!({
        "good": npx_server("fs-server"),
        "bad": {"type": "stdio"}
    })));
    stores.write_target(&servers_document(json!({})));

    let report = engine(&stores).push(&write(false));

    assert!(!report.success);
    assert!(report.errors.iter().any(|e| e.starts_with("bad: ")));
    assert_eq!(stores.read_target(), servers_document(json!({})));
    assert!(stores.backups_of(&stores.target()).is_empty());
}

#[test]
fn missing_server_map_fails_push() {
    let stores = TestStores::new();
    stores.write_canonical(&json!({"unrelated": true}));

    let report = engine(&stores).push(&write(false));

    assert!(!report.success);
    assert!(report.errors[0].contains("must contain 'mcpServers'"));
}

#[test]
fn legacy_key_is_read_but_never_written() {
    let stores = TestStores::new();
    stores.write_canonical(&json!({"mcps": {"fs": npx_server("fs-server")}}));
    stores.write_target(&json!({"mcps": {"x": npx_server("x-server")}}));

    let report = engine(&stores).push(&write(false));

    assert!(report.success);
    let target = stores.read_target();
    assert!(target.get("mcps").is_none());
    assert_eq!(target["mcpServers"].as_object().unwrap().len(), 2);
}

#[test]
fn push_fills_placeholders_from_vault() {
    let stores = TestStores::new();
    stores.write_canonical(&servers_document(json!({
        "gh": npx_server_with_env("gh-server", "GITHUB_TOKEN", "YOUR_TOKEN_HERE"),
        "ai": npx_server_with_env("ai-server", "API_KEY", "YOUR_API_KEY_HERE")
    })));
    stores.write_secrets(&json!({"_note": "local only", "gh": {"GITHUB_TOKEN": "ghp_realtoken123"}}));

    let options = SyncOptions {
        sync_secrets: true,
        ..SyncOptions::default()
    };
    let report = engine(&stores).push(&options);

    assert!(report.success);
    let target = stores.read_target();
    assert_eq!(target["mcpServers"]["gh"]["env"]["GITHUB_TOKEN"], json!("ghp_realtoken123"));
    assert_eq!(report.placeholders.len(), 1);
    assert_eq!(report.placeholders[0].server, "ai");
}

#[test]
fn push_wraps_for_windows_targets() {
    let stores = TestStores::new();
    stores.write_canonical(&servers_document(json!({"fs": npx_server("fs-server")})));

    let report = engine(&stores)
        .with_adapter(CommandAdapter::new(HostFamily::Windows))
        .push(&write(false));

    assert!(report.success);
    assert_eq!(
        stores.read_target()["mcpServers"]["fs"]["args"],
        json!(["/c", "npx", "-y", "fs-server"])
    );
}

#[test]
fn unhealthy_servers_abort_push() {
    let stores = TestStores::new();
    stores.write_canonical(&servers_document(json!({"fs": npx_server("fs-server")})));

    let validator = ValidationEngine::new().with_probe(Arc::new(FixedProbe(false)));
    let options = SyncOptions {
        health_check: true,
        ..SyncOptions::default()
    };
    let report = engine(&stores).with_validator(validator).push(&options);

    assert!(!report.success);
    assert_eq!(report.health.as_ref().unwrap().healthy, 0);
    assert!(report.warnings.iter().any(|w| w == "fs: probe says no"));
    assert!(!stores.target().exists());
}

#[test]
fn healthy_servers_pass_health_check() {
    let stores = TestStores::new();
    stores.write_canonical(&servers_document(json!({"fs": npx_server("fs-server")})));

    let validator = ValidationEngine::new().with_probe(Arc::new(FixedProbe(true)));
    let options = SyncOptions {
        health_check: true,
        ..SyncOptions::default()
    };
    let report = engine(&stores).with_validator(validator).push(&options);

    assert!(report.success);
    assert!(report.health.unwrap().all_healthy());
}

#[test]
fn pull_unwraps_sanitizes_and_stores_secrets() {
    let stores = TestStores::new();
    stores.write_target(&servers_document(json!({
        "ai": {
            "type": "stdio",
            "command": "cmd",
            "args": ["/c", "npx", "-y", "ai-server"],
            "env": {"OPENAI_API_KEY": "sk-live-abcdefgh", "MODE": "prod"}
        }
    })));
    stores.write_secrets(&json!({"_comment": "keep me"}));

    let options = SyncOptions {
        sync_secrets: true,
        ..SyncOptions::default()
    };
    let report = engine(&stores).pull(&options);

    assert!(report.success, "errors: {:?}", report.errors);
    assert_eq!(
        stores.read_canonical()["mcpServers"]["ai"],
        json!({
            "type": "stdio",
            "command": "npx",
            "args": ["-y", "ai-server"],
            "env": {"OPENAI_API_KEY": "YOUR_API_KEY_HERE", "MODE": "prod"}
        })
    );
    assert_eq!(
        stores.read_secrets(),
        json!({"_comment": "keep me", "ai": {"OPENAI_API_KEY": "sk-live-abcdefgh"}})
    );

    let raw = std::fs::read_to_string(stores.canonical()).unwrap();
    assert!(raw.starts_with("{\n    \"mcpServers\""));
}

#[test]
fn pull_keeps_malformed_vault_intact() {
    let stores = TestStores::new();
    stores.write_target(&servers_document(json!({
        "ai": npx_server_with_env("ai-server", "API_KEY", "sk-live-abcdefgh")
    })));
    let broken = r#"{"gh": {"GITHUB_TOKEN": "ghp_real123456"},}"#;
    std::fs::create_dir_all(stores.secrets().parent().unwrap()).unwrap();
    std::fs::write(stores.secrets(), broken).unwrap();

    let options = SyncOptions {
        sync_secrets: true,
        ..SyncOptions::default()
    };
    let report = engine(&stores).pull(&options);

    assert!(!report.success);
    assert_eq!(std::fs::read_to_string(stores.secrets()).unwrap(), broken);
    assert!(!stores.canonical().exists());
}

#[test]
fn pull_backs_up_existing_vault() {
    let stores = TestStores::new();
    stores.write_target(&servers_document(json!({
        "ai": npx_server_with_env("ai-server", "API_KEY", "sk-live-abcdefgh")
    })));
    stores.write_secrets(&json!({"gh": {"GITHUB_TOKEN": "ghp_real123456"}}));

    let options = SyncOptions {
        sync_secrets: true,
        ..SyncOptions::default()
    };
    let report = engine(&stores).pull(&options);

    assert!(report.success, "errors: {:?}", report.errors);
    assert_eq!(stores.backups_of(&stores.secrets()).len(), 1);
    let vault = stores.read_secrets();
    assert_eq!(vault["gh"]["GITHUB_TOKEN"], json!("ghp_real123456"));
    assert_eq!(vault["ai"]["API_KEY"], json!("sk-live-abcdefgh"));
}

#[test]
fn pull_dry_run_touches_nothing() {
    let stores = TestStores::new();
    stores.write_target(&servers_document(json!({
        "ai": npx_server_with_env("ai-server", "API_KEY", "sk-live-abcdefgh")
    })));

    let options = SyncOptions {
        dry_run: true,
        sync_secrets: true,
        ..SyncOptions::default()
    };
    let report = engine(&stores).pull(&options);

    assert!(report.success);
    assert!(!stores.canonical().exists());
    assert!(!stores.secrets().exists());
    assert!(report.rendered_diff.contains("+ ai (stdio)"));
}

#[test]
fn pull_with_empty_target_succeeds() {
    let stores = TestStores::new();
    let report = engine(&stores).pull(&write(false));
    assert!(report.success);
    assert!(report.diff.is_empty());
    assert!(!stores.canonical().exists());
}

#[test]
fn invalid_json_target_is_not_overwritten() {
    let stores = TestStores::new();
    stores.write_canonical(&servers_document(json!({"fs": npx_server("fs-server")})));
    std::fs::create_dir_all(stores.target().parent().unwrap()).unwrap();
    std::fs::write(stores.target(), "{ broken").unwrap();

    let report = engine(&stores).push(&write(false));

    assert!(!report.success);
    assert_eq!(std::fs::read_to_string(stores.target()).unwrap(), "{ broken");
}
