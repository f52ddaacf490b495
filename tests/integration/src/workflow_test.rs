//! End-to-end workflow across validation, repair, secrets and sync
//!
//! Each test drives the public API the way the CLI does: stores on disk,
//! engines built from the same pieces, results read back from the files.

use mcpsync_core::{
    CommandAdapter, HostFamily, RepairEngine, SyncEngine, SyncOptions, ValidateOptions,
    ValidationEngine,
};
use mcpsync_fs::JsonStore;
use mcpsync_meta::servers_of;
use mcpsync_test_utils::{TestStores, fixtures};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn engine(stores: &TestStores, host: HostFamily) -> SyncEngine {
    SyncEngine::new(stores.canonical(), stores.target(), stores.secrets())
        .with_adapter(CommandAdapter::new(host))
}

fn push(stores: &TestStores, host: HostFamily, options: SyncOptions) {
    let report = engine(stores, host).push(&options);
    assert!(report.success, "push failed: {:?}", report.errors);
}

fn pull(stores: &TestStores, host: HostFamily, options: SyncOptions) {
    let report = engine(stores, host).pull(&options);
    assert!(report.success, "pull failed: {:?}", report.errors);
}

#[test]
fn secrets_never_reach_the_canonical_store() {
    let stores = TestStores::new();
    stores.write_canonical(&fixtures::servers_document(json!({
        "github": fixtures::npx_server_with_env(
            "@modelcontextprotocol/server-github",
            "GITHUB_TOKEN",
            "YOUR_TOKEN_HERE"
        ),
    })));
    stores.write_secrets(&json!({"github": {"GITHUB_TOKEN": "ghp_realtoken1234567890"}}));
    stores.write_target(&json!({"theme": "dark"}));

    let sync_secrets = SyncOptions {
        sync_secrets: true,
        ..SyncOptions::default()
    };

    push(&stores, HostFamily::Windows, sync_secrets);

    let target = stores.read_target();
    let github = &target["mcpServers"]["github"];
    assert_eq!(github["command"], "cmd");
    assert_eq!(github["args"][0], "/c");
    assert_eq!(github["args"][1], "npx");
    assert_eq!(github["env"]["GITHUB_TOKEN"], "ghp_realtoken1234567890");
    assert_eq!(target["theme"], "dark");

    // A server added in the application with its own key
    let mut edited = target.clone();
    edited["mcpServers"]["search"] = json!({
        "command": "cmd",
        "args": ["/c", "npx", "-y", "search-server@1.0.0"],
        "env": {"SEARCH_API_KEY": "sk-search-abcdef123456"}
    });
    stores.write_target(&edited);

    pull(&stores, HostFamily::Windows, sync_secrets);

    let canonical = stores.read_canonical();
    let servers = canonical["mcpServers"].as_object().unwrap();
    assert_eq!(servers["github"]["command"], "npx");
    assert_eq!(servers["github"]["env"]["GITHUB_TOKEN"], "YOUR_TOKEN_HERE");
    assert_eq!(servers["search"]["command"], "npx");
    assert_eq!(servers["search"]["args"], json!(["-y", "search-server@1.0.0"]));
    assert_eq!(servers["search"]["env"]["SEARCH_API_KEY"], "YOUR_API_KEY_HERE");

    let vault = stores.read_secrets();
    assert_eq!(vault["github"]["GITHUB_TOKEN"], "ghp_realtoken1234567890");
    assert_eq!(vault["search"]["SEARCH_API_KEY"], "sk-search-abcdef123456");

    let text = std::fs::read_to_string(stores.canonical()).unwrap();
    assert!(!text.contains("ghp_realtoken"));
    assert!(!text.contains("sk-search"));
}

#[test]
fn repaired_server_can_be_pushed() {
    let stores = TestStores::new();
    stores.write_canonical(&fixtures::servers_document(json!({
        "files": {"command": "npx", "args": "-y server-files@2.0.0"},
    })));

    let report = engine(&stores, HostFamily::Unix).push(&SyncOptions::default());
    assert!(!report.success);
    assert!(!stores.target().exists());

    let canonical = JsonStore::new(stores.canonical()).with_indent(4);
    let mut document = canonical.load().unwrap();
    let config = servers_of(&document).unwrap()["files"].clone();

    let validator = ValidationEngine::new();
    let result = validator.validate_with("files", &config, ValidateOptions::default().without_cache());
    assert!(!result.valid());

    let repair = RepairEngine::new();
    let suggestions = repair.analyze_issues(&result, &config);
    let outcome = repair.apply_all(&suggestions, &config, false);
    assert!(outcome.applied.contains(&"fix_args_format".to_string()));

    document["mcpServers"]["files"] = outcome.config;
    canonical.save(&document).unwrap();

    push(&stores, HostFamily::Unix, SyncOptions::default());
    let target = stores.read_target();
    assert_eq!(
        target["mcpServers"]["files"]["args"],
        json!(["-y", "server-files@2.0.0"])
    );
}

#[test]
fn repeated_push_is_stable() {
    let stores = TestStores::new();
    stores.write_canonical(&fixtures::servers_document(json!({
        "web": fixtures::http_server("https://api.example.com/mcp"),
        "files": fixtures::npx_server("server-files@1.0.0"),
    })));

    push(&stores, HostFamily::Windows, SyncOptions::default());
    let first = stores.read_target();

    let report = engine(&stores, HostFamily::Windows).push(&SyncOptions::default());
    assert!(report.success);
    assert!(report.diff.is_empty());
    assert_eq!(stores.read_target(), first);
    assert_eq!(stores.backups_of(&stores.target()).len(), 1);
}

#[test]
fn pull_round_trip_restores_canonical() {
    let stores = TestStores::new();
    let original = fixtures::servers_document(json!({
        "files": fixtures::npx_server("server-files@1.0.0"),
        "web": fixtures::http_server("https://api.example.com/mcp"),
    }));
    stores.write_canonical(&original);

    push(&stores, HostFamily::Windows, SyncOptions::default());
    std::fs::remove_file(stores.canonical()).unwrap();
    pull(&stores, HostFamily::Windows, SyncOptions::default());

    let restored: Value = stores.read_canonical();
    assert_eq!(restored["mcpServers"], original["mcpServers"]);
}
