//! Validation rules
//!
//! Each rule inspects one concern of a server configuration and returns zero
//! or more issues. Rules are independent: none reads another's output, so the
//! order in [`default_rules`] only fixes the order issues are reported in.

use super::issue::{FixAction, IssueCategory, ValidationIssue};
use mcpsync_meta::{ServerType, is_placeholder, looks_like_credential, parse_server_config};
use regex::Regex;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::LazyLock;

/// Commands that resolve at launch time even when absent from `PATH` here.
pub const KNOWN_WRAPPERS: &[&str] = &["docker", "npx", "uvx", "python", "node"];

/// Misspelled field names and the field they were meant to be.
pub const FIELD_TYPOS: &[(&str, &str)] = &[
    ("cmd", "command"),
    ("arguments", "args"),
    ("environment", "env"),
    ("envs", "env"),
    ("environmental", "env"),
    ("variables", "env"),
];

/// Commands that are usually a mistake for another launcher.
pub const COMMAND_TYPOS: &[(&str, &str)] = &[
    ("nodejs", "node"),
    ("py", "python"),
    ("pip", "python"),
    ("npm", "npx"),
];

/// Env var count above which an env file is suggested.
const MAX_INLINE_ENV_VARS: usize = 5;

/// Minimum plausible length for a real credential.
const MIN_SECRET_LEN: usize = 8;

/// Provider key format checked by prefix.
#[derive(Debug)]
pub struct KeyFormat {
    pub variable: &'static str,
    pub provider: &'static str,
    pub prefix: &'static str,
    pattern: LazyLock<Regex>,
}

impl KeyFormat {
    pub fn matches(&self, value: &str) -> bool {
        self.pattern.is_match(value)
    }
}

pub static KEY_FORMATS: [KeyFormat; 5] = [
    KeyFormat {
        variable: "OPENAI_API_KEY",
        provider: "OpenAI",
        prefix: "sk-",
        pattern: LazyLock::new(|| Regex::new(r"^sk-").unwrap()),
    },
    KeyFormat {
        variable: "ANTHROPIC_API_KEY",
        provider: "Anthropic",
        prefix: "sk-ant-",
        pattern: LazyLock::new(|| Regex::new(r"^sk-ant-").unwrap()),
    },
    KeyFormat {
        variable: "GITHUB_TOKEN",
        provider: "GitHub",
        prefix: "gh[pousr]_",
        pattern: LazyLock::new(|| Regex::new(r"^(gh[pousr]_|github_pat_)").unwrap()),
    },
    KeyFormat {
        variable: "GITHUB_PERSONAL_ACCESS_TOKEN",
        provider: "GitHub",
        prefix: "gh[pousr]_",
        pattern: LazyLock::new(|| Regex::new(r"^(gh[pousr]_|github_pat_)").unwrap()),
    },
    KeyFormat {
        variable: "GOOGLE_API_KEY",
        provider: "Google",
        prefix: "AIza",
        pattern: LazyLock::new(|| Regex::new(r"^AIza").unwrap()),
    },
];

/// Look up the provider format for an env variable name.
pub fn key_format(variable: &str) -> Option<&'static KeyFormat> {
    let upper = variable.to_uppercase();
    KEY_FORMATS.iter().find(|f| f.variable == upper)
}

/// Failure inside a rule implementation.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct RuleError(pub String);

/// What a rule sees.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub server_name: &'a str,
    pub config: &'a Map<String, Value>,
}

impl RuleContext<'_> {
    fn get(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }

    fn command(&self) -> Option<&str> {
        self.get("command").and_then(Value::as_str).filter(|c| !c.is_empty())
    }

    fn env(&self) -> Option<&Map<String, Value>> {
        self.get("env").and_then(Value::as_object)
    }
}

/// One independent validation concern.
pub trait ValidationRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationIssue>, RuleError>;
}

/// The standard pipeline, in reporting order.
pub fn default_rules() -> Vec<Box<dyn ValidationRule>> {
    vec![
        Box::new(RequiredFields),
        Box::new(SchemaShape),
        Box::new(CommandAndArgs),
        Box::new(EnvironmentShape),
        Box::new(ApiKeys),
        Box::new(Urls),
        Box::new(CommandPaths),
        Box::new(EmbeddedJson),
        Box::new(CommonTypos),
        Box::new(Improvements),
    ]
}

/// Values a rule treats as "not provided".
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::Bool(true)) => false,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Launch fields required by the declared transport.
pub struct RequiredFields;

impl ValidationRule for RequiredFields {
    fn name(&self) -> &'static str {
        "required_fields"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationIssue>, RuleError> {
        let Some(server_type) = ServerType::from_field(ctx.get("type")) else {
            let declared = ctx.get("type").map(display_value).unwrap_or_default();
            return Ok(vec![
                ValidationIssue::error(
                    IssueCategory::RequiredField,
                    format!("Invalid server type: {declared}"),
                )
                .with_field("type")
                .with_suggestion("stdio")
                .with_fix(FixAction::SetServerType)
                .with_auto_fixable(true),
            ]);
        };

        let mut issues = Vec::new();
        if server_type.is_process() && is_blank(ctx.get("command")) {
            issues.push(
                ValidationIssue::error(
                    IssueCategory::RequiredField,
                    "Missing required field: command",
                )
                .with_field("command")
                .with_fix(FixAction::AddCommand),
            );
        } else if server_type.is_remote() && is_blank(ctx.get("url")) {
            issues.push(
                ValidationIssue::error(IssueCategory::RequiredField, "Missing required field: url")
                    .with_field("url")
                    .with_fix(FixAction::AddUrl),
            );
        }
        Ok(issues)
    }
}

/// Structural check through the typed schema parser.
pub struct SchemaShape;

impl ValidationRule for SchemaShape {
    fn name(&self) -> &'static str {
        "schema"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationIssue>, RuleError> {
        match parse_server_config(ctx.server_name, &Value::Object(ctx.config.clone())) {
            Ok(_) => Ok(Vec::new()),
            Err(e) => Ok(vec![
                ValidationIssue::error(
                    IssueCategory::Format,
                    format!("Configuration validation failed: {e}"),
                )
                .with_fix(FixAction::FixFormat)
                .with_auto_fixable(false),
            ]),
        }
    }
}

/// Command availability, args shape and npm version pinning.
pub struct CommandAndArgs;

impl ValidationRule for CommandAndArgs {
    fn name(&self) -> &'static str {
        "command_args"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationIssue>, RuleError> {
        let mut issues = Vec::new();
        let Some(command) = ctx.command() else {
            return Ok(issues);
        };

        if !KNOWN_WRAPPERS.contains(&command) && which::which(command).is_err() {
            issues.push(
                ValidationIssue::warning(
                    IssueCategory::Path,
                    format!("Command '{command}' not found in PATH"),
                )
                .with_field("command")
                .with_fix(FixAction::CheckCommandPath),
            );
        }

        let args = ctx.get("args");
        if !is_blank(args) && !matches!(args, Some(Value::Array(_))) {
            issues.push(
                ValidationIssue::error(IssueCategory::Format, "Arguments must be a list")
                    .with_field("args")
                    .with_fix(FixAction::FixArgsFormat)
                    .with_auto_fixable(true),
            );
        }

        if command == "npx"
            && let Some(Value::Array(items)) = args
            && let Some(package) = items
                .iter()
                .filter_map(Value::as_str)
                .find(|a| !a.starts_with('-'))
            && !package.get(1..).is_some_and(|rest| rest.contains('@'))
        {
            issues.push(
                ValidationIssue::info(
                    IssueCategory::Suggestion,
                    format!("Consider specifying version for npm package: {package}@latest"),
                )
                .with_field("args")
                .with_suggestion(format!("{package}@latest"))
                .with_fix(FixAction::PinPackageVersion),
            );
        }
        Ok(issues)
    }
}

/// `env` must be a mapping; empty values are flagged.
pub struct EnvironmentShape;

impl ValidationRule for EnvironmentShape {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationIssue>, RuleError> {
        let env = ctx.get("env");
        if is_blank(env) {
            return Ok(Vec::new());
        }
        let Some(Value::Object(vars)) = env else {
            return Ok(vec![
                ValidationIssue::error(
                    IssueCategory::Format,
                    "Environment variables must be a dictionary",
                )
                .with_field("env")
                .with_fix(FixAction::FixEnvFormat)
                .with_auto_fixable(true),
            ]);
        };

        Ok(vars
            .iter()
            .filter(|(_, v)| v.as_str() == Some(""))
            .map(|(key, _)| {
                ValidationIssue::warning(
                    IssueCategory::MissingValue,
                    format!("Environment variable '{key}' is empty"),
                )
                .with_field(format!("env.{key}"))
                .with_fix(FixAction::SetEnvValue)
            })
            .collect())
    }
}

/// Placeholder, length and provider-format checks on credential variables.
pub struct ApiKeys;

impl ValidationRule for ApiKeys {
    fn name(&self) -> &'static str {
        "api_keys"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationIssue>, RuleError> {
        let mut issues = Vec::new();
        let Some(env) = ctx.env() else {
            return Ok(issues);
        };

        for (key, value) in env.iter().filter(|(k, _)| looks_like_credential(k)) {
            let field = format!("env.{key}");
            if is_placeholder(value) {
                issues.push(
                    ValidationIssue::warning(
                        IssueCategory::ApiKey,
                        format!("API key placeholder detected: {key}"),
                    )
                    .with_field(&field)
                    .with_suggestion("<Set your API key here>")
                    .with_fix(FixAction::SetApiKey),
                );
                continue;
            }

            let Some(secret) = value.as_str() else {
                continue;
            };
            if secret.chars().count() < MIN_SECRET_LEN {
                issues.push(
                    ValidationIssue::warning(
                        IssueCategory::ApiKey,
                        format!("API key '{key}' seems too short"),
                    )
                    .with_field(&field)
                    .with_fix(FixAction::VerifyApiKey),
                );
            }
            if let Some(format) = key_format(key)
                && !format.matches(secret)
            {
                issues.push(
                    ValidationIssue::warning(
                        IssueCategory::ApiKey,
                        format!(
                            "{} API key should start with '{}'",
                            format.provider, format.prefix
                        ),
                    )
                    .with_field(&field)
                    .with_fix(FixAction::VerifyApiKeyFormat),
                );
            }
        }
        Ok(issues)
    }
}

/// Scheme checks for remote endpoints.
pub struct Urls;

fn is_local_http(url: &str) -> bool {
    let rest = url.trim_start_matches("http://");
    ["localhost", "127.0.0.1", "[::1]", "0.0.0.0"]
        .iter()
        .any(|host| {
            rest.strip_prefix(host)
                .is_some_and(|tail| tail.is_empty() || tail.starts_with([':', '/', '?']))
        })
}

impl ValidationRule for Urls {
    fn name(&self) -> &'static str {
        "urls"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationIssue>, RuleError> {
        let mut issues = Vec::new();
        let raw = ctx.get("url");
        if is_blank(raw) {
            return Ok(issues);
        }
        let Some(url) = raw.and_then(Value::as_str) else {
            issues.push(
                ValidationIssue::error(IssueCategory::Format, "URL must be a string")
                    .with_field("url")
                    .with_fix(FixAction::FixUrlFormat)
                    .with_auto_fixable(true),
            );
            return Ok(issues);
        };

        if !url.starts_with("http://") && !url.starts_with("https://") {
            let suggested = if url.starts_with("http") {
                url.to_string()
            } else {
                format!("https://{url}")
            };
            issues.push(
                ValidationIssue::error(
                    IssueCategory::Format,
                    "URL must start with http:// or https://",
                )
                .with_field("url")
                .with_suggestion(suggested)
                .with_fix(FixAction::FixUrlProtocol)
                .with_auto_fixable(true),
            );
        }

        if url.starts_with("http://") && !is_local_http(url) {
            issues.push(
                ValidationIssue::warning(
                    IssueCategory::Security,
                    "Using HTTP instead of HTTPS may be insecure",
                )
                .with_field("url")
                .with_suggestion(url.replacen("http://", "https://", 1))
                .with_fix(FixAction::UpgradeToHttps),
            );
        }
        Ok(issues)
    }
}

/// Existence and permission checks for commands given as paths.
pub struct CommandPaths;

impl ValidationRule for CommandPaths {
    fn name(&self) -> &'static str {
        "paths"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationIssue>, RuleError> {
        let Some(command) = ctx.command() else {
            return Ok(Vec::new());
        };
        if !command.contains('/') && !command.contains('\\') {
            return Ok(Vec::new());
        }

        let path = Path::new(command);
        let issue = if !path.exists() {
            ValidationIssue::error(
                IssueCategory::Path,
                format!("Command path does not exist: {command}"),
            )
            .with_fix(FixAction::BrowseForCommand)
        } else if !path.is_file() {
            ValidationIssue::error(
                IssueCategory::Path,
                format!("Command path is not a file: {command}"),
            )
            .with_fix(FixAction::BrowseForCommand)
        } else if !is_executable(path)? {
            ValidationIssue::warning(
                IssueCategory::Path,
                format!("Command file is not executable: {command}"),
            )
            .with_fix(FixAction::FixPermissions)
        } else {
            return Ok(Vec::new());
        };
        Ok(vec![issue.with_field("command")])
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> Result<bool, RuleError> {
    use std::os::unix::fs::PermissionsExt;
    let metadata = std::fs::metadata(path)
        .map_err(|e| RuleError(format!("cannot stat {}: {e}", path.display())))?;
    Ok(metadata.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> Result<bool, RuleError> {
    Ok(true)
}

/// String values that contain JSON documents.
pub struct EmbeddedJson;

impl EmbeddedJson {
    fn walk(&self, path: &str, value: &Value, issues: &mut Vec<ValidationIssue>) {
        match value {
            Value::String(s) => {
                let trimmed = s.trim();
                let looks_like_json = trimmed.starts_with(['{', '['])
                    && trimmed.ends_with(['}', ']']);
                if !looks_like_json {
                    return;
                }
                let issue = match serde_json::from_str::<Value>(trimmed) {
                    Ok(_) => ValidationIssue::info(
                        IssueCategory::Format,
                        format!("Value appears to be JSON string, consider parsing: {path}"),
                    )
                    .with_fix(FixAction::ParseJsonValue),
                    Err(e) => ValidationIssue::error(
                        IssueCategory::Format,
                        format!("Invalid JSON syntax in {path}: {e}"),
                    )
                    .with_fix(FixAction::FixJsonSyntax),
                };
                issues.push(issue.with_field(path).with_auto_fixable(false));
            }
            Value::Object(map) => {
                for (key, inner) in map {
                    self.walk(&format!("{path}.{key}"), inner, issues);
                }
            }
            Value::Array(items) => {
                for (i, inner) in items.iter().enumerate() {
                    self.walk(&format!("{path}[{i}]"), inner, issues);
                }
            }
            _ => {}
        }
    }
}

impl ValidationRule for EmbeddedJson {
    fn name(&self) -> &'static str {
        "embedded_json"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationIssue>, RuleError> {
        let mut issues = Vec::new();
        for (key, value) in ctx.config {
            self.walk(key, value, &mut issues);
        }
        Ok(issues)
    }
}

/// Misspelled field names and launcher names.
pub struct CommonTypos;

impl ValidationRule for CommonTypos {
    fn name(&self) -> &'static str {
        "common_typos"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationIssue>, RuleError> {
        let mut issues: Vec<ValidationIssue> = FIELD_TYPOS
            .iter()
            .filter(|(typo, correct)| {
                ctx.config.contains_key(*typo) && !ctx.config.contains_key(*correct)
            })
            .map(|(typo, correct)| {
                ValidationIssue::warning(
                    IssueCategory::CommonTypo,
                    format!("Did you mean '{correct}' instead of '{typo}'?"),
                )
                .with_field(*typo)
                .with_suggestion(*correct)
                .with_fix(FixAction::FixFieldName)
                .with_auto_fixable(true)
            })
            .collect();

        if let Some(command) = ctx.command()
            && let Some((_, better)) = COMMAND_TYPOS.iter().find(|(typo, _)| *typo == command)
        {
            issues.push(
                ValidationIssue::info(
                    IssueCategory::Suggestion,
                    format!("Consider using '{better}' instead of '{command}'"),
                )
                .with_field("command")
                .with_suggestion(*better)
                .with_fix(FixAction::FixCommandName),
            );
        }
        Ok(issues)
    }
}

/// Soft metadata suggestions.
pub struct Improvements;

impl ValidationRule for Improvements {
    fn name(&self) -> &'static str {
        "suggestions"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<Vec<ValidationIssue>, RuleError> {
        let mut issues = Vec::new();
        let metadata = ctx.get("metadata");

        if metadata.is_none() && !ctx.config.contains_key("description") {
            issues.push(
                ValidationIssue::info(
                    IssueCategory::Suggestion,
                    "Consider adding a description to help identify this server",
                )
                .with_field("metadata.description")
                .with_fix(FixAction::AddDescription),
            );
        }

        if is_blank(metadata.and_then(|m| m.get("tags"))) {
            issues.push(
                ValidationIssue::info(
                    IssueCategory::Suggestion,
                    "Consider adding tags for better server organization",
                )
                .with_field("metadata.tags")
                .with_fix(FixAction::AddTags),
            );
        }

        if ctx.env().is_some_and(|env| env.len() > MAX_INLINE_ENV_VARS) {
            issues.push(
                ValidationIssue::info(
                    IssueCategory::Suggestion,
                    "Consider using a .env file for better environment variable management",
                )
                .with_field("env")
                .with_fix(FixAction::SuggestEnvFile),
            );
        }
        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::issue::Severity;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn run(rule: &dyn ValidationRule, config: Value) -> Vec<ValidationIssue> {
        let map = config.as_object().cloned().unwrap();
        rule.check(&RuleContext {
            server_name: "test",
            config: &map,
        })
        .unwrap()
    }

    fn fixes(issues: &[ValidationIssue]) -> Vec<FixAction> {
        issues.iter().filter_map(|i| i.fix_action).collect()
    }

    #[test]
    fn required_fields_by_type() {
        let issues = run(&RequiredFields, json!({"type": "stdio"}));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].category, IssueCategory::RequiredField);
        assert_eq!(issues[0].field.as_deref(), Some("command"));

        let issues = run(&RequiredFields, json!({"type": "sse", "url": ""}));
        assert_eq!(fixes(&issues), vec![FixAction::AddUrl]);

        assert!(run(&RequiredFields, json!({"command": "npx"})).is_empty());
    }

    #[test]
    fn unknown_type_suggests_stdio() {
        let issues = run(&RequiredFields, json!({"type": "grpc", "command": "x"}));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "Invalid server type: grpc");
        assert_eq!(issues[0].suggested_value.as_deref(), Some("stdio"));
        assert!(issues[0].auto_fixable);
    }

    #[test]
    fn schema_failure_is_format_error() {
        let issues = run(&SchemaShape, json!({"type": "http"}));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].category, IssueCategory::Format);
        assert!(issues[0].message.starts_with("Configuration validation failed:"));
    }

    #[test]
    fn args_string_is_flagged() {
        let issues = run(&CommandAndArgs, json!({"command": "npx", "args": "-y pkg"}));
        assert_eq!(fixes(&issues), vec![FixAction::FixArgsFormat]);
        assert!(issues[0].auto_fixable);
    }

    #[rstest]
    #[case(json!(["-y", "server-files"]), Some("server-files@latest"))]
    #[case(json!(["-y", "server-files@1.2.0"]), None)]
    #[case(json!(["@scope/server"]), Some("@scope/server@latest"))]
    #[case(json!(["@scope/server@2"]), None)]
    fn npx_version_pinning(#[case] args: Value, #[case] expected: Option<&str>) {
        let issues = run(&CommandAndArgs, json!({"command": "npx", "args": args}));
        let suggestion = issues
            .iter()
            .find(|i| i.fix_action == Some(FixAction::PinPackageVersion))
            .and_then(|i| i.suggested_value.as_deref());
        assert_eq!(suggestion, expected);
    }

    #[test]
    fn unknown_command_warns_about_path() {
        let issues = run(&CommandAndArgs, json!({"command": "no-such-binary-xyz-17"}));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].category, IssueCategory::Path);
    }

    #[test]
    fn env_must_be_mapping() {
        let issues = run(&EnvironmentShape, json!({"env": ["A=1"]}));
        assert_eq!(fixes(&issues), vec![FixAction::FixEnvFormat]);
    }

    #[test]
    fn empty_env_values_are_flagged() {
        let issues = run(&EnvironmentShape, json!({"env": {"A": "", "B": "x"}}));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field.as_deref(), Some("env.A"));
        assert_eq!(issues[0].category, IssueCategory::MissingValue);
    }

    #[test]
    fn api_key_placeholder_and_short_values() {
        let issues = run(
            &ApiKeys,
            json!({"env": {"SERVICE_API_KEY": "YOUR_API_KEY_HERE", "AUTH_TOKEN": "abc", "LOG_LEVEL": "x"}}),
        );
        assert_eq!(
            fixes(&issues),
            vec![FixAction::SetApiKey, FixAction::VerifyApiKey]
        );
    }

    #[rstest]
    #[case("OPENAI_API_KEY", "sk-proj-abcdefghijkl", true)]
    #[case("OPENAI_API_KEY", "pk-abcdefghijkl", false)]
    #[case("ANTHROPIC_API_KEY", "sk-ant-api03-abcdefgh", true)]
    #[case("ANTHROPIC_API_KEY", "sk-abcdefghijklmn", false)]
    #[case("GITHUB_TOKEN", "ghp_abcdefghijklmnop", true)]
    #[case("GITHUB_TOKEN", "token-abcdefghijkl", false)]
    #[case("GOOGLE_API_KEY", "AIzaSyabcdefghijkl", true)]
    #[case("GOOGLE_API_KEY", "key-abcdefghijkl", false)]
    fn provider_formats(#[case] key: &str, #[case] value: &str, #[case] ok: bool) {
        let issues = run(&ApiKeys, json!({"env": {key: value}}));
        let flagged = issues
            .iter()
            .any(|i| i.fix_action == Some(FixAction::VerifyApiKeyFormat));
        assert_eq!(flagged, !ok, "{key}={value}");
    }

    #[test]
    fn url_without_scheme() {
        let issues = run(&Urls, json!({"type": "http", "url": "example.com/api"}));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(
            issues[0].suggested_value.as_deref(),
            Some("https://example.com/api")
        );
    }

    #[rstest]
    #[case("http://api.example.com", true)]
    #[case("http://localhost:8080/mcp", false)]
    #[case("http://127.0.0.1/mcp", false)]
    #[case("http://localhost.evil.com", true)]
    #[case("https://api.example.com", false)]
    fn http_security_warning(#[case] url: &str, #[case] warned: bool) {
        let issues = run(&Urls, json!({"type": "http", "url": url}));
        let has_warning = issues.iter().any(|i| i.category == IssueCategory::Security);
        assert_eq!(has_warning, warned, "{url}");
    }

    #[test]
    fn non_string_url() {
        let issues = run(&Urls, json!({"type": "http", "url": 42}));
        assert_eq!(fixes(&issues), vec![FixAction::FixUrlFormat]);
    }

    #[test]
    fn missing_command_path() {
        let issues = run(&CommandPaths, json!({"command": "/definitely/not/here/bin"}));
        assert_eq!(fixes(&issues), vec![FixAction::BrowseForCommand]);
    }

    #[test]
    fn directory_command_path() {
        let dir = tempfile::tempdir().unwrap();
        let command = dir.path().to_string_lossy().into_owned();
        let issues = run(&CommandPaths, json!({ "command": command }));
        assert!(issues[0].message.contains("is not a file"));
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_command_path() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("server.sh");
        std::fs::write(&script, "#!/bin/sh\n").unwrap();
        let issues = run(
            &CommandPaths,
            json!({ "command": script.to_string_lossy() }),
        );
        assert_eq!(fixes(&issues), vec![FixAction::FixPermissions]);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn embedded_json_detection() {
        let issues = run(
            &EmbeddedJson,
            json!({"args": ["--config", "{\"a\": 1}"], "env": {"BAD": "{oops}"}}),
        );
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].field.as_deref(), Some("args[1]"));
        assert_eq!(issues[0].fix_action, Some(FixAction::ParseJsonValue));
        assert_eq!(issues[1].field.as_deref(), Some("env.BAD"));
        assert_eq!(issues[1].fix_action, Some(FixAction::FixJsonSyntax));
    }

    #[test]
    fn field_typos_only_when_correct_key_absent() {
        let issues = run(&CommonTypos, json!({"cmd": "npx", "arguments": ["-y"]}));
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].message, "Did you mean 'command' instead of 'cmd'?");
        assert_eq!(issues[1].suggested_value.as_deref(), Some("args"));

        let issues = run(&CommonTypos, json!({"cmd": "npx", "command": "npx"}));
        assert!(issues.is_empty());
    }

    #[test]
    fn command_typos_are_suggestions() {
        let issues = run(&CommonTypos, json!({"command": "nodejs"}));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].category, IssueCategory::Suggestion);
        assert_eq!(issues[0].suggested_value.as_deref(), Some("node"));
    }

    #[test]
    fn improvement_suggestions() {
        let issues = run(&Improvements, json!({"command": "npx"}));
        assert_eq!(fixes(&issues), vec![FixAction::AddDescription, FixAction::AddTags]);

        let issues = run(
            &Improvements,
            json!({"metadata": {"tags": ["files"]}, "env": {"A": 1, "B": 2, "C": 3, "D": 4, "E": 5, "F": 6}}),
        );
        assert_eq!(fixes(&issues), vec![FixAction::SuggestEnvFile]);
    }

    #[test]
    fn default_rule_names_are_unique() {
        let rules = default_rules();
        let mut names: Vec<_> = rules.iter().map(|r| r.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 10);
    }
}
