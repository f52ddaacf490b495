//! Strategies that turn a single issue into a repair action
//!
//! Strategies are consulted in the order returned by [`default_strategies`].
//! The first one whose `can_handle` accepts an issue owns it, even if it then
//! declines to produce an action.

use super::action::{RepairAction, RepairTransform};
use crate::validation::{FixAction, IssueCategory, ValidationIssue};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Maps one kind of validation issue to a repair action.
pub trait RepairStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn can_handle(&self, issue: &ValidationIssue) -> bool;

    /// Build an action for `issue`, or `None` when no safe fix exists.
    fn create_action(
        &self,
        issue: &ValidationIssue,
        server_name: &str,
        config: &Value,
    ) -> Option<RepairAction>;
}

/// The built-in strategies in priority order.
pub fn default_strategies() -> Vec<Box<dyn RepairStrategy>> {
    vec![
        Box::new(RequiredFieldStrategy),
        Box::new(ApiKeyStrategy),
        Box::new(FormatStrategy),
        Box::new(TypoStrategy),
        Box::new(PathStrategy::default()),
        Box::new(SuggestionStrategy),
    ]
}

fn field_value(config: &Value, field: &str) -> Option<Value> {
    config.get(field).cloned()
}

fn str_field<'a>(config: &'a Value, field: &str) -> Option<&'a str> {
    config.get(field).and_then(Value::as_str)
}

/// Fills in missing `command`, `url` and invalid `type`.
pub struct RequiredFieldStrategy;

pub const PLACEHOLDER_COMMAND: &str = "npx";
pub const PLACEHOLDER_ARGS: &[&str] = &["-y", "mcp-server-example"];
pub const PLACEHOLDER_URL: &str = "https://example.com/mcp";

impl RepairStrategy for RequiredFieldStrategy {
    fn name(&self) -> &'static str {
        "required_field"
    }

    fn can_handle(&self, issue: &ValidationIssue) -> bool {
        issue.category == IssueCategory::RequiredField
    }

    fn create_action(
        &self,
        issue: &ValidationIssue,
        server_name: &str,
        config: &Value,
    ) -> Option<RepairAction> {
        match issue.fix_action? {
            FixAction::AddCommand => {
                let args = PLACEHOLDER_ARGS.iter().map(|a| a.to_string()).collect();
                Some(
                    RepairAction::new(
                        "add_command",
                        "Add command field",
                        format!("Add a launch command to {server_name}"),
                        0.3,
                        RepairTransform::AddCommand {
                            command: PLACEHOLDER_COMMAND.into(),
                            default_args: args,
                        },
                    )
                    .with_values(None, Some(Value::String(PLACEHOLDER_COMMAND.into())))
                    .with_preview(format!(
                        "command: {PLACEHOLDER_COMMAND} {}",
                        PLACEHOLDER_ARGS.join(" ")
                    )),
                )
            }
            FixAction::AddUrl => Some(
                RepairAction::new(
                    "add_url",
                    "Add URL field",
                    format!("Add an endpoint URL to {server_name}"),
                    0.3,
                    RepairTransform::SetField {
                        field: "url".into(),
                        value: Value::String(PLACEHOLDER_URL.into()),
                    },
                )
                .with_values(None, Some(Value::String(PLACEHOLDER_URL.into())))
                .with_preview(format!("url: {PLACEHOLDER_URL}")),
            ),
            FixAction::SetServerType => {
                let server_type = issue.suggested_value.clone()?;
                let after = Value::String(server_type.clone());
                Some(
                    RepairAction::new(
                        "set_server_type",
                        format!("Set server type to '{server_type}'"),
                        format!("Replace the invalid type of {server_name}"),
                        0.8,
                        RepairTransform::SetField {
                            field: "type".into(),
                            value: after.clone(),
                        },
                    )
                    .auto()
                    .with_values(field_value(config, "type"), Some(after)),
                )
            }
            _ => None,
        }
    }
}

/// Expected shapes shown when a provider key has the wrong prefix.
const KEY_FORMAT_HINTS: &[(&str, &str)] = &[
    ("OPENAI_API_KEY", "sk-proj-..."),
    ("ANTHROPIC_API_KEY", "sk-ant-api03-..."),
    ("GITHUB_TOKEN", "ghp_..."),
    ("GITHUB_PERSONAL_ACCESS_TOKEN", "ghp_..."),
    ("GOOGLE_API_KEY", "AIza..."),
];

/// Replaces credential placeholders with visible, named placeholders.
///
/// Never writes anything that could pass for a real key.
pub struct ApiKeyStrategy;

impl RepairStrategy for ApiKeyStrategy {
    fn name(&self) -> &'static str {
        "api_key"
    }

    fn can_handle(&self, issue: &ValidationIssue) -> bool {
        issue.category == IssueCategory::ApiKey && issue.env_key().is_some()
    }

    fn create_action(
        &self,
        issue: &ValidationIssue,
        _server_name: &str,
        config: &Value,
    ) -> Option<RepairAction> {
        let key = issue.env_key()?;
        let before = config.get("env").and_then(|env| env.get(key)).cloned();

        match issue.fix_action? {
            FixAction::SetApiKey => {
                let value = format!("YOUR_{}_HERE", key.to_uppercase());
                Some(
                    RepairAction::new(
                        "set_api_key",
                        format!("Set {key}"),
                        format!("Mark {key} as needing a real value"),
                        0.2,
                        RepairTransform::SetEnvValue {
                            key: key.to_string(),
                            value: value.clone(),
                        },
                    )
                    .with_values(before, Some(Value::String(value)))
                    .with_preview(format!("Enter your {key} in the secrets file")),
                )
            }
            FixAction::VerifyApiKeyFormat => {
                let (_, hint) = KEY_FORMAT_HINTS.iter().find(|(var, _)| *var == key)?;
                let value = format!("<YOUR_{key}: {hint}>");
                Some(
                    RepairAction::new(
                        "fix_api_key_format",
                        format!("Fix {key} format"),
                        format!("Expected format: {hint}"),
                        0.6,
                        RepairTransform::SetEnvValue {
                            key: key.to_string(),
                            value: value.clone(),
                        },
                    )
                    .with_values(before, Some(Value::String(value))),
                )
            }
            _ => None,
        }
    }
}

/// Shape fixes for `args`, `url` and `env`.
pub struct FormatStrategy;

impl RepairStrategy for FormatStrategy {
    fn name(&self) -> &'static str {
        "format"
    }

    fn can_handle(&self, issue: &ValidationIssue) -> bool {
        issue.category == IssueCategory::Format
    }

    fn create_action(
        &self,
        issue: &ValidationIssue,
        _server_name: &str,
        config: &Value,
    ) -> Option<RepairAction> {
        match issue.fix_action? {
            FixAction::FixArgsFormat => {
                let raw = str_field(config, "args")?;
                let list: Vec<Value> = raw
                    .split_whitespace()
                    .map(|a| Value::String(a.to_string()))
                    .collect();
                Some(
                    RepairAction::new(
                        "fix_args_format",
                        "Convert args to list format",
                        "Split the argument string on whitespace",
                        0.9,
                        RepairTransform::ArgsToList,
                    )
                    .auto()
                    .with_values(field_value(config, "args"), Some(Value::Array(list))),
                )
            }
            FixAction::FixUrlProtocol => {
                let url = str_field(config, "url")?;
                let fixed = match issue.suggested_value.as_deref() {
                    Some(s) if s.starts_with("http://") || s.starts_with("https://") => {
                        s.to_string()
                    }
                    _ => format!("https://{url}"),
                };
                if fixed == url {
                    return None;
                }
                Some(
                    RepairAction::new(
                        "fix_url_protocol",
                        "Add HTTPS protocol to URL",
                        format!("Use {fixed}"),
                        0.8,
                        RepairTransform::SetField {
                            field: "url".into(),
                            value: Value::String(fixed.clone()),
                        },
                    )
                    .auto()
                    .with_values(field_value(config, "url"), Some(Value::String(fixed))),
                )
            }
            FixAction::FixEnvFormat => Some(
                RepairAction::new(
                    "fix_env_format",
                    "Convert env to a mapping",
                    "Keep KEY=VALUE entries and drop the rest",
                    0.7,
                    RepairTransform::CoerceEnv,
                )
                .auto()
                .with_values(field_value(config, "env"), None),
            ),
            _ => None,
        }
    }
}

/// Moves a value from a misspelled key to the key it was meant to be.
pub struct TypoStrategy;

impl RepairStrategy for TypoStrategy {
    fn name(&self) -> &'static str {
        "typo"
    }

    fn can_handle(&self, issue: &ValidationIssue) -> bool {
        issue.category == IssueCategory::CommonTypo
            && issue.field.is_some()
            && issue.suggested_value.is_some()
    }

    fn create_action(
        &self,
        issue: &ValidationIssue,
        _server_name: &str,
        config: &Value,
    ) -> Option<RepairAction> {
        let from = issue.field.as_deref()?;
        let to = issue.suggested_value.as_deref()?;
        let value = config.get(from)?.clone();
        Some(
            RepairAction::new(
                "fix_field_name",
                format!("Rename '{from}' to '{to}'"),
                format!("'{from}' is a common misspelling of '{to}'"),
                0.9,
                RepairTransform::RenameField {
                    from: from.to_string(),
                    to: to.to_string(),
                },
            )
            .auto()
            .with_values(Some(value.clone()), Some(value)),
        )
    }
}

/// Conventional install locations searched after `PATH`.
pub const CONVENTIONAL_BIN_DIRS: &[&str] = &["/usr/local/bin", "/usr/bin", "/opt/homebrew/bin"];

/// Resolves commands to full paths and fixes permissions.
#[derive(Debug, Clone)]
pub struct PathStrategy {
    search_dirs: Vec<PathBuf>,
    use_path: bool,
}

impl Default for PathStrategy {
    fn default() -> Self {
        let mut search_dirs: Vec<PathBuf> = CONVENTIONAL_BIN_DIRS.iter().map(PathBuf::from).collect();
        search_dirs.push(PathBuf::from(r"C:\Program Files"));
        search_dirs.push(PathBuf::from(r"C:\Program Files (x86)"));
        Self {
            search_dirs,
            use_path: true,
        }
    }
}

impl PathStrategy {
    /// Search only `dirs`, ignoring `PATH`.
    pub fn with_search_dirs(dirs: Vec<PathBuf>) -> Self {
        Self {
            search_dirs: dirs,
            use_path: false,
        }
    }

    /// Find a full path for `command`.
    pub fn locate(&self, command: &str) -> Option<PathBuf> {
        if self.use_path
            && let Ok(found) = which::which(command)
        {
            return Some(found);
        }
        self.search_dirs.iter().find_map(|dir| {
            [command.to_string(), format!("{command}.exe")]
                .into_iter()
                .map(|file| dir.join(file))
                .find(|candidate| candidate.is_file())
        })
    }

    fn resolve_action(&self, command: &str) -> RepairAction {
        let name = Path::new(command)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(command);
        let before = Some(Value::String(command.to_string()));

        match self.locate(name) {
            Some(found) => {
                let found = found.to_string_lossy().into_owned();
                RepairAction::new(
                    "fix_command_path",
                    format!("Use full path for {name}"),
                    format!("Found {name} at {found}"),
                    0.7,
                    RepairTransform::SetField {
                        field: "command".into(),
                        value: Value::String(found.clone()),
                    },
                )
                .auto()
                .with_values(before, Some(Value::String(found)))
            }
            None => {
                let marker = format!("<BROWSE_FOR_{}>", name.to_uppercase());
                RepairAction::new(
                    "browse_for_command",
                    format!("Locate {name}"),
                    format!("{name} was not found; pick its location manually"),
                    0.3,
                    RepairTransform::SetField {
                        field: "command".into(),
                        value: Value::String(marker.clone()),
                    },
                )
                .with_values(before, Some(Value::String(marker)))
                .with_preview(format!("Install {name} or enter its full path"))
            }
        }
    }
}

impl RepairStrategy for PathStrategy {
    fn name(&self) -> &'static str {
        "path"
    }

    fn can_handle(&self, issue: &ValidationIssue) -> bool {
        issue.category == IssueCategory::Path
    }

    fn create_action(
        &self,
        issue: &ValidationIssue,
        _server_name: &str,
        config: &Value,
    ) -> Option<RepairAction> {
        let command = str_field(config, "command")?;
        match issue.fix_action? {
            FixAction::CheckCommandPath | FixAction::BrowseForCommand => {
                Some(self.resolve_action(command))
            }
            FixAction::FixPermissions => Some(
                RepairAction::new(
                    "fix_permissions",
                    "Fix file permissions",
                    format!("Make {command} executable"),
                    0.8,
                    RepairTransform::MakeExecutable {
                        path: PathBuf::from(command),
                    },
                )
                .auto()
                .destructive()
                .with_preview(format!("chmod +x {command}")),
            ),
            _ => None,
        }
    }
}

/// Applies info and security suggestions that carry a concrete value.
pub struct SuggestionStrategy;

impl SuggestionStrategy {
    fn package_index(config: &Value) -> Option<usize> {
        config
            .get("args")?
            .as_array()?
            .iter()
            .position(|a| a.as_str().is_some_and(|s| !s.starts_with('-')))
    }
}

impl RepairStrategy for SuggestionStrategy {
    fn name(&self) -> &'static str {
        "suggestion"
    }

    fn can_handle(&self, issue: &ValidationIssue) -> bool {
        matches!(
            issue.category,
            IssueCategory::Suggestion | IssueCategory::Security
        ) && issue.suggested_value.is_some()
    }

    fn create_action(
        &self,
        issue: &ValidationIssue,
        _server_name: &str,
        config: &Value,
    ) -> Option<RepairAction> {
        let suggested = issue.suggested_value.clone()?;
        let after = Some(Value::String(suggested.clone()));

        match issue.fix_action? {
            FixAction::FixCommandName => Some(
                RepairAction::new(
                    "fix_command_name",
                    format!("Use '{suggested}' as the command"),
                    issue.message.clone(),
                    0.6,
                    RepairTransform::SetField {
                        field: "command".into(),
                        value: Value::String(suggested),
                    },
                )
                .with_values(field_value(config, "command"), after),
            ),
            FixAction::UpgradeToHttps => Some(
                RepairAction::new(
                    "upgrade_to_https",
                    "Upgrade URL to HTTPS",
                    issue.message.clone(),
                    0.7,
                    RepairTransform::SetField {
                        field: "url".into(),
                        value: Value::String(suggested),
                    },
                )
                .with_values(field_value(config, "url"), after),
            ),
            FixAction::PinPackageVersion => {
                let index = Self::package_index(config)?;
                let before = config.get("args")?.get(index).cloned();
                Some(
                    RepairAction::new(
                        "pin_package_version",
                        format!("Pin package to {suggested}"),
                        issue.message.clone(),
                        0.5,
                        RepairTransform::ReplaceArg {
                            index,
                            value: suggested,
                        },
                    )
                    .with_values(before, after),
                )
            }
            _ => None,
        }
    }
}
