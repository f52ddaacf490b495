//! Repair actions and the transforms they carry

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Why a transform could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepairError {
    #[error("server configuration is not a JSON object")]
    NotAnObject,

    #[error("field '{field}' is missing")]
    MissingField { field: String },

    #[error("field '{field}' already exists")]
    FieldExists { field: String },

    #[error("field '{field}' has the wrong shape: {expected}")]
    WrongShape { field: String, expected: &'static str },

    #[error("argument index {index} is out of range")]
    ArgOutOfRange { index: usize },

    #[error("cannot change permissions of {path}: {message}")]
    Permissions { path: PathBuf, message: String },
}

/// The data-only description of a configuration edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RepairTransform {
    /// Set a top-level field, replacing any current value.
    SetField { field: String, value: Value },
    /// Set a missing or blank `command` and, when absent, placeholder `args`.
    AddCommand {
        command: String,
        default_args: Vec<String>,
    },
    /// Set one env variable, creating `env` if needed.
    SetEnvValue { key: String, value: String },
    /// Split a whitespace-separated `args` string into a list.
    ArgsToList,
    /// Replace `env` with a mapping built from `KEY=VALUE` entries.
    CoerceEnv,
    /// Move a value from a misspelled key to the correct key.
    RenameField { from: String, to: String },
    /// Replace one element of `args`.
    ReplaceArg { index: usize, value: String },
    /// Add the executable bits to a file on disk. The config is unchanged.
    MakeExecutable { path: PathBuf },
}

impl RepairTransform {
    /// Apply to an owned configuration.
    pub fn apply(&self, mut config: Value) -> Result<Value, RepairError> {
        let fields = config.as_object_mut().ok_or(RepairError::NotAnObject)?;

        match self {
            Self::SetField { field, value } => {
                fields.insert(field.clone(), value.clone());
            }
            Self::AddCommand {
                command,
                default_args,
            } => {
                // An earlier repair in the same run may already have restored it
                if fields
                    .get("command")
                    .and_then(Value::as_str)
                    .is_some_and(|current| !current.trim().is_empty())
                {
                    return Err(RepairError::FieldExists {
                        field: "command".into(),
                    });
                }
                fields.insert("command".into(), Value::String(command.clone()));
                if !fields.contains_key("args") {
                    fields.insert("args".into(), string_array(default_args));
                }
            }
            Self::SetEnvValue { key, value } => {
                let env = fields
                    .entry("env")
                    .or_insert_with(|| Value::Object(Map::new()));
                let env = env.as_object_mut().ok_or(RepairError::WrongShape {
                    field: "env".into(),
                    expected: "a mapping",
                })?;
                env.insert(key.clone(), Value::String(value.clone()));
            }
            Self::ArgsToList => {
                let args = fields.get("args").ok_or(RepairError::MissingField {
                    field: "args".into(),
                })?;
                let Value::String(raw) = args else {
                    return Err(RepairError::WrongShape {
                        field: "args".into(),
                        expected: "a string",
                    });
                };
                let list: Vec<String> = raw.split_whitespace().map(str::to_string).collect();
                fields.insert("args".into(), string_array(&list));
            }
            Self::CoerceEnv => {
                let coerced = coerce_env(fields.get("env"));
                fields.insert("env".into(), Value::Object(coerced));
            }
            Self::RenameField { from, to } => {
                if fields.contains_key(to) {
                    return Err(RepairError::FieldExists { field: to.clone() });
                }
                let value = fields
                    .shift_remove(from)
                    .ok_or_else(|| RepairError::MissingField { field: from.clone() })?;
                fields.insert(to.clone(), value);
            }
            Self::ReplaceArg { index, value } => {
                let args = fields
                    .get_mut("args")
                    .and_then(Value::as_array_mut)
                    .ok_or(RepairError::WrongShape {
                        field: "args".into(),
                        expected: "a list",
                    })?;
                let slot = args
                    .get_mut(*index)
                    .ok_or(RepairError::ArgOutOfRange { index: *index })?;
                *slot = Value::String(value.clone());
            }
            Self::MakeExecutable { path } => make_executable(path)?,
        }
        Ok(config)
    }
}

fn string_array(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

/// Build an env mapping from whatever shape `env` currently has.
fn coerce_env(current: Option<&Value>) -> Map<String, Value> {
    let entries: Vec<&str> = match current {
        Some(Value::Object(map)) => return map.clone(),
        Some(Value::String(s)) => s
            .split(|c: char| c == ',' || c.is_whitespace())
            .collect(),
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };

    entries
        .into_iter()
        .filter_map(|entry| entry.trim().split_once('='))
        .filter(|(key, _)| !key.trim().is_empty())
        .map(|(key, value)| (key.trim().to_string(), Value::String(value.trim().to_string())))
        .collect()
}

#[cfg(unix)]
fn make_executable(path: &std::path::Path) -> Result<(), RepairError> {
    use std::os::unix::fs::PermissionsExt;
    let to_error = |e: std::io::Error| RepairError::Permissions {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let mut permissions = std::fs::metadata(path).map_err(to_error)?.permissions();
    permissions.set_mode(permissions.mode() | 0o111);
    std::fs::set_permissions(path, permissions).map_err(to_error)?;
    tracing::info!(path = %path.display(), "Fixed file permissions");
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(path: &std::path::Path) -> Result<(), RepairError> {
    Err(RepairError::Permissions {
        path: path.to_path_buf(),
        message: "executable bits are not supported on this platform".into(),
    })
}

/// One concrete, previewable fix for one issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairAction {
    pub action_id: String,
    pub title: String,
    pub description: String,
    /// Likelihood the fix is correct, in `[0, 1]`
    pub confidence: f64,
    pub auto_applicable: bool,
    /// Touches something outside the configuration
    pub destructive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    pub transform: RepairTransform,
}

impl RepairAction {
    pub fn new(
        action_id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        confidence: f64,
        transform: RepairTransform,
    ) -> Self {
        Self {
            action_id: action_id.into(),
            title: title.into(),
            description: description.into(),
            confidence: confidence.clamp(0.0, 1.0),
            auto_applicable: false,
            destructive: false,
            before_value: None,
            after_value: None,
            preview: None,
            transform,
        }
    }

    pub fn auto(mut self) -> Self {
        self.auto_applicable = true;
        self
    }

    pub fn destructive(mut self) -> Self {
        self.destructive = true;
        self
    }

    pub fn with_values(mut self, before: Option<Value>, after: Option<Value>) -> Self {
        self.before_value = before;
        self.after_value = after;
        self
    }

    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.preview = Some(preview.into());
        self
    }

    /// Whether applying needs an explicit confirmation.
    pub fn needs_confirmation(&self) -> bool {
        self.destructive || !self.auto_applicable
    }

    /// Apply to a copy of `config`; the input is never modified.
    pub fn apply(&self, config: &Value) -> Result<Value, RepairError> {
        self.transform.apply(config.clone())
    }
}
