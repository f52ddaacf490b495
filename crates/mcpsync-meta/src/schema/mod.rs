//! Typed server definitions
//!
//! Raw configurations stay as `serde_json::Value` throughout validation,
//! repair and sync so unknown fields survive untouched. The typed view here
//! is the structural contract: [`parse_server_config`] either produces an
//! [`McpServer`] or a [`SchemaError`] describing what is malformed.
//!
//! The parser is deliberately structural. It checks shapes (strings, lists,
//! scalar env values, non-empty launch fields) and leaves content checks such
//! as URL schemes to the validation rules.

use crate::{SchemaError, SchemaResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Transport families a server can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerType {
    Stdio,
    Http,
    Sse,
    Docker,
}

impl ServerType {
    pub const ALL: [ServerType; 4] = [Self::Stdio, Self::Http, Self::Sse, Self::Docker];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
            Self::Sse => "sse",
            Self::Docker => "docker",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Type declared by a raw config. An absent `type` means stdio.
    ///
    /// Returns `None` for a type that is present but unknown or not a string.
    pub fn of(config: &Value) -> Option<Self> {
        Self::from_field(config.get("type"))
    }

    /// Interpret the raw value of a `type` field.
    pub fn from_field(field: Option<&Value>) -> Option<Self> {
        match field {
            None | Some(Value::Null) => Some(Self::Stdio),
            Some(Value::String(s)) => Self::parse(s),
            Some(_) => None,
        }
    }

    /// Process-launching transports carry `command`/`args`.
    pub fn is_process(&self) -> bool {
        matches!(self, Self::Stdio | Self::Docker)
    }

    /// Remote transports carry `url`.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Http | Self::Sse)
    }
}

impl fmt::Display for ServerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport-specific part of a server definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum McpTransportConfig {
    /// Local process talking over stdin/stdout.
    Stdio {
        command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        args: Option<Vec<String>>,
        /// Single-field launch form used by a few older entries.
        #[serde(
            default,
            rename = "packageOrCommand",
            skip_serializing_if = "Option::is_none"
        )]
        package_or_command: Option<String>,
    },
    /// Streamable HTTP endpoint.
    Http { url: String },
    /// Server-Sent Events endpoint.
    Sse { url: String },
    /// Container launched through the docker CLI.
    Docker {
        command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        args: Option<Vec<String>>,
    },
}

impl McpTransportConfig {
    pub fn server_type(&self) -> ServerType {
        match self {
            Self::Stdio { .. } => ServerType::Stdio,
            Self::Http { .. } => ServerType::Http,
            Self::Sse { .. } => ServerType::Sse,
            Self::Docker { .. } => ServerType::Docker,
        }
    }
}

/// Scalar environment value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    String(String),
    Bool(bool),
    Integer(i64),
    Float(f64),
}

/// A structurally valid server definition.
#[derive(Debug, Clone, PartialEq)]
pub struct McpServer {
    pub name: String,
    pub transport: McpTransportConfig,
    pub env: Option<IndexMap<String, EnvValue>>,
}

impl McpServer {
    pub fn server_type(&self) -> ServerType {
        self.transport.server_type()
    }
}

/// Parse a raw configuration into its typed form.
///
/// Fields not described by the schema are ignored, matching how stores keep
/// extra metadata next to launch parameters.
pub fn parse_server_config(name: &str, config: &Value) -> SchemaResult<McpServer> {
    let Value::Object(fields) = config else {
        return Err(SchemaError::NotAnObject {
            server: name.to_string(),
        });
    };

    let declared = match fields.get("type") {
        None | Some(Value::Null) => ServerType::Stdio,
        Some(Value::String(s)) => ServerType::parse(s).ok_or_else(|| SchemaError::UnknownType {
            found: s.clone(),
        })?,
        Some(_) => {
            return Err(SchemaError::TypeNotString {
                server: name.to_string(),
            });
        }
    };

    let mut tagged = fields.clone();
    tagged.insert("type".into(), Value::String(declared.as_str().into()));
    // env is parsed separately so its errors name the field
    tagged.remove("env");

    let transport: McpTransportConfig =
        serde_json::from_value(Value::Object(tagged)).map_err(|e| SchemaError::Invalid {
            message: e.to_string(),
        })?;

    let transport = match transport {
        McpTransportConfig::Stdio {
            command,
            args,
            package_or_command,
        } => McpTransportConfig::Stdio {
            command: non_empty("command", command)?,
            args,
            package_or_command,
        },
        McpTransportConfig::Docker { command, args } => McpTransportConfig::Docker {
            command: non_empty("command", command)?,
            args,
        },
        McpTransportConfig::Http { url } => McpTransportConfig::Http {
            url: non_empty("url", url)?,
        },
        McpTransportConfig::Sse { url } => McpTransportConfig::Sse {
            url: non_empty("url", url)?,
        },
    };

    let env = match fields.get("env") {
        None | Some(Value::Null) => None,
        Some(raw) => Some(
            serde_json::from_value::<IndexMap<String, EnvValue>>(raw.clone()).map_err(|e| {
                SchemaError::Invalid {
                    message: format!("env: {e}"),
                }
            })?,
        ),
    };

    Ok(McpServer {
        name: name.to_string(),
        transport,
        env,
    })
}

fn non_empty(field: &'static str, value: String) -> SchemaResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SchemaError::EmptyField { field });
    }
    Ok(trimmed.to_string())
}
