//! Launch command portability
//!
//! Windows hosts cannot start `npx`-style shims directly from a server
//! definition; they need `cmd /c <command> ...`. The [`CommandAdapter`] adds
//! that indirection on push and strips it on pull, so the canonical store
//! stays host-neutral.

use mcpsync_meta::{ServerMap, ServerType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Commands that need the shell indirection on Windows.
pub const WRAPPED_COMMANDS: &[&str] = &["npx", "uvx", "node", "python", "py"];

const SHELL: &str = "cmd";
const SHELL_FLAG: &str = "/c";
const INLINE_PREFIX: &str = "cmd /c ";

/// The host family a store is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostFamily {
    Windows,
    Unix,
}

impl HostFamily {
    /// The family of the machine running this process.
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Unix
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Unix => "unix",
        }
    }
}

impl fmt::Display for HostFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "windows" | "win" => Ok(Self::Windows),
            "unix" | "linux" | "macos" | "darwin" => Ok(Self::Unix),
            other => Err(format!("unknown host family: {other}")),
        }
    }
}

/// Wraps and unwraps launch commands for a host family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandAdapter {
    host: HostFamily,
}

impl Default for CommandAdapter {
    fn default() -> Self {
        Self::new(HostFamily::current())
    }
}

fn is_stdio(config: &Value) -> bool {
    ServerType::from_field(config.get("type")) == Some(ServerType::Stdio)
}

impl CommandAdapter {
    pub fn new(host: HostFamily) -> Self {
        Self { host }
    }

    pub fn host(&self) -> HostFamily {
        self.host
    }

    /// Whether `wrap` would change `config`.
    pub fn needs_wrap(&self, config: &Value) -> bool {
        if self.host != HostFamily::Windows || !is_stdio(config) {
            return false;
        }
        let Some(command) = config.get("command").and_then(Value::as_str) else {
            return false;
        };
        !command.eq_ignore_ascii_case(SHELL)
            && WRAPPED_COMMANDS
                .iter()
                .any(|c| c.eq_ignore_ascii_case(command))
            && match config.get("args") {
                None => true,
                // `unwrap` cannot tell an explicit empty list from no args
                Some(Value::Array(items)) => {
                    !items.is_empty() || config.get("packageOrCommand").is_some()
                }
                Some(_) => false,
            }
    }

    /// Rewrite `command` to `cmd` with `/c <command>` prepended to `args`.
    pub fn wrap(&self, config: &Value) -> Value {
        if !self.needs_wrap(config) {
            return config.clone();
        }
        let mut wrapped = config.clone();
        let Some(fields) = wrapped.as_object_mut() else {
            return config.clone();
        };
        let Some(Value::String(command)) = fields.insert("command".into(), SHELL.into()) else {
            return config.clone();
        };

        let mut args = vec![Value::from(SHELL_FLAG), Value::String(command.clone())];
        let existing = match fields.get("args") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        if existing.is_empty()
            && let Some(package) = fields.shift_remove("packageOrCommand")
        {
            args.push(package);
        } else {
            args.extend(existing);
        }
        fields.insert("args".into(), Value::Array(args));

        tracing::debug!(command = %command, "Wrapped command for Windows");
        wrapped
    }

    /// Restore the original command from a `cmd /c` shape. Works on any host.
    pub fn unwrap(&self, config: &Value) -> Value {
        if !is_stdio(config) {
            return config.clone();
        }
        let Some(command) = config.get("command").and_then(Value::as_str) else {
            return config.clone();
        };

        if command.eq_ignore_ascii_case(SHELL)
            && let Some(Value::Array(args)) = config.get("args")
            && args.len() >= 2
            && args[0].as_str() == Some(SHELL_FLAG)
            && let Some(original) = args[1].as_str()
        {
            let mut unwrapped = config.clone();
            if let Some(fields) = unwrapped.as_object_mut() {
                fields.insert("command".into(), Value::String(original.to_string()));
                let rest = args[2..].to_vec();
                if rest.is_empty() {
                    fields.shift_remove("args");
                } else {
                    fields.insert("args".into(), Value::Array(rest));
                }
            }
            tracing::debug!(command = %original, "Unwrapped Windows command");
            return unwrapped;
        }

        if command.len() > INLINE_PREFIX.len()
            && command.is_char_boundary(INLINE_PREFIX.len())
            && command[..INLINE_PREFIX.len()].eq_ignore_ascii_case(INLINE_PREFIX)
        {
            let original = command[INLINE_PREFIX.len()..].to_string();
            let mut unwrapped = config.clone();
            if let Some(fields) = unwrapped.as_object_mut() {
                tracing::debug!(command = %original, "Unwrapped inline Windows command");
                fields.insert("command".into(), Value::String(original));
            }
            return unwrapped;
        }

        config.clone()
    }

    pub fn wrap_all(&self, servers: &ServerMap) -> ServerMap {
        let wrapped: ServerMap = servers
            .iter()
            .map(|(name, config)| (name.clone(), self.wrap(config)))
            .collect();
        let count = changed(servers, &wrapped);
        if count > 0 {
            tracing::info!(count, host = %self.host, "Wrapped commands for host");
        }
        wrapped
    }

    pub fn unwrap_all(&self, servers: &ServerMap) -> ServerMap {
        let unwrapped: ServerMap = servers
            .iter()
            .map(|(name, config)| (name.clone(), self.unwrap(config)))
            .collect();
        let count = changed(servers, &unwrapped);
        if count > 0 {
            tracing::info!(count, "Unwrapped host-specific commands");
        }
        unwrapped
    }
}

fn changed(before: &ServerMap, after: &ServerMap) -> usize {
    before
        .iter()
        .filter(|(name, config)| after.get(name.as_str()) != Some(config))
        .count()
}
