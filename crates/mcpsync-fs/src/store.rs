//! JSON document stores
//!
//! A [`JsonStore`] is one JSON file whose top level is an object. Loading a
//! missing file yields an empty document; anything that is not a JSON object
//! is an error rather than an empty default, so a broken file is never
//! silently overwritten.

use crate::{Error, Result, io};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Default indentation for written documents
pub const DEFAULT_INDENT: usize = 2;

/// A JSON object persisted in a single file.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
    indent: usize,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            indent: DEFAULT_INDENT,
        }
    }

    /// Use `indent` spaces per level when saving.
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the document, treating a missing file as an empty object.
    pub fn load(&self) -> Result<Map<String, Value>> {
        let Some(content) = io::read_text_if_exists(&self.path)? else {
            tracing::debug!(path = %self.path.display(), "JSON store not found, starting empty");
            return Ok(Map::new());
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        let value: Value = serde_json::from_str(&content).map_err(|e| Error::Parse {
            path: self.path.clone(),
            format: "JSON".into(),
            message: e.to_string(),
        })?;

        match value {
            Value::Object(map) => {
                tracing::debug!(path = %self.path.display(), keys = map.len(), "Loaded JSON store");
                Ok(map)
            }
            _ => Err(Error::NotAnObject {
                path: self.path.clone(),
            }),
        }
    }

    /// Atomically replace the file with `document`.
    pub fn save(&self, document: &Map<String, Value>) -> Result<()> {
        let content = to_pretty_json(document, self.indent).map_err(|e| Error::Serialize {
            path: self.path.clone(),
            format: "JSON".into(),
            message: e.to_string(),
        })?;
        io::write_text(&self.path, &content)?;
        tracing::info!(path = %self.path.display(), "Saved JSON store");
        Ok(())
    }
}

/// Pretty-print `value` with the given indentation and a trailing newline.
pub fn to_pretty_json<T: Serialize + ?Sized>(
    value: &T,
    indent: usize,
) -> serde_json::Result<String> {
    let indent = " ".repeat(indent);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    buf.push(b'\n');
    // serde_json only emits UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
