//! Timestamped backup copies

use crate::{Error, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

/// Copy `path` to `<path>.backup.<YYYYmmdd_HHMMSS>` next to the original.
///
/// Returns `Ok(None)` when there is nothing to back up.
pub fn backup_file(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No file to back up");
        return Ok(None);
    }

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let backup_path = path.with_file_name(format!("{file_name}.backup.{timestamp}"));

    fs::copy(path, &backup_path).map_err(|e| Error::io(&backup_path, e))?;
    tracing::info!(
        original = %path.display(),
        backup = %backup_path.display(),
        "Created backup"
    );
    Ok(Some(backup_path))
}
