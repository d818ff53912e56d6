//! Per-file load outcomes shared by the profile and template loaders.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Outcome of loading a single input file.
#[derive(Debug, Clone, Serialize)]
pub struct LoadResult {
    /// Path to the file that was loaded.
    pub path: PathBuf,
    /// Status of the load attempt.
    pub status: LoadStatus,
}

/// Status of a single file load attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadStatus {
    /// File was successfully loaded under the given id.
    Loaded { id: String },
    /// File was skipped (dotfile, non-YAML, filtered out, etc.).
    Skipped { reason: String },
    /// Parse or validation error occurred.
    Failed { error: String },
}

impl LoadResult {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, LoadStatus::Failed { .. })
    }
}

/// Whether `path` has a `.yml` / `.yaml` extension.
pub(crate) fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "yml" || e == "yaml")
        .unwrap_or(false)
}

/// Whether the final path component starts with a dot.
pub(crate) fn is_dotfile(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}
