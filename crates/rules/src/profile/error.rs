//! Error types for profile loading.

use std::path::PathBuf;

/// Errors that can occur while loading or looking up environment profiles.
///
/// All variants except [`ConfigError::MissingDirectory`] concern a single
/// profile file: the store records them and keeps loading the rest.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse/deserialization error.
    #[error("{}: YAML parse error: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// A required key is absent or empty.
    #[error("{}: missing required key '{key}'", .path.display())]
    MissingKey { path: PathBuf, key: &'static str },

    /// A key is present but its value is unusable.
    #[error("{}: invalid '{key}': {message}", .path.display())]
    Invalid {
        path: PathBuf,
        key: String,
        message: String,
    },

    /// Two files declare the same profile name.
    #[error("{}: duplicate profile '{id}' (first defined in {})", .path.display(), .first.display())]
    Duplicate {
        id: String,
        path: PathBuf,
        first: PathBuf,
    },

    /// Lookup of an unknown profile id.
    #[error("profile '{0}' not found")]
    NotFound(String),

    /// Profiles directory does not exist.
    #[error("profiles directory {} does not exist", .0.display())]
    MissingDirectory(PathBuf),
}

/// Result alias for profile operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
