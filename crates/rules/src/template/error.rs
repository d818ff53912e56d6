//! Error types for template fragment loading.

use std::path::PathBuf;

/// Errors that can occur while loading rule template fragments.
///
/// Everything except [`TemplateError::MissingDirectory`] and
/// [`TemplateError::InvalidGlob`] is scoped to one fragment: the loader
/// records it and moves on.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk error.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Unbalanced or empty placeholder syntax.
    #[error("{}: malformed placeholder at {detail}", .path.display())]
    Syntax {
        path: PathBuf,
        detail: super::SyntaxError,
    },

    /// Fragment sits directly in the templates root, so it has no category.
    #[error("{}: fragment has an empty category path (place it in a subdirectory)", .0.display())]
    EmptyCategory(PathBuf),

    /// Two files resolve to the same fragment id (e.g. `a.yml` and `a.yaml`).
    #[error("{}: duplicate fragment id '{id}' (first defined in {})", .path.display(), .first.display())]
    Duplicate {
        id: String,
        path: PathBuf,
        first: PathBuf,
    },

    /// File name is not valid UTF-8 or has no stem.
    #[error("{}: cannot derive a fragment name from this path", .0.display())]
    BadName(PathBuf),

    /// The category glob could not be compiled.
    #[error("invalid category glob '{pattern}': {reason}")]
    InvalidGlob { pattern: String, reason: String },

    /// Templates root does not exist.
    #[error("templates directory {} does not exist", .0.display())]
    MissingDirectory(PathBuf),
}

/// Result alias for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;
