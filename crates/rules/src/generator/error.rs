//! Error types for rule generation.
//!
//! Per-pair failures ([`PairError`]) are recorded in the report and never
//! abort a run. Only [`GenerateError`] does.

use serde::Serialize;

use super::rule::RuleSource;
use crate::validation::ValidationError;

/// A profile placeholder had no matching key in the active profile.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("unresolved placeholder(s) {}", render_missing(.missing, .suggestions))]
pub struct UnresolvedPlaceholderError {
    /// Variable names, in first-use order.
    pub missing: Vec<String>,
    /// Closest existing profile key per missing name, when one is close enough.
    pub suggestions: Vec<Option<String>>,
}

/// The substituted fragment did not produce a valid rule.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("invalid rule: {}", join_errors(.errors))]
pub struct SchemaError {
    pub errors: Vec<ValidationError>,
}

/// Why one (profile, fragment) pair produced no rule.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PairError {
    #[error(transparent)]
    UnresolvedPlaceholder(#[from] UnresolvedPlaceholderError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// What two or more generated rules collided on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Same uid.
    Uid,
    /// Same title inside the same folder.
    TitleInFolder,
    /// Same rule group inside the same folder, from different profiles.
    GroupInFolder,
}

/// One collision: the shared key and every rule that claimed it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleConflict {
    pub kind: ConflictKind,
    pub key: String,
    pub sources: Vec<RuleSource>,
}

impl std::fmt::Display for RuleConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let what = match self.kind {
            ConflictKind::Uid => "uid",
            ConflictKind::TitleInFolder => "title",
            ConflictKind::GroupInFolder => "rule group",
        };
        let sources: Vec<String> = self.sources.iter().map(ToString::to_string).collect();
        write!(f, "{what} '{}' produced by {}", self.key, sources.join(", "))
    }
}

/// Two or more rules would overwrite each other in the destination system.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{} duplicate rule conflict(s): {}", .conflicts.len(), join_conflicts(.conflicts))]
pub struct DuplicateRuleError {
    pub conflicts: Vec<RuleConflict>,
}

/// Errors that abort a whole generation run.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    Duplicates(#[from] DuplicateRuleError),

    /// The worker pool could not be created.
    #[error("failed to build generation thread pool: {0}")]
    ThreadPool(String),
}

fn render_missing(missing: &[String], suggestions: &[Option<String>]) -> String {
    missing
        .iter()
        .enumerate()
        .map(|(i, name)| match suggestions.get(i).and_then(Option::as_deref) {
            Some(s) => format!("'{name}' (did you mean '{s}'?)"),
            None => format!("'{name}'"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn join_conflicts(conflicts: &[RuleConflict]) -> String {
    conflicts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
