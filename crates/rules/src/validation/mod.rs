//! Generated-rule validation with structured errors and suggestions.
//!
//! Checks every [`GeneratedRule`] against what Grafana's provisioning API
//! accepts: identity (uid/title), query, timing, states, labels and
//! annotations. Returns a [`ValidationResult`] with errors (the pair fails)
//! and warnings (advisory, carried into the report).

mod identity_checks;
mod query_checks;
mod state_checks;

pub mod fuzzy;


pub(crate) use identity_checks::MAX_UID_LEN;

use serde::{Deserialize, Serialize};

use crate::generator::GeneratedRule;

// ── Result types ────────────────────────────────────────────────────

/// Overall validation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

/// A blocking validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field path, e.g. `"annotations.summary"`.
    pub path: String,
    pub message: String,
    /// Optional "Did you mean …?" suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)?;
        } else {
            write!(f, "{}: {}", self.path, self.message)?;
        }
        if let Some(s) = &self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

/// A non-blocking advisory warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationResult {
    pub(crate) fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        });
    }

    pub(crate) fn error_with_suggestion(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: Option<&str>,
    ) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: suggestion.map(str::to_string),
        });
    }

    pub(crate) fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
        });
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Validate a generated rule against the provisioning schema.
pub fn validate_rule(rule: &GeneratedRule) -> ValidationResult {
    let mut result = ValidationResult::new();
    identity_checks::validate_identity(rule, &mut result);
    query_checks::validate_query(rule, &mut result);
    state_checks::validate_timing(rule, &mut result);
    state_checks::validate_states(rule, &mut result);
    identity_checks::validate_labels(rule, &mut result);
    identity_checks::validate_annotations(rule, &mut result);
    result
}
