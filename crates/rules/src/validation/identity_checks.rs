//! Identity, label and annotation checks.

use super::ValidationResult;
use crate::generator::GeneratedRule;

/// Grafana's limit on rule UIDs.
pub(crate) const MAX_UID_LEN: usize = 40;
/// Grafana's limit on rule titles.
const MAX_TITLE_LEN: usize = 190;

pub(super) fn validate_identity(rule: &GeneratedRule, result: &mut ValidationResult) {
    if rule.uid.is_empty() {
        result.error("uid", "uid must not be empty");
    } else {
        if rule.uid.len() > MAX_UID_LEN {
            result.error(
                "uid",
                format!(
                    "uid must be at most {MAX_UID_LEN} characters, got {} ('{}')",
                    rule.uid.len(),
                    rule.uid
                ),
            );
        }
        if let Some(bad) = rule
            .uid
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            result.error(
                "uid",
                format!("uid may only contain letters, digits, '-' and '_', found '{bad}' in '{}'", rule.uid),
            );
        }
    }

    let title = rule.title.trim();
    if title.is_empty() {
        result.error("title", "title must not be empty");
    } else if title.chars().count() > MAX_TITLE_LEN {
        result.error(
            "title",
            format!("title must be at most {MAX_TITLE_LEN} characters"),
        );
    }
    if rule.title.contains("{{") {
        result.warn(
            "title",
            "rule titles are not templated by Grafana; the placeholder will appear literally",
        );
    }

    if rule.folder.trim().is_empty() {
        result.error("folder", "folder must not be empty");
    }
}

pub(super) fn validate_labels(rule: &GeneratedRule, result: &mut ValidationResult) {
    for (name, value) in &rule.labels {
        let path = format!("labels.{name}");
        if !is_label_name(name) {
            result.error(
                path,
                format!("label name '{name}' must match [a-zA-Z_][a-zA-Z0-9_]*"),
            );
        } else if name.starts_with("__") {
            result.error(path, format!("label name '{name}' uses the reserved '__' prefix"));
        } else if value.is_empty() {
            result.warn(path, "empty label value; Prometheus-style matchers treat it as absent");
        }
    }
}

pub(super) fn validate_annotations(rule: &GeneratedRule, result: &mut ValidationResult) {
    for name in rule.annotations.keys() {
        if name.trim().is_empty() {
            result.error("annotations", "annotation names must not be empty");
        }
    }
    if !rule.annotations.contains_key("summary") {
        result.warn("annotations.summary", "no summary annotation; notifications will only show the title");
    }
}

fn is_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
