//! Pending-period and state enum checks.

use alertgen_core::parse_duration;

use super::fuzzy::fuzzy_match;
use super::ValidationResult;
use crate::generator::GeneratedRule;
use crate::schema::{EXEC_ERR_STATES, NO_DATA_STATES};

pub(super) fn validate_timing(rule: &GeneratedRule, result: &mut ValidationResult) {
    if let Err(e) = parse_duration(&rule.pending) {
        result.error("for", format!("{e}; expected e.g. '5m' or '1h30m'"));
    }
}

pub(super) fn validate_states(rule: &GeneratedRule, result: &mut ValidationResult) {
    check_enum("no_data_state", &rule.no_data_state, NO_DATA_STATES, result);
    check_enum("exec_err_state", &rule.exec_err_state, EXEC_ERR_STATES, result);
}

fn check_enum(path: &str, value: &str, allowed: &[&str], result: &mut ValidationResult) {
    if !allowed.contains(&value) {
        result.error_with_suggestion(
            path,
            format!("'{value}' is not one of {}", allowed.join(", ")),
            fuzzy_match(value, allowed),
        );
    }
}
