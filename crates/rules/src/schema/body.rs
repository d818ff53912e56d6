//! Substituted fragment body.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Query reference id of the single data query each rule carries.
pub const QUERY_REF_ID: &str = "A";

/// Accepted `no_data_state` values.
pub const NO_DATA_STATES: &[&str] = &["OK", "NoData", "Alerting"];

/// Accepted `exec_err_state` values.
pub const EXEC_ERR_STATES: &[&str] = &["OK", "Error", "Alerting"];

/// One alert rule as written in a fragment, after profile placeholders have
/// been substituted. Passthrough placeholders are still present in its text.
///
/// States are kept as strings so validation can suggest the closest valid
/// spelling instead of surfacing a serde "unknown variant" error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleBody {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub expr: String,
    #[serde(default, rename = "for")]
    pub pending: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub datasource: Option<String>,
    #[serde(default)]
    pub no_data_state: Option<String>,
    #[serde(default)]
    pub exec_err_state: Option<String>,
    #[serde(default)]
    pub annotations: IndexMap<String, String>,
    #[serde(default)]
    pub labels: IndexMap<String, String>,
    #[serde(default)]
    pub paused: bool,
}

impl RuleBody {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }
}
