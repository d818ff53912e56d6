//! [`GeneratedRule`]: one fragment materialized for one profile.

use indexmap::IndexMap;
use serde::Serialize;

use crate::schema::{
    ProvisionedRule, QueryData, QueryModel, RelativeTimeRange, DEFAULT_RELATIVE_FROM_SECS,
    QUERY_REF_ID,
};

/// Concrete alert rule produced by substituting a profile into a fragment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedRule {
    pub uid: String,
    pub title: String,
    /// Destination folder / routing key (from the profile).
    pub folder: String,
    /// Rule group name (the fragment category).
    pub group: String,
    pub profile: String,
    pub fragment: String,
    pub query: String,
    pub condition: String,
    pub datasource_uid: String,
    /// Pending period before firing (`for`).
    pub pending: String,
    pub no_data_state: String,
    pub exec_err_state: String,
    pub annotations: IndexMap<String, String>,
    pub labels: IndexMap<String, String>,
    pub paused: bool,
}

impl GeneratedRule {
    pub fn source(&self) -> RuleSource {
        RuleSource {
            fragment: self.fragment.clone(),
            profile: self.profile.clone(),
        }
    }

    /// Convert into Grafana's provisioning representation.
    pub fn to_provisioned(&self) -> ProvisionedRule {
        ProvisionedRule {
            uid: self.uid.clone(),
            title: self.title.clone(),
            condition: self.condition.clone(),
            data: vec![QueryData {
                ref_id: QUERY_REF_ID.to_string(),
                relative_time_range: RelativeTimeRange {
                    from: DEFAULT_RELATIVE_FROM_SECS,
                    to: 0,
                },
                datasource_uid: self.datasource_uid.clone(),
                model: QueryModel {
                    ref_id: QUERY_REF_ID.to_string(),
                    expr: self.query.clone(),
                    instant: true,
                },
            }],
            no_data_state: self.no_data_state.clone(),
            exec_err_state: self.exec_err_state.clone(),
            pending: self.pending.clone(),
            annotations: self.annotations.clone(),
            labels: self.labels.clone(),
            is_paused: self.paused,
        }
    }
}

/// The (fragment, profile) pair a rule came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RuleSource {
    pub fragment: String,
    pub profile: String,
}

impl std::fmt::Display for RuleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.fragment, self.profile)
    }
}
