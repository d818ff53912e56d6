//! Grafana alerting file-provisioning format (`apiVersion: 1`).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Relative query window, in seconds before evaluation time.
pub const DEFAULT_RELATIVE_FROM_SECS: u64 = 600;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningFile {
    pub api_version: u32,
    pub groups: Vec<RuleGroup>,
}

/// Rules evaluated together on a shared interval, filed under one folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleGroup {
    pub org_id: i64,
    pub name: String,
    pub folder: String,
    pub interval: String,
    pub rules: Vec<ProvisionedRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedRule {
    pub uid: String,
    pub title: String,
    pub condition: String,
    pub data: Vec<QueryData>,
    pub no_data_state: String,
    pub exec_err_state: String,
    #[serde(rename = "for")]
    pub pending: String,
    pub annotations: IndexMap<String, String>,
    pub labels: IndexMap<String, String>,
    pub is_paused: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryData {
    pub ref_id: String,
    pub relative_time_range: RelativeTimeRange,
    pub datasource_uid: String,
    pub model: QueryModel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativeTimeRange {
    pub from: u64,
    pub to: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryModel {
    pub ref_id: String,
    pub expr: String,
    pub instant: bool,
}
