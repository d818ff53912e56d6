//! Serde types for rule bodies and Grafana alerting provisioning files.
//!
//! - [`RuleBody`]: a fragment after profile substitution, as authored
//! - [`ProvisioningFile`]: the file-provisioning document Grafana reads

mod body;
mod provisioning;

pub use body::*;
pub use provisioning::*;
