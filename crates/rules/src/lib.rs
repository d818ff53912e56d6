//! Alert-rule generation engine.
//!
//! This crate provides:
//! - Environment profile loading and validation ([`profile::ProfileStore`])
//! - Rule template fragments with typed profile/passthrough placeholders
//!   ([`template::RuleTemplateSet`])
//! - Per-(profile × fragment) rule generation with a global duplicate check
//!   ([`generator::RuleGenerator`])
//! - Grafana alerting provisioning output and regenerate-on-change watching

pub mod generator;
pub mod load;
pub mod output;
pub mod pipeline;
pub mod profile;
pub mod schema;
pub mod template;
pub mod validation;
pub mod watch;
