//! [`GenerationReport`]: per-pair outcomes and run-level diagnostics.

use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;

use super::error::PairError;
use crate::load::{LoadResult, LoadStatus};
use crate::validation::ValidationWarning;

/// Outcome of one (profile, fragment) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairRecord {
    pub profile: String,
    pub fragment: String,
    #[serde(flatten)]
    pub outcome: PairOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PairOutcome {
    Generated {
        uid: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<ValidationWarning>,
    },
    Failed {
        error: PairError,
    },
}

/// Two or more enabled profiles rendered the same query for one fragment,
/// so any matching application would be alerted once per profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlap {
    pub fragment: String,
    pub profiles: Vec<String>,
    pub query: String,
}

/// An input file that could not be loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub profiles: usize,
    pub fragments: usize,
    pub generated: usize,
    pub failed: usize,
    pub skipped_profiles: usize,
    pub load_failures: usize,
    pub overlaps: usize,
}

/// Everything one generation run has to say besides the rules themselves.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    /// RFC 3339 timestamp of the run.
    pub generated_at: String,
    pub summary: ReportSummary,
    /// Pairs in output order: profile load order, then fragment order.
    pub pairs: Vec<PairRecord>,
    /// Disabled profiles, in load order.
    pub skipped_profiles: Vec<String>,
    pub load_failures: Vec<LoadFailure>,
    pub overlaps: Vec<Overlap>,
    /// Effective configuration, when the run came from a config.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

impl GenerationReport {
    pub(crate) fn new(profiles: usize, fragments: usize) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            summary: ReportSummary {
                profiles,
                fragments,
                ..ReportSummary::default()
            },
            pairs: Vec::new(),
            skipped_profiles: Vec::new(),
            load_failures: Vec::new(),
            overlaps: Vec::new(),
            config: None,
        }
    }

    pub(crate) fn record_skipped(&mut self, profile: &str) {
        self.summary.skipped_profiles += 1;
        self.skipped_profiles.push(profile.to_string());
    }

    pub(crate) fn record_pair(&mut self, record: PairRecord) {
        match record.outcome {
            PairOutcome::Generated { .. } => self.summary.generated += 1,
            PairOutcome::Failed { .. } => self.summary.failed += 1,
        }
        self.pairs.push(record);
    }

    pub(crate) fn record_overlaps(&mut self, overlaps: Vec<Overlap>) {
        self.summary.overlaps = overlaps.len();
        self.overlaps = overlaps;
    }

    /// Carry failed files from the load phase into the report.
    pub fn add_load_results<'a>(&mut self, results: impl IntoIterator<Item = &'a LoadResult>) {
        for result in results {
            if let LoadStatus::Failed { error } = &result.status {
                self.load_failures.push(LoadFailure {
                    path: result.path.clone(),
                    error: error.clone(),
                });
            }
        }
        self.summary.load_failures = self.load_failures.len();
    }

    /// Pairs that produced no rule.
    pub fn failures(&self) -> impl Iterator<Item = (&PairRecord, &PairError)> {
        self.pairs.iter().filter_map(|p| match &p.outcome {
            PairOutcome::Failed { error } => Some((p, error)),
            PairOutcome::Generated { .. } => None,
        })
    }

    pub fn pair(&self, profile: &str, fragment: &str) -> Option<&PairRecord> {
        self.pairs
            .iter()
            .find(|p| p.profile == profile && p.fragment == fragment)
    }

    /// Whether anything failed, at load time or per pair.
    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0 || !self.load_failures.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
