//! Core [`RuleGenerator`]: substitutes profiles into fragments.

use alertgen_core::config::GenerationConfig;
use rayon::prelude::*;
use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::profile::Profile;
use crate::schema::{RuleBody, QUERY_REF_ID};
use crate::template::TemplateFragment;
use crate::validation::fuzzy::fuzzy_match;
use crate::validation::{validate_rule, ValidationError, ValidationWarning};

use super::duplicates::{find_conflicts, find_overlaps};
use super::error::{DuplicateRuleError, GenerateError, PairError, SchemaError, UnresolvedPlaceholderError};
use super::identity::{default_title, default_uid};
use super::report::{GenerationReport, PairOutcome, PairRecord};
use super::rule::GeneratedRule;
use super::structure::check_structure;

/// Defaults applied when a fragment leaves a field out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub default_datasource_uid: String,
    pub default_for: String,
    pub default_no_data_state: String,
    pub default_exec_err_state: String,
    /// Worker threads; 1 generates on the calling thread.
    pub threads: usize,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self::from(&GenerationConfig::default())
    }
}

impl From<&GenerationConfig> for GeneratorOptions {
    fn from(cfg: &GenerationConfig) -> Self {
        Self {
            default_datasource_uid: cfg.datasource_uid.clone(),
            default_for: cfg.default_for.clone(),
            default_no_data_state: "OK".to_string(),
            default_exec_err_state: "Error".to_string(),
            threads: cfg.threads.max(1),
        }
    }
}

/// Result of a successful run: the ordered rule set plus its report.
#[derive(Debug, Clone)]
pub struct Generation {
    /// Grouped by profile (load order), then fragment order.
    pub rules: Vec<GeneratedRule>,
    pub report: GenerationReport,
}

impl Generation {
    pub fn rules_for<'a>(&'a self, profile: &'a str) -> impl Iterator<Item = &'a GeneratedRule> + 'a {
        self.rules.iter().filter(move |r| r.profile == profile)
    }
}

/// Stateless transform from (profiles × fragments) to concrete rules.
#[derive(Debug, Clone, Default)]
pub struct RuleGenerator {
    options: GeneratorOptions,
}

impl RuleGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Generate one rule per enabled profile per fragment.
    ///
    /// Pair failures are recorded in the report and skipped. The run fails
    /// only if the finished set contains duplicate uids or duplicate
    /// (title, folder) pairs.
    pub fn generate(
        &self,
        profiles: &[Profile],
        fragments: &[TemplateFragment],
    ) -> Result<Generation, GenerateError> {
        let mut report = GenerationReport::new(profiles.len(), fragments.len());

        let shared = shared_names(fragments);
        let mut pairs: Vec<Pair<'_>> = Vec::new();
        for profile in profiles {
            if !profile.enabled {
                info!(profile = %profile.id, "profile disabled, skipping");
                report.record_skipped(&profile.id);
                continue;
            }
            pairs.extend(fragments.iter().map(|fragment| Pair {
                profile,
                fragment,
                qualify_title: shared.contains(fragment.name.as_str()),
            }));
        }

        let outcomes = self.run_pairs(&pairs)?;

        let mut rules = Vec::with_capacity(outcomes.len());
        for (Pair { profile, fragment, .. }, outcome) in pairs.iter().zip(outcomes) {
            let outcome = match outcome {
                Ok((rule, warnings)) => {
                    debug!(profile = %profile.id, fragment = %fragment.id, uid = %rule.uid, "generated rule");
                    let uid = rule.uid.clone();
                    rules.push(rule);
                    PairOutcome::Generated { uid, warnings }
                }
                Err(error) => {
                    warn!(profile = %profile.id, fragment = %fragment.id, error = %error, "rule generation failed");
                    PairOutcome::Failed { error }
                }
            };
            report.record_pair(PairRecord {
                profile: profile.id.clone(),
                fragment: fragment.id.clone(),
                outcome,
            });
        }

        // Global checks run once, over the finished set.
        let conflicts = find_conflicts(&rules);
        if !conflicts.is_empty() {
            for conflict in &conflicts {
                warn!(conflict = %conflict, "duplicate rule");
            }
            return Err(DuplicateRuleError { conflicts }.into());
        }

        let overlaps = find_overlaps(&rules);
        for overlap in &overlaps {
            warn!(
                fragment = %overlap.fragment,
                profiles = %overlap.profiles.join(","),
                "identical query under several profiles; matching applications alert once per profile"
            );
        }
        report.record_overlaps(overlaps);

        info!(
            generated = report.summary.generated,
            failed = report.summary.failed,
            skipped_profiles = report.summary.skipped_profiles,
            "generation complete"
        );
        Ok(Generation { rules, report })
    }

    /// Compute every pair, returning results in `pairs` order.
    ///
    /// Each worker writes only its own slot; rayon's indexed collect places
    /// results by position, not completion order.
    fn run_pairs(&self, pairs: &[Pair<'_>]) -> Result<Vec<PairResult>, GenerateError> {
        if self.options.threads <= 1 || pairs.len() <= 1 {
            return Ok(pairs.iter().map(|pair| self.generate_pair(pair)).collect());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.threads)
            .thread_name(|i| format!("alertgen-{i}"))
            .build()
            .map_err(|e| GenerateError::ThreadPool(e.to_string()))?;

        Ok(pool.install(|| {
            pairs
                .par_iter()
                .map(|pair| self.generate_pair(pair))
                .collect()
        }))
    }

    /// Materialize one fragment under one profile.
    fn generate_pair(&self, pair: &Pair<'_>) -> PairResult {
        let Pair { profile, fragment, qualify_title } = *pair;
        let rendered = fragment
            .template
            .render(|name| profile.resolve(name))
            .map_err(|missing| unresolved(profile, missing))?;
        check_structure(profile, fragment, &rendered)
            .map_err(|e| SchemaError { errors: vec![e] })?;

        let body = RuleBody::from_yaml(&rendered).map_err(|e| {
            SchemaError {
                errors: vec![ValidationError {
                    path: String::new(),
                    message: format!("substituted fragment is not a valid rule body: {e}"),
                    suggestion: None,
                }],
            }
        })?;

        let rule = self.build_rule(profile, fragment, qualify_title, body);
        let validation = validate_rule(&rule);
        if !validation.valid {
            return Err(SchemaError {
                errors: validation.errors,
            }
            .into());
        }
        Ok((rule, validation.warnings))
    }

    fn build_rule(
        &self,
        profile: &Profile,
        fragment: &TemplateFragment,
        qualify_title: bool,
        body: RuleBody,
    ) -> GeneratedRule {
        let uid = body
            .uid
            .unwrap_or_else(|| default_uid(&fragment.id, &profile.id));
        let category = qualify_title.then_some(fragment.category.as_str());
        let title = body
            .title
            .unwrap_or_else(|| default_title(&fragment.name, category, &profile.id));

        // Profile labels first; fragment labels override on conflict.
        let mut labels = profile.labels.clone();
        for (k, v) in body.labels {
            labels.insert(k, v);
        }

        GeneratedRule {
            uid,
            title,
            folder: profile.folder.clone(),
            group: fragment.category.clone(),
            profile: profile.id.clone(),
            fragment: fragment.id.clone(),
            query: body.expr,
            condition: body.condition.unwrap_or_else(|| QUERY_REF_ID.to_string()),
            datasource_uid: body
                .datasource
                .unwrap_or_else(|| self.options.default_datasource_uid.clone()),
            pending: body
                .pending
                .unwrap_or_else(|| self.options.default_for.clone()),
            no_data_state: body
                .no_data_state
                .unwrap_or_else(|| self.options.default_no_data_state.clone()),
            exec_err_state: body
                .exec_err_state
                .unwrap_or_else(|| self.options.default_exec_err_state.clone()),
            annotations: body.annotations,
            labels,
            paused: body.paused,
        }
    }
}

/// One unit of work: a fragment under an enabled profile.
#[derive(Clone, Copy)]
struct Pair<'a> {
    profile: &'a Profile,
    fragment: &'a TemplateFragment,
    /// The fragment name is used in more than one category, so a default
    /// title also names the category.
    qualify_title: bool,
}

/// A generated rule with its advisory warnings, or why the pair failed.
pub type PairResult = Result<(GeneratedRule, Vec<ValidationWarning>), PairError>;

fn unresolved(profile: &Profile, missing: Vec<String>) -> PairError {
    let keys: Vec<&str> = profile.keys().collect();
    let suggestions = missing
        .iter()
        .map(|name| fuzzy_match(name, &keys).map(str::to_string))
        .collect();
    UnresolvedPlaceholderError {
        missing,
        suggestions,
    }
    .into()
}

/// Fragment names used by more than one fragment.
fn shared_names(fragments: &[TemplateFragment]) -> HashSet<&str> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for fragment in fragments {
        *counts.entry(fragment.name.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|&(_, n)| n > 1)
        .map(|(name, _)| name)
        .collect()
}
