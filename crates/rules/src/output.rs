//! Provisioning output: one Grafana alerting document per enabled profile.
//!
//! Each document holds one rule group per fragment category, all filed under
//! the profile's folder and evaluated on the same fixed interval. Files are
//! written atomically (temp file + rename) so Grafana never reads a partial
//! document.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::generator::GeneratedRule;
use crate::profile::Profile;
use crate::schema::{ProvisioningFile, RuleGroup};

/// Provisioning format version Grafana expects.
pub const PROVISIONING_API_VERSION: u32 = 1;

const HEADER: &str = "# Generated by alertgen. Do not edit by hand.\n";

/// Errors that can occur while rendering or writing output documents.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error.
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A provisioning document ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub profile: String,
    pub file_name: String,
    pub contents: String,
}

/// Group rules into one [`ProvisioningFile`] per enabled profile.
///
/// Enabled profiles without any rules still get an (empty) document, so the
/// output directory always reflects the full profile set.
pub fn build_documents(
    profiles: &[Profile],
    rules: &[GeneratedRule],
    interval: &str,
    org_id: i64,
) -> Vec<(String, ProvisioningFile)> {
    profiles
        .iter()
        .filter(|p| p.enabled)
        .map(|profile| {
            let mut groups: IndexMap<&str, RuleGroup> = IndexMap::new();
            for rule in rules.iter().filter(|r| r.profile == profile.id) {
                groups
                    .entry(rule.group.as_str())
                    .or_insert_with(|| RuleGroup {
                        org_id,
                        name: rule.group.clone(),
                        folder: profile.folder.clone(),
                        interval: interval.to_string(),
                        rules: Vec::new(),
                    })
                    .rules
                    .push(rule.to_provisioned());
            }
            let file = ProvisioningFile {
                api_version: PROVISIONING_API_VERSION,
                groups: groups.into_values().collect(),
            };
            (profile.id.clone(), file)
        })
        .collect()
}

/// Serialize every document; output is byte-stable for identical input.
pub fn render_documents(
    profiles: &[Profile],
    rules: &[GeneratedRule],
    interval: &str,
    org_id: i64,
) -> Result<Vec<RenderedDocument>, OutputError> {
    build_documents(profiles, rules, interval, org_id)
        .into_iter()
        .map(|(profile, file)| {
            let yaml = serde_yaml::to_string(&file)?;
            Ok(RenderedDocument {
                file_name: format!("{profile}.yaml"),
                profile,
                contents: format!("{HEADER}{yaml}"),
            })
        })
        .collect()
}

/// Writes rendered documents into an output directory.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    out_dir: PathBuf,
}

impl OutputWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Atomically write every document, creating the directory if needed.
    ///
    /// All documents are staged as dotfile temps before any is renamed into
    /// place, so a failed write leaves every existing output untouched.
    /// Files for profiles that no longer exist are left in place.
    pub fn write_all(&self, documents: &[RenderedDocument]) -> Result<Vec<PathBuf>, OutputError> {
        fs::create_dir_all(&self.out_dir)?;

        let mut staged = Vec::with_capacity(documents.len());
        for doc in documents {
            let tmp_path = self.out_dir.join(format!(".{}.tmp", doc.file_name));
            if let Err(e) = fs::write(&tmp_path, &doc.contents) {
                discard(&staged);
                return Err(e.into());
            }
            staged.push((tmp_path, self.out_dir.join(&doc.file_name)));
        }

        let mut written = Vec::with_capacity(staged.len());
        for (i, ((tmp_path, final_path), doc)) in staged.iter().zip(documents).enumerate() {
            if let Err(e) = fs::rename(tmp_path, final_path) {
                discard(&staged[i..]);
                return Err(e.into());
            }
            info!(profile = %doc.profile, path = %final_path.display(), "wrote alert rules");
            written.push(final_path.clone());
        }
        Ok(written)
    }
}

/// Best-effort removal of staged temp files after a failed write.
fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (tmp_path, _) in staged {
        if let Err(e) = fs::remove_file(tmp_path) {
            warn!(path = %tmp_path.display(), error = %e, "failed to remove temp file");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;
    use crate::generator::{GeneratorOptions, RuleGenerator};
    use crate::template::{ParsedTemplate, TemplateFragment};

    fn fragment(category: &str, name: &str, text: &str) -> TemplateFragment {
        TemplateFragment {
            id: format!("{category}/{name}"),
            name: name.to_string(),
            category: category.to_string(),
            path: PathBuf::from(format!("{category}/{name}.yaml")),
            template: ParsedTemplate::parse(text).unwrap(),
        }
    }

    fn sample() -> (Vec<Profile>, Vec<GeneratedRule>) {
        let profiles = vec![
            Profile::new("prod")
                .with_folder("ArgoCD Prod")
                .with_value("project", "production"),
            Profile::new("staging").with_value("project", "staging"),
            Profile::new("dev").with_value("project", "dev").disabled(),
        ];
        let frags = vec![
            fragment(
                "backend/argo",
                "app-not-synced",
                "expr: argocd_app_info{project=\"{{project}}\"}\nannotations:\n  summary: \"{{ $labels.name }} not synced\"\n",
            ),
            fragment("backend/argo", "app-degraded", "expr: up{p=\"{{project}}\"}\n"),
            fragment("frontend", "cdn-down", "expr: cdn_up == 0\n"),
        ];
        let gen = RuleGenerator::new(GeneratorOptions { threads: 1, ..GeneratorOptions::default() })
            .generate(&profiles, &frags)
            .unwrap();
        (profiles, gen.rules)
    }

    #[test]
    fn one_document_per_enabled_profile_grouped_by_category() {
        let (profiles, rules) = sample();
        let docs = build_documents(&profiles, &rules, "1m", 1);

        let names: Vec<&str> = docs.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(names, vec!["prod", "staging"]);

        let prod = &docs[0].1;
        assert_eq!(prod.api_version, 1);
        let groups: Vec<(&str, usize)> = prod
            .groups
            .iter()
            .map(|g| (g.name.as_str(), g.rules.len()))
            .collect();
        assert_eq!(groups, vec![("backend/argo", 2), ("frontend", 1)]);
        assert!(prod.groups.iter().all(|g| g.folder == "ArgoCD Prod" && g.interval == "1m"));
    }

    #[test]
    fn rendered_yaml_uses_grafana_field_names_and_keeps_passthrough() {
        let (profiles, rules) = sample();
        let docs = render_documents(&profiles, &rules, "1m", 1).unwrap();
        let prod = &docs[0];

        assert_eq!(prod.file_name, "prod.yaml");
        assert!(prod.contents.starts_with(HEADER));
        for key in ["apiVersion: 1", "orgId: 1", "folder: ArgoCD Prod", "interval: 1m", "datasourceUid: prometheus", "noDataState: OK", "execErrState: Error", "isPaused: false", "refId: A"] {
            assert!(prod.contents.contains(key), "missing {key} in:\n{}", prod.contents);
        }
        assert!(prod.contents.contains("{{ $labels.name }} not synced"));

        // Round-trips through the schema type.
        let body = prod.contents.trim_start_matches(HEADER);
        let parsed: ProvisioningFile = serde_yaml::from_str(body).unwrap();
        assert_eq!(parsed.groups[0].rules[0].data[0].model.expr, "argocd_app_info{project=\"production\"}");
    }

    #[test]
    fn rendering_is_byte_identical_across_runs() {
        let (profiles, rules) = sample();
        let a = render_documents(&profiles, &rules, "1m", 1).unwrap();
        let (profiles2, rules2) = sample();
        let b = render_documents(&profiles2, &rules2, "1m", 1).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn enabled_profile_without_rules_gets_empty_document() {
        let profiles = vec![Profile::new("lonely")];
        let docs = build_documents(&profiles, &[], "1m", 1);
        assert_eq!(docs.len(), 1);
        assert!(docs[0].1.groups.is_empty());
    }

    #[test]
    fn write_all_creates_directory_and_files() {
        let (profiles, rules) = sample();
        let docs = render_documents(&profiles, &rules, "2m", 3).unwrap();
        let dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(dir.path().join("nested/out"));

        let written = writer.write_all(&docs).unwrap();
        assert_eq!(written.len(), 2);
        for (path, doc) in written.iter().zip(&docs) {
            assert_eq!(fs::read_to_string(path).unwrap(), doc.contents);
        }
        // No temp files left behind.
        let leftovers = fs::read_dir(writer.out_dir())
            .unwrap()
            .filter(|e| e.as_ref().unwrap().file_name().to_string_lossy().starts_with('.'))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn failed_write_leaves_existing_outputs_untouched() {
        let (profiles, rules) = sample();
        let mut docs = render_documents(&profiles, &rules, "1m", 1).unwrap();
        let dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(dir.path());
        fs::write(dir.path().join("prod.yaml"), "previous\n").unwrap();

        // The second document's temp file lands in a directory that does not exist.
        docs[1].file_name = "missing/staging.yaml".to_string();
        assert!(matches!(writer.write_all(&docs), Err(OutputError::Io(_))));

        assert_eq!(fs::read_to_string(dir.path().join("prod.yaml")).unwrap(), "previous\n");
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["prod.yaml".to_string()]);
    }
}
