//! Tests for the rule generator.

use std::path::PathBuf;

use super::*;
use crate::profile::Profile;
use crate::template::{ParsedTemplate, TemplateFragment};

const APP_NOT_SYNCED: &str = r#"
title: "ArgoCD app not synced [{{env}}]"
expr: 'argocd_app_info{project="{{project}}", dest_namespace="{{dest_namespace}}", sync_status!="Synced"}'
for: 10m
annotations:
  summary: "{{ $labels.name }} is not synced"
  description: "Last commit by {{ $labels.author_email }}"
labels:
  severity: warning
"#;

const APP_DEGRADED: &str = r#"
expr: 'argocd_app_info{project="{{project}}", health_status="Degraded"}'
annotations:
  summary: "{{ $labels.name }} is degraded"
"#;

fn fragment(category: &str, name: &str, text: &str) -> TemplateFragment {
    TemplateFragment {
        id: format!("{category}/{name}"),
        name: name.to_string(),
        category: category.to_string(),
        path: PathBuf::from(format!("{category}/{name}.yaml")),
        template: ParsedTemplate::parse(text).expect("fragment parses"),
    }
}

fn prod() -> Profile {
    Profile::new("prod")
        .with_value("project", "production")
        .with_value("dest_namespace", "prod")
        .with_value("env", "prod")
        .with_label("env", "prod")
}

fn staging() -> Profile {
    Profile::new("staging")
        .with_value("project", "staging")
        .with_value("dest_namespace", "staging")
        .with_value("env", "staging")
}

fn sequential() -> RuleGenerator {
    RuleGenerator::new(GeneratorOptions {
        threads: 1,
        ..GeneratorOptions::default()
    })
}

fn parallel() -> RuleGenerator {
    RuleGenerator::new(GeneratorOptions {
        threads: 4,
        ..GeneratorOptions::default()
    })
}

#[test]
fn substitutes_profile_values_and_keeps_passthrough() {
    let frags = vec![fragment("backend/argo-applications", "app-not-synced", APP_NOT_SYNCED)];
    let gen = sequential().generate(&[prod()], &frags).unwrap();

    assert_eq!(gen.rules.len(), 1);
    let rule = &gen.rules[0];
    assert!(rule.query.contains(r#"project="production""#));
    assert!(rule.query.contains(r#"dest_namespace="prod""#));
    assert_eq!(rule.annotations["summary"], "{{ $labels.name }} is not synced");
    assert_eq!(
        rule.annotations["description"],
        "Last commit by {{ $labels.author_email }}"
    );
    assert_eq!(rule.title, "ArgoCD app not synced [prod]");
    assert_eq!(rule.folder, "prod");
    assert_eq!(rule.group, "backend/argo-applications");
    assert_eq!(rule.pending, "10m");
}

#[test]
fn defaults_fill_missing_fields() {
    let frags = vec![fragment("argo", "app-degraded", APP_DEGRADED)];
    let gen = sequential().generate(&[prod()], &frags).unwrap();
    let rule = &gen.rules[0];

    assert_eq!(rule.title, "App degraded [prod]");
    assert!(rule.uid.starts_with("prod-"));
    assert_eq!(rule.condition, "A");
    assert_eq!(rule.datasource_uid, "prometheus");
    assert_eq!(rule.pending, "5m");
    assert_eq!(rule.no_data_state, "OK");
    assert_eq!(rule.exec_err_state, "Error");
}

#[test]
fn generation_is_idempotent() {
    let frags = vec![
        fragment("argo", "app-not-synced", APP_NOT_SYNCED),
        fragment("argo", "app-degraded", APP_DEGRADED),
    ];
    let profiles = [prod(), staging()];
    let first = sequential().generate(&profiles, &frags).unwrap();
    let second = parallel().generate(&profiles, &frags).unwrap();
    assert_eq!(first.rules, second.rules);
    assert_eq!(first.report.pairs, second.report.pairs);
}

#[test]
fn output_order_is_profile_then_fragment() {
    let frags = vec![
        fragment("argo", "a", APP_DEGRADED),
        fragment("argo", "b", APP_NOT_SYNCED),
    ];
    let gen = parallel().generate(&[prod(), staging()], &frags).unwrap();
    let order: Vec<String> = gen
        .rules
        .iter()
        .map(|r| format!("{}/{}", r.profile, r.fragment))
        .collect();
    assert_eq!(
        order,
        vec!["prod/argo/a", "prod/argo/b", "staging/argo/a", "staging/argo/b"]
    );
}

#[test]
fn parallel_order_matches_sequential_for_many_pairs() {
    let frags: Vec<_> = (0..40)
        .map(|i| fragment("bulk", &format!("rule-{i:02}"), APP_DEGRADED))
        .collect();
    let profiles = [prod(), staging()];
    let seq = sequential().generate(&profiles, &frags).unwrap();
    let par = parallel().generate(&profiles, &frags).unwrap();
    let ids = |g: &Generation| g.rules.iter().map(|r| r.uid.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&seq), ids(&par));
}

#[test]
fn disabled_profiles_are_skipped_not_errors() {
    let frags = vec![fragment("argo", "app-degraded", APP_DEGRADED)];
    let gen = sequential()
        .generate(&[prod(), staging().disabled()], &frags)
        .unwrap();

    assert_eq!(gen.rules.len(), 1);
    assert!(gen.rules.iter().all(|r| r.profile == "prod"));
    assert_eq!(gen.report.skipped_profiles, vec!["staging".to_string()]);
    assert_eq!(gen.report.summary.skipped_profiles, 1);
    assert_eq!(gen.report.summary.failed, 0);
    assert!(gen.report.pair("staging", "argo/app-degraded").is_none());
}

#[test]
fn missing_placeholder_fails_only_that_pair() {
    let frags = vec![
        fragment("argo", "app-degraded", APP_DEGRADED),
        fragment("argo", "app-not-synced", APP_NOT_SYNCED),
    ];
    // `qa` lacks dest_namespace, which only app-not-synced needs.
    let qa = Profile::new("qa")
        .with_value("project", "qa")
        .with_value("env", "qa")
        .with_value("dest_namespaces", "qa");

    let gen = sequential().generate(&[prod(), qa], &frags).unwrap();
    assert_eq!(gen.rules.len(), 3);
    assert_eq!(gen.report.summary.generated, 3);
    assert_eq!(gen.report.summary.failed, 1);

    let failures: Vec<_> = gen.report.failures().collect();
    assert_eq!(failures.len(), 1);
    let (record, error) = failures[0];
    assert_eq!(record.profile, "qa");
    assert_eq!(record.fragment, "argo/app-not-synced");
    match error {
        PairError::UnresolvedPlaceholder(e) => {
            assert_eq!(e.missing, vec!["dest_namespace".to_string()]);
            assert_eq!(e.suggestions, vec![Some("dest_namespaces".to_string())]);
            assert!(error.to_string().contains("did you mean 'dest_namespaces'"));
        }
        other => panic!("expected unresolved placeholder, got {other:?}"),
    }
}

#[test]
fn colliding_uids_abort_and_name_both_sources() {
    let text = "uid: argo-static\nexpr: up{project=\"{{project}}\"}\n";
    let frags = vec![fragment("argo", "static", text)];

    let err = sequential()
        .generate(&[prod(), staging()], &frags)
        .unwrap_err();
    let GenerateError::Duplicates(dup) = err else {
        panic!("expected duplicate error");
    };
    assert_eq!(dup.conflicts.len(), 1);
    let conflict = &dup.conflicts[0];
    assert_eq!(conflict.kind, ConflictKind::Uid);
    assert_eq!(conflict.key, "argo-static");
    assert_eq!(
        conflict.sources,
        vec![
            RuleSource { fragment: "argo/static".into(), profile: "prod".into() },
            RuleSource { fragment: "argo/static".into(), profile: "staging".into() },
        ]
    );
    let msg = dup.to_string();
    assert!(msg.contains("argo/static@prod") && msg.contains("argo/static@staging"));
}

#[test]
fn colliding_uids_across_fragments_abort() {
    let a = fragment("argo", "a", "uid: shared-{{env}}\nexpr: up\n");
    let b = fragment("other", "b", "uid: shared-{{env}}\nexpr: down\n");
    let err = sequential().generate(&[prod()], &[a, b]).unwrap_err();
    assert!(matches!(err, GenerateError::Duplicates(ref d) if d.conflicts.len() == 1));
}

#[test]
fn same_title_in_same_folder_aborts() {
    let text = "title: App broken\nexpr: up{project=\"{{project}}\"}\n";
    let frags = vec![fragment("argo", "broken", text)];
    let p1 = prod().with_folder("Shared");
    let p2 = staging().with_folder("Shared");

    let err = sequential().generate(&[p1, p2], &frags).unwrap_err();
    let GenerateError::Duplicates(dup) = err else {
        panic!("expected duplicate error");
    };
    assert_eq!(dup.conflicts[0].kind, ConflictKind::TitleInFolder);
    assert!(dup.to_string().contains("'App broken' in folder 'Shared'"));
}

#[test]
fn same_title_in_different_folders_is_fine() {
    let text = "title: App broken\nexpr: up{project=\"{{project}}\"}\n";
    let frags = vec![fragment("argo", "broken", text)];
    let gen = sequential().generate(&[prod(), staging()], &frags).unwrap();
    assert_eq!(gen.rules.len(), 2);
}

#[test]
fn profiles_sharing_a_folder_cannot_share_a_group() {
    // Default titles differ per profile, so only the group collides.
    let frags = vec![fragment("backend/argo", "app-degraded", APP_DEGRADED)];
    let p1 = prod().with_folder("Shared");
    let p2 = staging().with_folder("Shared");

    let err = sequential().generate(&[p1, p2], &frags).unwrap_err();
    let GenerateError::Duplicates(dup) = err else {
        panic!("expected duplicate error");
    };
    assert_eq!(dup.conflicts.len(), 1);
    let conflict = &dup.conflicts[0];
    assert_eq!(conflict.kind, ConflictKind::GroupInFolder);
    assert_eq!(conflict.key, "backend/argo' in folder 'Shared");
    let profiles: Vec<&str> = conflict.sources.iter().map(|s| s.profile.as_str()).collect();
    assert_eq!(profiles, vec!["prod", "staging"]);
    assert!(dup
        .to_string()
        .contains("rule group 'backend/argo' in folder 'Shared'"));
}

#[test]
fn one_profile_may_fill_a_group_with_many_rules() {
    let frags = vec![
        fragment("argo", "app-degraded", APP_DEGRADED),
        fragment("argo", "app-not-synced", APP_NOT_SYNCED),
    ];
    let gen = sequential()
        .generate(&[prod().with_folder("Shared")], &frags)
        .unwrap();
    assert_eq!(gen.rules.len(), 2);
}

#[test]
fn same_fragment_name_in_two_categories_gets_distinct_titles() {
    let text = "expr: 'node_filesystem_avail_bytes == 0'\nannotations:\n  summary: disk full\n";
    let frags = vec![
        fragment("backend/argo", "disk-full", text),
        fragment("platform/nodes", "disk-full", text),
        fragment("platform/nodes", "node-down", "expr: up == 0\n"),
    ];
    let gen = sequential().generate(&[prod()], &frags).unwrap();

    let titles: Vec<&str> = gen.rules.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Disk full (backend/argo) [prod]",
            "Disk full (platform/nodes) [prod]",
            "Node down [prod]",
        ]
    );
}

#[test]
fn value_adding_keys_to_the_fragment_is_rejected() {
    let text = "expr: up\ntitle: App {{env}}\n";
    let frags = vec![fragment("argo", "x", text)];
    let hostile = Profile::new("hostile").with_value("env", "prod\nuid: hijacked\nno_data_state: Alerting");
    let gen = sequential().generate(&[hostile, prod()], &frags).unwrap();

    assert_eq!(gen.rules.len(), 1);
    assert!(gen.rules.iter().all(|r| r.uid != "hijacked"));
    let (record, error) = gen.report.failures().next().unwrap();
    assert_eq!(record.profile, "hostile");
    let PairError::Schema(schema) = error else {
        panic!("expected schema error");
    };
    assert_eq!(schema.errors[0].path, "values.env");
    assert!(schema.errors[0].message.contains("YAML structure"));
}

#[test]
fn value_adding_keys_to_a_flow_mapping_is_rejected() {
    let text = "{expr: up, title: {{t}}}\n";
    let frags = vec![fragment("argo", "x", text)];
    let hostile = Profile::new("hostile").with_value("t", "x, uid: hijacked");
    let gen = sequential().generate(&[hostile], &frags).unwrap();

    assert!(gen.rules.is_empty());
    let (_, error) = gen.report.failures().next().unwrap();
    let PairError::Schema(schema) = error else {
        panic!("expected schema error");
    };
    assert_eq!(schema.errors[0].path, "values.t");
}

#[test]
fn scalar_values_of_any_type_keep_the_structure() {
    let text = "expr: up > {{threshold}}\ntitle: \"{{env}}: {{paging}}\"\npaused: {{paused}}\n";
    let frags = vec![fragment("argo", "x", text)];
    let p = prod()
        .with_value("threshold", 0.5)
        .with_value("paging", true)
        .with_value("paused", false);
    let gen = sequential().generate(&[p], &frags).unwrap();

    assert_eq!(gen.report.summary.failed, 0);
    assert_eq!(gen.rules[0].query, "up > 0.5");
    assert_eq!(gen.rules[0].title, "prod: true");
}

#[test]
fn invalid_state_is_schema_error_with_suggestion() {
    let text = "expr: up\nno_data_state: nodata\n";
    let frags = vec![fragment("argo", "x", text)];
    let gen = sequential().generate(&[prod()], &frags).unwrap();

    assert!(gen.rules.is_empty());
    let (_, error) = gen.report.failures().next().unwrap();
    let PairError::Schema(schema) = error else {
        panic!("expected schema error");
    };
    assert_eq!(schema.errors[0].path, "no_data_state");
    assert_eq!(schema.errors[0].suggestion.as_deref(), Some("NoData"));
}

#[test]
fn value_that_breaks_yaml_is_schema_error() {
    let text = "expr: up\ntitle: {{env}}\n";
    let weird = Profile::new("weird").with_value("env", "[unclosed");
    let frags = vec![fragment("argo", "x", text)];
    let gen = sequential().generate(&[weird, prod()], &frags).unwrap();

    assert_eq!(gen.rules.len(), 1);
    let (record, error) = gen.report.failures().next().unwrap();
    assert_eq!(record.profile, "weird");
    assert!(matches!(error, PairError::Schema(_)));
}

#[test]
fn fragment_labels_override_profile_labels() {
    let text = "expr: up\nlabels:\n  env: override\n  severity: critical\n";
    let frags = vec![fragment("argo", "x", text)];
    let gen = sequential().generate(&[prod().with_label("team", "platform")], &frags).unwrap();
    let labels: Vec<(&str, &str)> = gen.rules[0]
        .labels
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    assert_eq!(
        labels,
        vec![("env", "override"), ("team", "platform"), ("severity", "critical")]
    );
}

#[test]
fn identical_queries_across_profiles_are_reported_as_overlap() {
    let frags = vec![fragment("argo", "app-degraded", APP_DEGRADED)];
    // Both profiles target the same Argo project, e.g. via a shared namespace.
    let exodia = Profile::new("exodia").with_value("project", "production");
    let gen = sequential().generate(&[prod(), exodia], &frags).unwrap();

    assert_eq!(gen.rules.len(), 2);
    assert_eq!(gen.report.overlaps.len(), 1);
    assert_eq!(gen.report.overlaps[0].profiles, vec!["prod".to_string(), "exodia".to_string()]);
    assert_eq!(gen.report.summary.overlaps, 1);
}

#[test]
fn report_serializes_to_json() {
    let frags = vec![
        fragment("argo", "app-degraded", APP_DEGRADED),
        fragment("argo", "needs-missing", "expr: up{x=\"{{missing}}\"}\n"),
    ];
    let gen = sequential().generate(&[prod()], &frags).unwrap();
    let json: serde_json::Value = serde_json::from_str(&gen.report.to_json().unwrap()).unwrap();

    assert_eq!(json["summary"]["generated"], 1);
    assert_eq!(json["pairs"][0]["status"], "generated");
    assert_eq!(json["pairs"][1]["status"], "failed");
    assert_eq!(json["pairs"][1]["error"]["kind"], "unresolved_placeholder");
    assert_eq!(json["pairs"][1]["error"]["missing"][0], "missing");
}
