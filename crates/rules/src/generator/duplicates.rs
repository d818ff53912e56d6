//! Whole-set reductions run after every pair has resolved.

use indexmap::IndexMap;

use super::error::{ConflictKind, RuleConflict};
use super::report::Overlap;
use super::rule::GeneratedRule;

/// Every uid and every (title, folder) pair claimed by more than one rule,
/// plus every (folder, group) written by more than one profile.
///
/// Each profile gets its own provisioning file, and Grafana keys rule groups
/// by (org, folder, name), so two profiles sharing a folder would replace
/// each other's groups.
///
/// Conflicts are listed uid, then title, then group, each kind in order of
/// the first rule involved, so the error text is stable across runs.
pub(crate) fn find_conflicts(rules: &[GeneratedRule]) -> Vec<RuleConflict> {
    let mut by_uid: IndexMap<&str, Vec<usize>> = IndexMap::new();
    let mut by_title: IndexMap<(&str, &str), Vec<usize>> = IndexMap::new();
    // (folder, group) -> profile -> first rule of that profile in the group
    let mut by_group: IndexMap<(&str, &str), IndexMap<&str, usize>> = IndexMap::new();

    for (i, rule) in rules.iter().enumerate() {
        by_uid.entry(rule.uid.as_str()).or_default().push(i);
        by_title
            .entry((rule.title.as_str(), rule.folder.as_str()))
            .or_default()
            .push(i);
        by_group
            .entry((rule.folder.as_str(), rule.group.as_str()))
            .or_default()
            .entry(rule.profile.as_str())
            .or_insert(i);
    }

    let mut conflicts = Vec::new();
    for (uid, idx) in by_uid {
        if idx.len() > 1 {
            conflicts.push(RuleConflict {
                kind: ConflictKind::Uid,
                key: uid.to_string(),
                sources: idx.iter().map(|&i| rules[i].source()).collect(),
            });
        }
    }
    for ((title, folder), idx) in by_title {
        if idx.len() > 1 {
            conflicts.push(RuleConflict {
                kind: ConflictKind::TitleInFolder,
                key: format!("{title}' in folder '{folder}"),
                sources: idx.iter().map(|&i| rules[i].source()).collect(),
            });
        }
    }
    for ((folder, group), profiles) in by_group {
        if profiles.len() > 1 {
            conflicts.push(RuleConflict {
                kind: ConflictKind::GroupInFolder,
                key: format!("{group}' in folder '{folder}"),
                sources: profiles.values().map(|&i| rules[i].source()).collect(),
            });
        }
    }
    conflicts
}

/// Fragments whose rendered query is identical under several profiles.
pub(crate) fn find_overlaps(rules: &[GeneratedRule]) -> Vec<Overlap> {
    let mut by_query: IndexMap<(&str, &str), Vec<&str>> = IndexMap::new();
    for rule in rules {
        by_query
            .entry((rule.fragment.as_str(), rule.query.as_str()))
            .or_default()
            .push(rule.profile.as_str());
    }

    by_query
        .into_iter()
        .filter(|(_, profiles)| profiles.len() > 1)
        .map(|((fragment, query), profiles)| Overlap {
            fragment: fragment.to_string(),
            profiles: profiles.into_iter().map(str::to_string).collect(),
            query: query.to_string(),
        })
        .collect()
}
