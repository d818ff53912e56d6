//! Deterministic rule identity derived from (fragment id, profile id).

use sha2::{Digest, Sha256};

use crate::validation::MAX_UID_LEN;

/// Hex characters of the digest kept in a default uid.
const UID_HASH_LEN: usize = 16;

/// Default uid: `<profile>-<hash>`, where the hash covers both ids.
///
/// The profile prefix is truncated so the result never exceeds Grafana's
/// uid length limit.
pub(crate) fn default_uid(fragment_id: &str, profile_id: &str) -> String {
    let digest = Sha256::digest(format!("{fragment_id}\n{profile_id}").as_bytes());
    let hash = format!("{digest:x}");
    let max_prefix = MAX_UID_LEN - UID_HASH_LEN - 1;
    let prefix: String = profile_id.chars().take(max_prefix).collect();
    format!("{prefix}-{}", &hash[..UID_HASH_LEN])
}

/// Default title: the humanized fragment name, tagged with the profile.
///
/// `app-not-synced` under `prod` becomes `App not synced [prod]`. When the
/// same name exists in several categories, pass the category so the titles
/// stay distinct: `Disk full (platform/nodes) [prod]`.
pub(crate) fn default_title(
    fragment_name: &str,
    category: Option<&str>,
    profile_id: &str,
) -> String {
    let words = fragment_name
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let mut chars = words.chars();
    let human = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => fragment_name.to_string(),
    };
    match category {
        Some(category) => format!("{human} ({category}) [{profile_id}]"),
        None => format!("{human} [{profile_id}]"),
    }
}
