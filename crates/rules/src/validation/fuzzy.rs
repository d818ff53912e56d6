//! Fuzzy string matching for "did you mean" suggestions.
//!
//! These are `pub(crate)` so the generator can reuse them when suggesting a
//! profile key for an unresolved placeholder.

/// Find the closest match using Levenshtein distance. Returns None if best
/// distance exceeds half the longer string (too dissimilar).
pub(crate) fn fuzzy_match<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    let input_lower = input.to_lowercase();
    let mut best: Option<(&str, usize)> = None;

    for &candidate in candidates {
        let dist = levenshtein(&input_lower, &candidate.to_lowercase());
        match best {
            None => best = Some((candidate, dist)),
            Some((_, best_dist)) if dist < best_dist => best = Some((candidate, dist)),
            _ => {}
        }
    }

    best.and_then(|(name, dist)| {
        let max_len = input.len().max(name.len());
        if dist <= max_len / 2 {
            Some(name)
        } else {
            None
        }
    })
}

/// Levenshtein edit distance between two strings.
pub(crate) fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let n = b.len();

    let mut prev = (0..=n).collect::<Vec<_>>();
    let mut curr = vec![0; n + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=n {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE_KEYS: &[&str] = &["project", "dest_namespace", "env", "datasource_uid"];

    #[test]
    fn levenshtein_basic() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", "abc"), 0);
    }

    #[test]
    fn fuzzy_match_finds_close() {
        assert_eq!(fuzzy_match("projcet", PROFILE_KEYS), Some("project"));
        assert_eq!(fuzzy_match("dest_namespaces", PROFILE_KEYS), Some("dest_namespace"));
        assert_eq!(fuzzy_match("nodata", &["OK", "NoData", "Alerting"]), Some("NoData"));
    }

    #[test]
    fn fuzzy_match_rejects_distant() {
        assert_eq!(fuzzy_match("zzzzzzzzzzzzz", PROFILE_KEYS), None);
        assert_eq!(fuzzy_match("anything", &[]), None);
    }
}
