//! Category glob matching over `/`-separated category paths.

/// A compiled category filter such as `backend/*` or `**/argo-*`.
///
/// `*` and `?` match within one path segment; a `**` segment matches zero or
/// more whole segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGlob {
    pattern: String,
    segments: Vec<String>,
}

impl CategoryGlob {
    pub fn new(pattern: &str) -> Result<Self, String> {
        let trimmed = pattern.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err("category glob must not be empty".to_string());
        }
        let segments: Vec<String> = trimmed.split('/').map(str::to_string).collect();
        for seg in &segments {
            if seg.is_empty() {
                return Err(format!("empty path segment in category glob '{pattern}'"));
            }
            if seg.contains("**") && seg != "**" {
                return Err(format!(
                    "'**' must be a whole path segment in category glob '{pattern}'"
                ));
            }
        }
        Ok(Self {
            pattern: trimmed.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, category: &str) -> bool {
        let parts: Vec<&str> = category.split('/').filter(|s| !s.is_empty()).collect();
        let pattern: Vec<&str> = self.segments.iter().map(String::as_str).collect();
        match_segments(&pattern, &parts)
    }
}

fn match_segments(pattern: &[&str], parts: &[&str]) -> bool {
    match pattern.split_first() {
        None => parts.is_empty(),
        Some((&"**", rest)) => (0..=parts.len()).any(|skip| match_segments(rest, &parts[skip..])),
        Some((seg, rest)) => match parts.split_first() {
            Some((part, tail)) => match_wildcard(seg, part) && match_segments(rest, tail),
            None => false,
        },
    }
}

/// Single-segment wildcard match supporting `*` and `?`.
fn match_wildcard(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((sp, st)) = star {
            // Backtrack: let the last star absorb one more character.
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '*')
}
