//! Placeholder parser: splits fragment text into literal, profile, and
//! passthrough segments.
//!
//! Fragments share `{{ ... }}` syntax with Grafana's own Go templates, so the
//! two kinds are told apart here, once, instead of at substitution time:
//!
//! - `{{ name }}` with a bare identifier that is not a Go template keyword or
//!   builtin is a profile placeholder.
//! - Anything else in braces (`{{ $labels.name }}`, `{{ .Value }}`,
//!   `{{ humanize $value }}`, `{{ end }}`) is passthrough.
//! - `{{/* raw */}} ... {{/* endraw */}}` wraps a block emitted verbatim.
//!
//! Go's whitespace-trim markers (`{{- ` and ` -}}`) are applied here when the
//! placeholder is consumed at generation time (profile placeholders and raw
//! markers): the adjacent literal whitespace is removed. Passthrough
//! placeholders keep their markers and are trimmed by Grafana.

use indexmap::IndexSet;
use serde::Serialize;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const RAW_START: &str = "/* raw */";
const RAW_END: &str = "/* endraw */";

/// Identifiers that Go's text/template treats as keywords or builtin
/// functions. These are always passthrough, never profile lookups.
const GO_TEMPLATE_WORDS: &[&str] = &[
    "and", "block", "break", "call", "continue", "define", "else", "end", "eq", "false", "ge",
    "gt", "html", "if", "index", "js", "le", "len", "lt", "ne", "nil", "not", "or", "print",
    "printf", "println", "range", "slice", "template", "true", "urlquery", "with",
];

/// One piece of a parsed fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Segment {
    /// Plain text copied as-is.
    Literal(String),
    /// Resolved from the active profile at generation time.
    Profile(String),
    /// Left verbatim for the alerting system to resolve at evaluation time.
    Passthrough(String),
}

/// Location and description of a malformed placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}: {}", self.line, self.column, self.message)
    }
}

/// A fragment's text after placeholder classification.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedTemplate {
    segments: Vec<Segment>,
}

impl ParsedTemplate {
    /// Parse `text`, rejecting unbalanced or empty placeholders.
    pub fn parse(text: &str) -> Result<Self, SyntaxError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut pos = 0;

        while pos < text.len() {
            let rest = &text[pos..];
            let next_open = rest.find(OPEN);
            let next_close = rest.find(CLOSE);

            let open = match (next_open, next_close) {
                (None, None) => {
                    literal.push_str(rest);
                    break;
                }
                (None, Some(close)) => {
                    return Err(error_at(text, pos + close, "'}}' without a matching '{{'"));
                }
                (Some(open), Some(close)) if close < open => {
                    return Err(error_at(text, pos + close, "'}}' without a matching '{{'"));
                }
                (Some(open), _) => open,
            };

            literal.push_str(&rest[..open]);
            let open_abs = pos + open;
            let body_start = open_abs + OPEN.len();
            let (body, after) = placeholder_body(text, open_abs, body_start)?;

            let (trim_left, word, trim_right) = split_trim_markers(body);
            if word.is_empty() {
                return Err(error_at(text, open_abs, "empty placeholder"));
            }

            if word == RAW_START {
                let (raw, after_raw, trim_after_raw) = raw_block(text, open_abs, after)?;
                if trim_left {
                    trim_trailing_space(&mut literal);
                }
                flush(&mut literal, &mut segments);
                if !raw.is_empty() {
                    segments.push(Segment::Passthrough(raw.to_string()));
                }
                pos = if trim_after_raw {
                    skip_space(text, after_raw)
                } else {
                    after_raw
                };
                continue;
            }
            if word == RAW_END {
                return Err(error_at(text, open_abs, "endraw without a matching raw"));
            }

            if is_profile_variable(word) {
                if trim_left {
                    trim_trailing_space(&mut literal);
                }
                flush(&mut literal, &mut segments);
                segments.push(Segment::Profile(word.to_string()));
                pos = if trim_right { skip_space(text, after) } else { after };
            } else {
                flush(&mut literal, &mut segments);
                segments.push(Segment::Passthrough(text[open_abs..after].to_string()));
                pos = after;
            }
        }

        flush(&mut literal, &mut segments);
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Profile variables referenced, in first-use order, without repeats.
    pub fn variables(&self) -> IndexSet<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Profile(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether any passthrough placeholder or raw block is present.
    pub fn has_passthrough(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Passthrough(_)))
    }

    /// Substitute profile placeholders via `lookup`.
    ///
    /// Returns every variable `lookup` could not resolve (first-use order,
    /// no repeats) instead of stopping at the first one.
    pub fn render<F>(&self, lookup: F) -> Result<String, Vec<String>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut out = String::new();
        let mut missing: IndexSet<String> = IndexSet::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) | Segment::Passthrough(text) => out.push_str(text),
                Segment::Profile(name) => match lookup(name) {
                    Some(value) => out.push_str(&value),
                    None => {
                        missing.insert(name.clone());
                    }
                },
            }
        }

        if missing.is_empty() {
            Ok(out)
        } else {
            Err(missing.into_iter().collect())
        }
    }
}

/// Find the `}}` closing the placeholder opened at `open_abs`.
///
/// Returns the body between the delimiters and the byte offset just past `}}`.
fn placeholder_body(
    text: &str,
    open_abs: usize,
    body_start: usize,
) -> Result<(&str, usize), SyntaxError> {
    let tail = &text[body_start..];
    let close = tail
        .find(CLOSE)
        .ok_or_else(|| error_at(text, open_abs, "'{{' is never closed"))?;
    let body = &tail[..close];
    if let Some(nested) = body.find(OPEN) {
        return Err(error_at(
            text,
            body_start + nested,
            "'{{' nested inside another placeholder",
        ));
    }
    Ok((body, body_start + close + CLOSE.len()))
}

/// Scan forward from `from` to the matching endraw marker.
///
/// Returns the verbatim content, the offset just past the endraw marker and
/// whether that marker trims the whitespace after it.
fn raw_block(
    text: &str,
    raw_open: usize,
    from: usize,
) -> Result<(&str, usize, bool), SyntaxError> {
    let mut search = from;
    while let Some(rel) = text[search..].find(OPEN) {
        let open_abs = search + rel;
        let body_start = open_abs + OPEN.len();
        if let Some(close) = text[body_start..].find(CLOSE) {
            let body = &text[body_start..body_start + close];
            let (_, word, trim_right) = split_trim_markers(body);
            if word == RAW_END {
                return Ok((&text[from..open_abs], body_start + close + CLOSE.len(), trim_right));
            }
        }
        search = body_start;
    }
    Err(error_at(text, raw_open, "raw block is never closed"))
}

/// Split a placeholder body into (left trim, word, right trim).
///
/// As in Go, a trim marker is a `-` separated from the word by whitespace,
/// so `{{-3}}` is not trimmed.
fn split_trim_markers(body: &str) -> (bool, &str, bool) {
    let left = body.starts_with('-') && body[1..].starts_with(is_template_space);
    let body = if left { &body[1..] } else { body };
    let right = body.ends_with('-') && body[..body.len() - 1].ends_with(is_template_space);
    let body = if right { &body[..body.len() - 1] } else { body };
    (left, body.trim(), right)
}

fn is_template_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn trim_trailing_space(literal: &mut String) {
    let kept = literal.trim_end_matches(is_template_space).len();
    literal.truncate(kept);
}

fn skip_space(text: &str, from: usize) -> usize {
    let rest = &text[from..];
    from + (rest.len() - rest.trim_start_matches(is_template_space).len())
}

fn is_profile_variable(word: &str) -> bool {
    is_identifier(word) && !GO_TEMPLATE_WORDS.contains(&word)
}

pub(crate) fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn flush(literal: &mut String, segments: &mut Vec<Segment>) {
    if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(literal)));
    }
}

fn error_at(text: &str, offset: usize, message: &str) -> SyntaxError {
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before.rfind('\n').map_or(offset, |nl| offset - nl - 1) + 1;
    SyntaxError {
        line,
        column,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn classifies_profile_and_passthrough() {
        let t = ParsedTemplate::parse(r#"project="{{project}}" app={{ $labels.name }}"#).unwrap();
        assert_eq!(
            t.segments(),
            &[
                Segment::Literal("project=\"".into()),
                Segment::Profile("project".into()),
                Segment::Literal("\" app=".into()),
                Segment::Passthrough("{{ $labels.name }}".into()),
            ]
        );
    }

    #[test]
    fn go_keywords_and_calls_are_passthrough() {
        let t = ParsedTemplate::parse("{{ if $values.A }}{{ humanize $value }}{{ end }}{{ .Value }}")
            .unwrap();
        assert!(t.variables().is_empty());
        assert_eq!(
            t.render(|_| None).unwrap(),
            "{{ if $values.A }}{{ humanize $value }}{{ end }}{{ .Value }}"
        );
    }

    #[test]
    fn trim_markers_do_not_hide_profile_variables() {
        let t = ParsedTemplate::parse("a {{- env -}} b").unwrap();
        assert_eq!(t.variables().into_iter().collect::<Vec<_>>(), vec!["env"]);
    }

    #[test]
    fn trim_markers_on_profile_placeholders_remove_adjacent_whitespace() {
        let t = ParsedTemplate::parse("a \n\t{{- env -}}\n b").unwrap();
        assert_eq!(t.render(lookup_from(&[("env", "prod")])).unwrap(), "aprodb");

        let t = ParsedTemplate::parse("a {{- env }} b {{ env -}} c").unwrap();
        assert_eq!(t.render(lookup_from(&[("env", "prod")])).unwrap(), "aprod b prodc");
    }

    #[test]
    fn trim_markers_on_passthrough_are_left_for_grafana() {
        let text = "a {{- $labels.name -}} b";
        let t = ParsedTemplate::parse(text).unwrap();
        assert_eq!(t.render(|_| None).unwrap(), text);
    }

    #[test]
    fn dash_without_space_is_not_a_trim_marker() {
        let t = ParsedTemplate::parse("x {{-3}} y").unwrap();
        assert!(t.variables().is_empty());
        assert_eq!(t.render(|_| None).unwrap(), "x {{-3}} y");
    }

    #[test]
    fn trim_markers_on_raw_tags() {
        let t = ParsedTemplate::parse("a {{- /* raw */}}{{ env }}{{/* endraw */ -}} b").unwrap();
        assert_eq!(t.render(|_| None).unwrap(), "a{{ env }}b");
    }

    #[test]
    fn raw_block_is_verbatim() {
        let t = ParsedTemplate::parse("x{{/* raw */}}{{ env }} }} {{{{/* endraw */}}y").unwrap();
        assert!(t.variables().is_empty());
        assert_eq!(t.render(|_| None).unwrap(), "x{{ env }} }} {{y");
    }

    #[test]
    fn render_substitutes_every_occurrence() {
        let t = ParsedTemplate::parse("{{env}}-{{ env }}-{{project}}").unwrap();
        let out = t
            .render(lookup_from(&[("env", "prod"), ("project", "production")]))
            .unwrap();
        assert_eq!(out, "prod-prod-production");
    }

    #[test]
    fn render_reports_all_missing_once() {
        let t = ParsedTemplate::parse("{{a}} {{b}} {{a}} {{c}}").unwrap();
        let missing = t.render(lookup_from(&[("b", "1")])).unwrap_err();
        assert_eq!(missing, vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn unclosed_placeholder_is_rejected_with_position() {
        let err = ParsedTemplate::parse("line one\n  {{ env").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 3);
        assert!(err.message.contains("never closed"));
    }

    #[test]
    fn stray_close_is_rejected() {
        assert!(ParsedTemplate::parse("value }} here").is_err());
    }

    #[test]
    fn nested_open_is_rejected() {
        let err = ParsedTemplate::parse("{{ a {{ b }}").unwrap_err();
        assert!(err.message.contains("nested"));
    }

    #[test]
    fn empty_placeholder_is_rejected() {
        assert!(ParsedTemplate::parse("{{   }}").is_err());
    }

    #[test]
    fn unclosed_raw_block_is_rejected() {
        assert!(ParsedTemplate::parse("{{/* raw */}} {{ env }}").is_err());
        assert!(ParsedTemplate::parse("{{/* endraw */}}").is_err());
    }

    #[test]
    fn single_braces_are_literal() {
        let text = r#"sum(argocd_app_info{sync_status!="Synced"}) by (name)"#;
        let t = ParsedTemplate::parse(text).unwrap();
        assert_eq!(t.segments(), &[Segment::Literal(text.into())]);
    }
}
