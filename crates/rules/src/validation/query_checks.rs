//! Query checks: non-empty expression, balanced brackets, known condition.

use super::fuzzy::fuzzy_match;
use super::ValidationResult;
use crate::generator::GeneratedRule;
use crate::schema::QUERY_REF_ID;

pub(super) fn validate_query(rule: &GeneratedRule, result: &mut ValidationResult) {
    if rule.query.trim().is_empty() {
        result.error("expr", "query expression must not be empty");
        return;
    }

    if let Err(message) = check_brackets(&rule.query) {
        result.error("expr", message);
    }

    if rule.query.contains("{{") {
        result.warn(
            "expr",
            "query contains a passthrough placeholder; datasources receive it verbatim",
        );
    }

    if rule.datasource_uid.trim().is_empty() {
        result.error("datasource", "datasource uid must not be empty");
    }

    if rule.condition != QUERY_REF_ID {
        result.error_with_suggestion(
            "condition",
            format!(
                "condition '{}' does not reference a query (defined: {QUERY_REF_ID})",
                rule.condition
            ),
            fuzzy_match(&rule.condition, &[QUERY_REF_ID]).or(Some(QUERY_REF_ID)),
        );
    }
}

/// Verify (), [] and {} nest properly outside string literals and comments.
pub(crate) fn check_brackets(expr: &str) -> Result<(), String> {
    let mut stack: Vec<char> = Vec::new();
    let mut chars = expr.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' | '`' => {
                let quote = c;
                let mut closed = false;
                while let Some(inner) = chars.next() {
                    if inner == '\\' && quote != '`' {
                        chars.next();
                    } else if inner == quote {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(format!("unterminated {quote} string literal"));
                }
            }
            '#' => {
                // PromQL line comment.
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        break;
                    }
                }
            }
            '(' | '[' | '{' => stack.push(c),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match stack.pop() {
                    Some(open) if open == expected => {}
                    Some(open) => return Err(format!("'{c}' closes '{open}'")),
                    None => return Err(format!("unmatched '{c}'")),
                }
            }
            _ => {}
        }
    }

    match stack.last() {
        Some(open) => Err(format!("unclosed '{open}'")),
        None => Ok(()),
    }
}
