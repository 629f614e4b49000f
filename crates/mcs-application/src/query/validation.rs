//! Query validation and sanitization
//!
//! Enforces the query contract (non-empty, length and word limits) and
//! strips dangerous substrings: script tags, SQL-ish keywords, template
//! markers and `javascript:` URLs. A query that is nothing but dangerous
//! content is rejected rather than silently emptied.

use once_cell::sync::Lazy;
use regex::Regex;

use mcs_domain::constants::{MAX_QUERY_CHARS, MAX_QUERY_WORDS};
use mcs_domain::error::{Error, Result};

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("static regex"));

/// Case-insensitive substrings removed from queries before they reach any
/// backend or filter expression.
pub static DANGEROUS_PATTERNS: &[&str] = &[
    "<script",
    "</script",
    "javascript:",
    "{{",
    "}}",
    "${",
    "drop table",
    "truncate table",
    "delete from",
    "insert into",
    "union select",
    "exec(",
    "xp_cmdshell",
];

/// Strip HTML tags from a snippet or highlight
pub fn sanitize_html(text: &str) -> String {
    TAG_RE
        .replace_all(text, "")
        .replace('\u{a0}', " ")
        .trim()
        .to_string()
}

/// Remove dangerous substrings, case-insensitively.
///
/// Returns the sanitized text and the list of patterns that were removed.
pub fn strip_dangerous(text: &str) -> (String, Vec<&'static str>) {
    let mut cleaned = text.to_string();
    let mut removed = Vec::new();
    for pattern in DANGEROUS_PATTERNS {
        loop {
            let lower = cleaned.to_lowercase();
            match lower.find(pattern) {
                Some(at) => {
                    cleaned.replace_range(at..at + pattern.len(), " ");
                    if !removed.contains(pattern) {
                        removed.push(*pattern);
                    }
                }
                None => break,
            }
        }
    }
    (cleaned.split_whitespace().collect::<Vec<_>>().join(" "), removed)
}

/// Validate and sanitize a raw query string.
///
/// Returns the sanitized text and the names of applied sanitization rules.
pub fn validate_query(raw: &str) -> Result<(String, Vec<String>)> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::validation_field("query", "query must not be empty"));
    }
    if trimmed.len() > MAX_QUERY_CHARS {
        return Err(Error::validation_field(
            "query",
            format!("query exceeds {MAX_QUERY_CHARS} characters"),
        ));
    }
    if trimmed.split_whitespace().count() > MAX_QUERY_WORDS {
        return Err(Error::validation_field(
            "query",
            format!("query exceeds {MAX_QUERY_WORDS} words"),
        ));
    }

    let mut rules = Vec::new();
    let without_tags = sanitize_html(trimmed);
    if without_tags != trimmed {
        rules.push("stripped_html".to_string());
    }

    let (cleaned, removed) = strip_dangerous(&without_tags);
    for pattern in removed {
        rules.push(format!("removed:{pattern}"));
    }

    if cleaned.trim().is_empty() {
        return Err(Error::validation_field(
            "query",
            "query is empty after sanitization",
        ));
    }
    Ok((cleaned, rules))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_whitespace_queries_are_rejected() {
        assert!(validate_query("").is_err());
        assert!(validate_query("   ").is_err());
        assert!(validate_query("\n\t").is_err());
    }

    #[test]
    fn over_length_queries_are_rejected() {
        let long = "a".repeat(MAX_QUERY_CHARS + 1);
        assert!(validate_query(&long).is_err());

        let wordy = "word ".repeat(MAX_QUERY_WORDS + 1);
        assert!(validate_query(&wordy).is_err());
    }

    #[test]
    fn clean_queries_pass_through() {
        let (text, rules) = validate_query("async connection pool").unwrap();
        assert_eq!(text, "async connection pool");
        assert!(rules.is_empty());
    }

    #[test]
    fn dangerous_patterns_never_survive_sanitization() {
        for pattern in DANGEROUS_PATTERNS {
            let raw = format!("find auth {pattern} middleware");
            match validate_query(&raw) {
                Ok((text, rules)) => {
                    assert!(
                        !text.to_lowercase().contains(pattern),
                        "pattern {pattern} survived: {text}"
                    );
                    assert!(!rules.is_empty());
                }
                Err(e) => assert_eq!(e.code().as_str(), "validation"),
            }
        }
    }

    #[test]
    fn purely_dangerous_queries_are_rejected() {
        assert!(validate_query("<script></script>").is_err());
    }

    #[test]
    fn html_is_stripped_from_snippets() {
        assert_eq!(sanitize_html("<em>auth</em> check"), "auth check");
        assert_eq!(sanitize_html("no tags"), "no tags");
    }

    #[test]
    fn sql_keywords_are_removed_case_insensitively() {
        let (text, _) = validate_query("users DROP TABLE accounts").unwrap();
        assert!(!text.to_lowercase().contains("drop table"));
        assert!(text.contains("users"));
    }
}
