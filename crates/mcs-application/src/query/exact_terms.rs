//! Exact-term extraction
//!
//! Pulls terms out of a query that should match literally: quoted phrases,
//! numeric literals and `name(` call patterns. Order-preserving, de-duplicated.

use once_cell::sync::Lazy;
use regex::Regex;

static QUOTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]+)"|'([^']+)'"#).expect("static regex"));
static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d+(?:\.\d+)+|\d{2,})\b").expect("static regex"));
static CALL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+)\s*\(").expect("static regex"));

/// Extract exact terms from a query
pub fn extract_exact_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();

    for captures in QUOTED_RE.captures_iter(query) {
        for group in [captures.get(1), captures.get(2)].into_iter().flatten() {
            let term = group.as_str().trim();
            if !term.is_empty() {
                terms.push(term.to_string());
            }
        }
    }

    for captures in NUMBER_RE.captures_iter(query) {
        if let Some(number) = captures.get(1) {
            terms.push(number.as_str().to_string());
        }
    }

    for captures in CALL_RE.captures_iter(query) {
        if let Some(name) = captures.get(1) {
            terms.push(name.as_str().to_string());
        }
    }

    // De-duplicate preserving first occurrence.
    let mut seen = std::collections::HashSet::new();
    terms.retain(|t| seen.insert(t.clone()));
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_phrases_are_extracted() {
        let terms = extract_exact_terms(r#"find "connection pool" and 'retry logic'"#);
        assert_eq!(terms, vec!["connection pool", "retry logic"]);
    }

    #[test]
    fn numeric_literals_are_extracted() {
        let terms = extract_exact_terms("error 404 in version 1.2.3");
        assert!(terms.contains(&"404".to_string()));
        assert!(terms.contains(&"1.2.3".to_string()));
    }

    #[test]
    fn call_patterns_are_extracted() {
        let terms = extract_exact_terms("where is parse_config( called");
        assert_eq!(terms, vec!["parse_config"]);
    }

    #[test]
    fn duplicates_keep_first_position() {
        let terms = extract_exact_terms(r#""auth" check auth("auth")"#);
        assert_eq!(terms[0], "auth");
        assert_eq!(terms.iter().filter(|t| *t == "auth").count(), 1);
    }

    #[test]
    fn plain_queries_yield_nothing() {
        assert!(extract_exact_terms("how does the cache work").is_empty());
    }
}
