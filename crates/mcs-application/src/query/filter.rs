//! Filter composition
//!
//! Builds the service filter expression from repository, language and
//! sanitized exact terms. Values are never interpolated raw: embedded
//! single quotes are escaped by doubling, which is the filter DSL's only
//! escape mechanism.

use crate::query::validation::strip_dangerous;

/// Escape a value for inclusion in a single-quoted filter literal
pub fn escape_filter_value(value: &str) -> String {
    value.replace('\'', "''")
}

/// Fields exact terms are matched against
const EXACT_TERM_FIELDS: &str = "content,function_name,class_name";

/// Compose a filter expression; `None` when no clause applies
pub fn build_filter(
    repository: Option<&str>,
    language: Option<&str>,
    exact_terms: &[String],
) -> Option<String> {
    let mut clauses: Vec<String> = Vec::new();

    if let Some(repository) = repository.filter(|r| !r.trim().is_empty()) {
        clauses.push(format!(
            "repository eq '{}'",
            escape_filter_value(repository.trim())
        ));
    }
    if let Some(language) = language.filter(|l| !l.trim().is_empty()) {
        clauses.push(format!(
            "language eq '{}'",
            escape_filter_value(&language.trim().to_lowercase())
        ));
    }

    for term in exact_terms {
        // Sanitize before escaping so dangerous fragments cannot ride in on
        // an exact term.
        let (sanitized, _) = strip_dangerous(term);
        let sanitized = sanitized.trim();
        if sanitized.is_empty() {
            continue;
        }
        clauses.push(format!(
            "search.ismatch('\"{}\"', '{}')",
            escape_filter_value(sanitized),
            EXACT_TERM_FIELDS
        ));
    }

    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" and "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_inputs_yield_no_filter() {
        assert_eq!(build_filter(None, None, &[]), None);
        assert_eq!(build_filter(Some("  "), None, &[]), None);
    }

    #[test]
    fn repository_and_language_clauses_join_with_and() {
        let filter = build_filter(Some("my-repo"), Some("Rust"), &[]).unwrap();
        assert_eq!(
            filter,
            "repository eq 'my-repo' and language eq 'rust'"
        );
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let terms = vec!["foo') or 1 eq 1".to_string()];
        let filter = build_filter(None, None, &terms).unwrap();
        assert!(
            filter.contains("foo'')"),
            "quotes must be doubled: {filter}"
        );
        // The raw single-quote sequence that would close the literal never
        // appears unescaped.
        assert!(!filter.contains("'foo')"));
    }

    #[test]
    fn repository_quotes_are_escaped_too() {
        let filter = build_filter(Some("o'reilly"), None, &[]).unwrap();
        assert_eq!(filter, "repository eq 'o''reilly'");
    }

    #[test]
    fn empty_terms_are_skipped() {
        let terms = vec!["  ".to_string(), "real".to_string()];
        let filter = build_filter(None, None, &terms).unwrap();
        assert_eq!(filter.matches("search.ismatch").count(), 1);
        assert!(filter.contains("real"));
    }
}
