//! Query shaper
//!
//! The front door of the retrieval pipeline: runs validation, exact-term
//! extraction, intent classification, rewriting and filter composition over
//! a raw [`SearchQuery`].

use serde::{Deserialize, Serialize};

use mcs_domain::error::Result;
use mcs_domain::value_objects::{SearchIntent, SearchQuery};

use super::exact_terms::extract_exact_terms;
use super::filter::build_filter;
use super::intent::classify_intent;
use super::rewrite::rewrite_query;
use super::validation::validate_query;

/// The shaped form of a query, ready for retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapedQuery {
    /// The raw query as received
    pub original: String,
    /// Sanitized text sent to the lexical backend
    pub text: String,
    /// Effective intent: supplied wins over classified
    pub intent: Option<SearchIntent>,
    /// Whether the caller supplied the intent
    pub intent_supplied: bool,
    /// Exact terms to filter on (caller-supplied or auto-extracted)
    pub exact_terms: Vec<String>,
    /// Recall-improving rewrites; `rewrites[0]` is the sanitized original
    pub rewrites: Vec<String>,
    /// Composed filter expression, when any clause applies
    pub filter: Option<String>,
    /// Names of validation/rewrite rules that fired
    pub applied_rules: Vec<String>,
}

impl ShapedQuery {
    /// Whether exact-term filtering will be applied
    pub fn applies_exact_terms(&self) -> bool {
        !self.exact_terms.is_empty()
    }
}

/// Query shaping service
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryShaper;

impl QueryShaper {
    /// Create a shaper
    pub fn new() -> Self {
        Self
    }

    /// Shape a validated search query
    pub fn shape(&self, query: &SearchQuery) -> Result<ShapedQuery> {
        let (text, mut applied_rules) = validate_query(&query.text)?;

        let exact_terms = if query.exact_terms.is_empty() {
            let auto = extract_exact_terms(&text);
            if !auto.is_empty() {
                applied_rules.push("auto_exact_terms".to_string());
            }
            auto
        } else {
            query.exact_terms.clone()
        };

        let (intent, intent_supplied) = match query.intent {
            Some(intent) => (Some(intent), true),
            None => {
                let classified = classify_intent(&text);
                if classified.is_some() {
                    applied_rules.push("classified_intent".to_string());
                }
                (classified, false)
            }
        };

        let (rewrites, rewrite_rules) = rewrite_query(&text);
        applied_rules.extend(rewrite_rules);

        let filter = build_filter(
            query.repository.as_deref(),
            query.language.as_deref(),
            &exact_terms,
        );

        Ok(ShapedQuery {
            original: query.text.clone(),
            text,
            intent,
            intent_supplied,
            exact_terms,
            rewrites,
            filter,
            applied_rules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(text: &str) -> SearchQuery {
        SearchQuery::new(text)
    }

    #[test]
    fn shaping_a_clean_query() {
        let shaped = QueryShaper::new().shape(&query("async runtime")).unwrap();
        assert_eq!(shaped.text, "async runtime");
        assert_eq!(shaped.rewrites[0], "async runtime");
        assert!(shaped.filter.is_none());
        assert!(!shaped.intent_supplied);
    }

    #[test]
    fn empty_queries_are_rejected() {
        assert!(QueryShaper::new().shape(&query("   ")).is_err());
    }

    #[test]
    fn supplied_intent_overrides_classification() {
        let mut q = query("fix the crash in startup");
        q.intent = Some(SearchIntent::Document);
        let shaped = QueryShaper::new().shape(&q).unwrap();
        assert_eq!(shaped.intent, Some(SearchIntent::Document));
        assert!(shaped.intent_supplied);
    }

    #[test]
    fn intent_is_classified_when_absent() {
        let shaped = QueryShaper::new()
            .shape(&query("fix the crash in startup"))
            .unwrap();
        assert_eq!(shaped.intent, Some(SearchIntent::Debug));
        assert!(shaped
            .applied_rules
            .contains(&"classified_intent".to_string()));
    }

    #[test]
    fn exact_terms_auto_extract_when_not_supplied() {
        let shaped = QueryShaper::new()
            .shape(&query(r#"find "retry backoff" logic"#))
            .unwrap();
        assert_eq!(shaped.exact_terms, vec!["retry backoff"]);
        assert!(shaped.applies_exact_terms());
        assert!(shaped.filter.as_deref().unwrap().contains("retry backoff"));
    }

    #[test]
    fn supplied_exact_terms_win_over_extraction() {
        let mut q = query(r#"find "quoted" thing"#);
        q.exact_terms = vec!["explicit".to_string()];
        let shaped = QueryShaper::new().shape(&q).unwrap();
        assert_eq!(shaped.exact_terms, vec!["explicit"]);
    }

    #[test]
    fn filters_combine_scopes_and_terms() {
        let mut q = query("pool");
        q.repository = Some("backend".to_string());
        q.language = Some("rust".to_string());
        let shaped = QueryShaper::new().shape(&q).unwrap();
        let filter = shaped.filter.unwrap();
        assert!(filter.contains("repository eq 'backend'"));
        assert!(filter.contains("language eq 'rust'"));
    }
}
