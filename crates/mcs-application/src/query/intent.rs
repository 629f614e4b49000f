//! Rule-based intent classification
//!
//! Maps a query to the intent enum by keyword evidence. A supplied intent
//! always overrides classification; queries with no signal classify to
//! `None` and rank with neutral intent boosts.

use mcs_domain::value_objects::SearchIntent;

const IMPLEMENT_SIGNALS: &[&str] = &[
    "implement", "create", "add", "build", "write", "how to", "example", "new feature", "support",
];
const DEBUG_SIGNALS: &[&str] = &[
    "debug", "error", "fix", "bug", "crash", "exception", "panic", "fail", "broken", "traceback",
    "stack trace", "not working",
];
const UNDERSTAND_SIGNALS: &[&str] = &[
    "understand", "explain", "what does", "what is", "how does", "why", "where is", "meaning",
];
const REFACTOR_SIGNALS: &[&str] = &[
    "refactor", "clean up", "simplify", "restructure", "rename", "extract", "deduplicate",
    "optimize",
];
const TEST_SIGNALS: &[&str] = &[
    "test", "unit test", "integration test", "mock", "assert", "coverage", "fixture", "stub",
];
const DOCUMENT_SIGNALS: &[&str] = &[
    "document", "documentation", "docstring", "readme", "comment", "changelog", "api docs",
];

fn score(query: &str, signals: &[&str]) -> usize {
    signals.iter().filter(|s| query.contains(*s)).count()
}

/// Classify a query's intent from keyword evidence
pub fn classify_intent(query: &str) -> Option<SearchIntent> {
    let lowered = query.to_lowercase();
    let scores = [
        (SearchIntent::Debug, score(&lowered, DEBUG_SIGNALS)),
        (SearchIntent::Test, score(&lowered, TEST_SIGNALS)),
        (SearchIntent::Refactor, score(&lowered, REFACTOR_SIGNALS)),
        (SearchIntent::Document, score(&lowered, DOCUMENT_SIGNALS)),
        (SearchIntent::Implement, score(&lowered, IMPLEMENT_SIGNALS)),
        (SearchIntent::Understand, score(&lowered, UNDERSTAND_SIGNALS)),
    ];

    scores
        .iter()
        .filter(|(_, s)| *s > 0)
        .max_by_key(|(_, s)| *s)
        .map(|(intent, _)| *intent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_queries_classify_as_debug() {
        assert_eq!(
            classify_intent("fix panic in connection pool"),
            Some(SearchIntent::Debug)
        );
        assert_eq!(
            classify_intent("stack trace on startup error"),
            Some(SearchIntent::Debug)
        );
    }

    #[test]
    fn implement_queries_classify_as_implement() {
        assert_eq!(
            classify_intent("how to implement retry backoff"),
            Some(SearchIntent::Implement)
        );
    }

    #[test]
    fn test_queries_classify_as_test() {
        assert_eq!(
            classify_intent("unit test for the session store"),
            Some(SearchIntent::Test)
        );
    }

    #[test]
    fn neutral_queries_classify_to_none() {
        assert_eq!(classify_intent("session store"), None);
    }

    #[test]
    fn strongest_signal_wins() {
        // Two debug signals vs one understand signal.
        assert_eq!(
            classify_intent("why does this error crash"),
            Some(SearchIntent::Debug)
        );
    }
}
