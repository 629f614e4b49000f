//! Contextual re-ranking
//!
//! Re-weights fused results using intent boosts, caller context, adaptive
//! feedback weights and freshness decay. Deterministic for a fixed weights
//! snapshot: each ranking pass reads exactly one snapshot and never calls
//! back into the feedback store.

use chrono::Utc;
use std::sync::Arc;

use mcs_domain::value_objects::{RankedResult, RankingFactor, SearchIntent, WeightsSnapshot};
use mcs_domain::ports::WeightsSource;

use crate::query::ShapedQuery;

use super::retriever::SearchContext;

/// Patterns indicating error-handling code, boosted for debug intent
const ERROR_MARKERS: &[&str] = &[
    "catch", "except", "panic", "unwrap_or", "Err(", "error", "raise", "throw",
];

/// Markers of test code, boosted for test intent
const TEST_MARKERS: &[&str] = &["#[test]", "def test_", "it(", "assert", "expect("];

/// Contextual ranker
pub struct ContextualRanker {
    weights: Arc<dyn WeightsSource>,
    half_life_days: f64,
}

impl ContextualRanker {
    /// Create a ranker reading adaptive weights from `weights`
    pub fn new(weights: Arc<dyn WeightsSource>, half_life_days: f64) -> Self {
        Self {
            weights,
            half_life_days: half_life_days.max(1.0),
        }
    }

    /// Re-rank results in place.
    ///
    /// Multiplies each result's fused relevance by the applicable boosts,
    /// records the contributing factors and renormalizes into `[0, 1]`.
    pub fn rank(&self, results: &mut [RankedResult], shaped: &ShapedQuery, context: &SearchContext) {
        let snapshot = self.weights.latest();
        for result in results.iter_mut() {
            self.apply_boosts(result, shaped, context, &snapshot);
        }

        let max = results
            .iter()
            .map(|r| r.relevance)
            .fold(0.0_f64, f64::max);
        if max > 1.0 {
            for result in results.iter_mut() {
                result.relevance /= max;
            }
        }
        for result in results.iter_mut() {
            result.relevance = result.relevance.clamp(0.0, 1.0);
        }
    }

    fn apply_boosts(
        &self,
        result: &mut RankedResult,
        shaped: &ShapedQuery,
        context: &SearchContext,
        snapshot: &WeightsSnapshot,
    ) {
        if let Some(intent) = shaped.intent {
            let boost = Self::intent_boost(intent, result);
            if boost != 1.0 {
                result.relevance *= boost;
                result.factors.push(RankingFactor::new(
                    "intent_boost",
                    boost - 1.0,
                    format!("{} intent favours this result shape", intent),
                ));
            }

            let adaptive = self.adaptive_boost(intent, result, snapshot);
            if adaptive != 1.0 {
                result.relevance *= adaptive;
                result.factors.push(RankingFactor::new(
                    "adaptive_weight",
                    adaptive - 1.0,
                    format!("feedback snapshot v{}", snapshot.version),
                ));
            }
        }

        let context_boost = Self::context_boost(result, context);
        if context_boost != 1.0 {
            result.relevance *= context_boost;
            result.factors.push(RankingFactor::new(
                "context_boost",
                context_boost - 1.0,
                "related to the caller's current file",
            ));
        }

        let freshness = self.freshness_factor(result);
        if freshness != 1.0 {
            result.relevance *= freshness;
            result.factors.push(RankingFactor::new(
                "freshness",
                freshness - 1.0,
                format!("half-life {} days", self.half_life_days),
            ));
        }
    }

    /// Per-intent shape boosts
    fn intent_boost(intent: SearchIntent, result: &RankedResult) -> f64 {
        let content = result.content.as_str();
        match intent {
            SearchIntent::Implement => {
                if result.function_name.is_some() {
                    1.15
                } else {
                    1.0
                }
            }
            SearchIntent::Debug => {
                if ERROR_MARKERS.iter().any(|m| content.contains(m)) {
                    1.2
                } else {
                    1.0
                }
            }
            SearchIntent::Understand => {
                if result
                    .factors
                    .iter()
                    .any(|f| f.factor == "semantic")
                {
                    1.1
                } else {
                    1.0
                }
            }
            SearchIntent::Refactor => {
                if result.class_name.is_some() {
                    1.1
                } else {
                    1.0
                }
            }
            SearchIntent::Test => {
                let looks_like_test = result.file_path.contains("test")
                    || TEST_MARKERS.iter().any(|m| content.contains(m));
                if looks_like_test {
                    1.25
                } else {
                    1.0
                }
            }
            SearchIntent::Document => 1.0,
        }
    }

    /// Feedback-adjusted boost for the fields this result matched on
    fn adaptive_boost(
        &self,
        intent: SearchIntent,
        result: &RankedResult,
        snapshot: &WeightsSnapshot,
    ) -> f64 {
        let mut boost = snapshot.boost(intent, "content");
        if result.function_name.is_some() {
            boost *= snapshot.boost(intent, "function_name");
        }
        if result.class_name.is_some() {
            boost *= snapshot.boost(intent, "class_name");
        }
        boost
    }

    /// Same-repository / same-directory / import-neighbour boosts
    fn context_boost(result: &RankedResult, context: &SearchContext) -> f64 {
        let Some(current_file) = context.current_file.as_deref() else {
            return 1.0;
        };

        let mut boost = 1.0;
        if let Some(root) = context.workspace_root.as_deref() {
            let repo = root.rsplit('/').next().unwrap_or(root);
            if !repo.is_empty() && result.repository == repo {
                boost *= 1.05;
            }
        }

        let dir_of = |path: &str| path.rsplit_once('/').map(|(d, _)| d.to_string());
        if dir_of(current_file).is_some() && dir_of(current_file) == dir_of(&result.file_path) {
            boost *= 1.15;
        }

        let stem = result
            .file_path
            .rsplit('/')
            .next()
            .and_then(|f| f.split('.').next())
            .unwrap_or_default();
        if !stem.is_empty()
            && context
                .current_imports
                .iter()
                .any(|import| import.contains(stem))
        {
            boost *= 1.1;
        }
        boost
    }

    /// Linear-in-log freshness decay with the configured half-life.
    ///
    /// Recent results get up to +10%; very old results lose up to 10%.
    fn freshness_factor(&self, result: &RankedResult) -> f64 {
        let Some(modified) = result.last_modified else {
            return 1.0;
        };
        let age_days = (Utc::now() - modified).num_days().max(0) as f64;
        let decay = 0.5_f64.powf(age_days / self.half_life_days);
        0.9 + 0.2 * decay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryShaper;
    use arc_swap::ArcSwap;
    use mcs_domain::value_objects::{FieldWeight, SearchQuery};
    use std::collections::HashMap;

    struct StaticWeights(ArcSwap<WeightsSnapshot>);

    impl WeightsSource for StaticWeights {
        fn latest(&self) -> Arc<WeightsSnapshot> {
            self.0.load_full()
        }
    }

    fn weights(snapshot: WeightsSnapshot) -> Arc<dyn WeightsSource> {
        Arc::new(StaticWeights(ArcSwap::from_pointee(snapshot)))
    }

    fn result(id: &str, relevance: f64) -> RankedResult {
        RankedResult {
            id: id.to_string(),
            repository: "repo".to_string(),
            file_path: format!("src/{id}.rs"),
            language: "rust".to_string(),
            start_line: 1,
            end_line: 20,
            content: "fn handler() {}".to_string(),
            function_name: Some("handler".to_string()),
            class_name: None,
            relevance,
            highlights: HashMap::new(),
            dependencies: Vec::new(),
            factors: Vec::new(),
            query_id: "q".to_string(),
            rank: 0,
            last_modified: None,
        }
    }

    fn shaped(text: &str, intent: Option<SearchIntent>) -> ShapedQuery {
        let mut query = SearchQuery::new(text);
        query.intent = intent;
        QueryShaper::new().shape(&query).unwrap()
    }

    fn no_context() -> SearchContext {
        SearchContext::default()
    }

    #[test]
    fn relevance_stays_in_unit_interval() {
        let ranker = ContextualRanker::new(weights(WeightsSnapshot::empty()), 30.0);
        let mut results = vec![result("a", 1.0), result("b", 0.9)];
        let shaped = shaped("implement handler", Some(SearchIntent::Implement));
        ranker.rank(&mut results, &shaped, &no_context());
        for r in &results {
            assert!((0.0..=1.0).contains(&r.relevance), "out of range: {}", r.relevance);
        }
    }

    #[test]
    fn implement_intent_boosts_functions() {
        let ranker = ContextualRanker::new(weights(WeightsSnapshot::empty()), 30.0);
        let mut with_fn = vec![result("a", 0.5)];
        let mut without_fn = vec![{
            let mut r = result("b", 0.5);
            r.function_name = None;
            r
        }];
        let shaped = shaped("anything", Some(SearchIntent::Implement));
        ranker.rank(&mut with_fn, &shaped, &no_context());
        ranker.rank(&mut without_fn, &shaped, &no_context());
        assert!(with_fn[0].relevance > without_fn[0].relevance);
        assert!(with_fn[0].factors.iter().any(|f| f.factor == "intent_boost"));
    }

    #[test]
    fn adaptive_weights_change_order() {
        let mut snapshot = WeightsSnapshot::empty();
        snapshot.version = 3;
        snapshot
            .by_intent
            .entry("implement".to_string())
            .or_default()
            .insert(
                "function_name".to_string(),
                FieldWeight {
                    ctr: 0.8,
                    positive_rate: 0.7,
                    weight: 1.5,
                    samples: 100,
                },
            );
        let ranker = ContextualRanker::new(weights(snapshot), 30.0);

        let mut function_hit = vec![result("a", 0.5)];
        let mut plain_hit = vec![{
            let mut r = result("b", 0.5);
            r.function_name = None;
            r
        }];
        let shaped = shaped("anything", Some(SearchIntent::Implement));
        ranker.rank(&mut function_hit, &shaped, &no_context());
        ranker.rank(&mut plain_hit, &shaped, &no_context());
        assert!(function_hit[0].relevance > plain_hit[0].relevance);
        assert!(function_hit[0]
            .factors
            .iter()
            .any(|f| f.factor == "adaptive_weight" && f.detail.contains("v3")));
    }

    #[test]
    fn same_directory_results_are_boosted() {
        let ranker = ContextualRanker::new(weights(WeightsSnapshot::empty()), 30.0);
        let context = SearchContext {
            current_file: Some("src/a.rs".to_string()),
            ..SearchContext::default()
        };
        let mut near = vec![result("a", 0.5)];
        let mut far = vec![{
            let mut r = result("b", 0.5);
            r.file_path = "other/b.rs".to_string();
            r
        }];
        let shaped = shaped("anything", None);
        ranker.rank(&mut near, &shaped, &context);
        ranker.rank(&mut far, &shaped, &context);
        assert!(near[0].relevance > far[0].relevance);
    }

    #[test]
    fn fresh_results_outrank_stale_ones() {
        let ranker = ContextualRanker::new(weights(WeightsSnapshot::empty()), 30.0);
        let mut fresh = vec![{
            let mut r = result("a", 0.5);
            r.last_modified = Some(Utc::now());
            r
        }];
        let mut stale = vec![{
            let mut r = result("b", 0.5);
            r.last_modified = Some(Utc::now() - chrono::Duration::days(365));
            r
        }];
        let shaped = shaped("anything", None);
        ranker.rank(&mut fresh, &shaped, &no_context());
        ranker.rank(&mut stale, &shaped, &no_context());
        assert!(fresh[0].relevance > stale[0].relevance);
    }

    #[test]
    fn ranking_is_deterministic_for_a_snapshot() {
        let ranker = ContextualRanker::new(weights(WeightsSnapshot::empty()), 30.0);
        let shaped = shaped("implement handler", Some(SearchIntent::Implement));
        let mut first = vec![result("a", 0.7), result("b", 0.6)];
        let mut second = vec![result("a", 0.7), result("b", 0.6)];
        ranker.rank(&mut first, &shaped, &no_context());
        ranker.rank(&mut second, &shaped, &no_context());
        let scores = |rs: &[RankedResult]| rs.iter().map(|r| r.relevance).collect::<Vec<_>>();
        assert_eq!(scores(&first), scores(&second));
    }
}
