//! End-to-end retrieval pipeline tests against the in-memory search service.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mcs_application::feedback::WeightsPublisher;
use mcs_application::query::QueryShaper;
use mcs_application::search::{ContextualRanker, HybridRetriever, RetrieverConfig, SearchContext};
use mcs_domain::entities::CodeChunk;
use mcs_domain::error::Result;
use mcs_domain::ports::{DocumentBatch, EmbeddingProvider, SearchServiceClient};
use mcs_domain::value_objects::{Embedding, IndexSchema, SearchBackend, SearchQuery};
use mcs_providers::cache::TtlLruCache;
use mcs_providers::embedding::NullEmbeddingProvider;
use mcs_providers::search::InMemorySearchService;

const INDEX: &str = "code-index";
const DIMS: usize = 8;

/// Deterministic embedder: a text's vector derives from its bytes.
struct HashEmbedder;

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Option<Embedding>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let sum: u32 = text.bytes().map(u32::from).sum();
                let vector: Vec<f32> = (0..DIMS)
                    .map(|i| ((sum + i as u32) % 97) as f32 / 97.0 + 0.01)
                    .collect();
                Some(Embedding::new(vector, "hash"))
            })
            .collect())
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn provider_name(&self) -> &str {
        "hash"
    }
}

fn empty_schema(name: &str) -> IndexSchema {
    IndexSchema {
        name: name.to_string(),
        fields: Vec::new(),
        vector_search: None,
        semantic_configurations: Vec::new(),
        scoring_profiles: Vec::new(),
    }
}

async fn seeded_service(doc_count: usize) -> Arc<InMemorySearchService> {
    let service = Arc::new(InMemorySearchService::new());
    service
        .create_or_update_index(&empty_schema(INDEX))
        .await
        .unwrap();

    let docs: Vec<serde_json::Value> = (0..doc_count)
        .map(|i| {
            let mut chunk = CodeChunk::new(
                "backend",
                format!("src/module_{i}.rs"),
                (i as u32 % 40) + 1,
                (i as u32 % 40) + 20,
                format!("fn handler_{i}() {{ /* function body {i} */ }}"),
                chrono::Utc::now(),
            );
            chunk.function_name = Some(format!("handler_{i}"));
            serde_json::to_value(&chunk).unwrap()
        })
        .collect();
    service
        .index_documents(INDEX, &DocumentBatch::upload(docs))
        .await
        .unwrap();
    service
}

fn retriever(
    service: Arc<InMemorySearchService>,
    embedder: Arc<dyn EmbeddingProvider>,
) -> HybridRetriever {
    let publisher = Arc::new(WeightsPublisher::new());
    HybridRetriever::new(
        service,
        embedder,
        Arc::new(TtlLruCache::new(Duration::from_secs(300), 100)),
        ContextualRanker::new(publisher, 30.0),
        RetrieverConfig {
            index_name: INDEX.to_string(),
            ..RetrieverConfig::default()
        },
    )
}

fn query(text: &str) -> SearchQuery {
    SearchQuery::new(text)
}

async fn run(
    retriever: &HybridRetriever,
    mut q: SearchQuery,
    max_results: usize,
    skip: usize,
) -> mcs_domain::value_objects::SearchPage {
    q.max_results = max_results;
    q.skip = skip;
    let shaped = QueryShaper::new().shape(&q).unwrap();
    retriever
        .search(&q, &shaped, &SearchContext::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn empty_queries_are_rejected_before_any_backend_call() {
    for text in ["", "   ", "\n"] {
        let err = QueryShaper::new().shape(&query(text)).unwrap_err();
        assert_eq!(err.code().as_str(), "validation");
    }
}

#[tokio::test]
async fn pagination_visits_each_id_exactly_once() {
    let service = seeded_service(25).await;
    let retriever = retriever(service, Arc::new(HashEmbedder));

    let first = run(&retriever, query("function"), 10, 0).await;
    assert_eq!(first.items.len(), 10);
    assert!(first.total >= 25);
    assert!(first.has_more(0));
    assert_eq!(first.next_skip(0), Some(10));

    let second = run(&retriever, query("function"), 10, 10).await;
    assert_eq!(second.items.len(), 10);

    let first_ids: Vec<&str> = first.items.iter().map(|i| i.id.as_str()).collect();
    for item in &second.items {
        assert!(
            !first_ids.contains(&item.id.as_str()),
            "page overlap on {}",
            item.id
        );
    }

    // Walking skip = 0, 10, 20, ... terminates.
    let mut skip = 0;
    let mut seen = std::collections::HashSet::new();
    loop {
        let page = run(&retriever, query("function"), 10, skip).await;
        for item in &page.items {
            assert!(seen.insert(item.id.clone()), "{} visited twice", item.id);
        }
        match page.next_skip(skip) {
            Some(next) => skip = next,
            None => break,
        }
    }
    assert!(seen.len() >= 25);
}

#[tokio::test]
async fn response_invariants_hold() {
    let service = seeded_service(25).await;
    let retriever = retriever(service, Arc::new(HashEmbedder));
    let page = run(&retriever, query("function handler"), 10, 0).await;

    assert!(page.items.len() <= 10);
    assert!(page.total >= page.items.len() as u64);
    // Sorted by descending relevance, ranks strictly increasing.
    for window in page.items.windows(2) {
        assert!(window[0].relevance >= window[1].relevance);
        assert!(window[0].rank < window[1].rank);
    }
    let mut locations = std::collections::HashSet::new();
    for item in &page.items {
        assert!(item.start_line >= 1);
        assert!(item.end_line >= item.start_line);
        assert!((0.0..=1.0).contains(&item.relevance));
        assert!(locations.insert(item.location_key()), "duplicate location");
    }
}

#[tokio::test]
async fn exact_term_filters_escape_quotes_and_apply() {
    let service = seeded_service(25).await;
    let retriever = retriever(service, Arc::new(HashEmbedder));

    // Without the exact term, "function" matches the whole corpus.
    let open = run(&retriever, query("function"), 10, 0).await;
    assert!(open.total >= 25);

    let mut q = query("function");
    q.exact_terms = vec!["foo') or 1 eq 1".to_string()];
    let shaped = QueryShaper::new().shape(&q).unwrap();

    let filter = shaped.filter.as_deref().unwrap();
    assert!(filter.contains("foo'')"), "quotes not doubled: {filter}");

    let page = retriever
        .search(&q, &shaped, &SearchContext::default())
        .await
        .unwrap();
    assert!(page.applied_exact_terms);
    // The injection attempt must not run as an unfiltered search.
    assert_eq!(page.items.len(), 0);
}

#[tokio::test]
async fn vector_outage_degrades_to_bm25_backend() {
    let service = seeded_service(10).await;
    let retriever = retriever(service, Arc::new(NullEmbeddingProvider::new()));

    let page = run(&retriever, query("function handler"), 5, 0).await;
    assert_eq!(page.backend, SearchBackend::Basic);
    assert!(!page.semantic_used);
    assert!(!page.items.is_empty());
}

#[tokio::test]
async fn hybrid_search_reports_enhanced_backend() {
    let service = seeded_service(10).await;
    let retriever = retriever(service, Arc::new(HashEmbedder));

    let page = run(&retriever, query("function handler"), 5, 0).await;
    assert_eq!(page.backend, SearchBackend::Enhanced);
}

#[tokio::test]
async fn cached_pages_are_marked_and_identical() {
    let service = seeded_service(10).await;
    let retriever = retriever(service, Arc::new(HashEmbedder));

    let first = run(&retriever, query("function"), 5, 0).await;
    assert!(!first.from_cache);

    let second = run(&retriever, query("function"), 5, 0).await;
    assert!(second.from_cache);
    let ids = |p: &mcs_domain::value_objects::SearchPage| {
        p.items.iter().map(|i| i.id.clone()).collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(first.query_id, second.query_id);
}

#[tokio::test]
async fn disable_cache_bypasses_the_cache() {
    let service = seeded_service(10).await;
    let retriever = retriever(service, Arc::new(HashEmbedder));

    let q = {
        let mut q = query("function");
        q.max_results = 5;
        q
    };
    let shaped = QueryShaper::new().shape(&q).unwrap();
    let context = SearchContext {
        disable_cache: true,
        ..SearchContext::default()
    };
    let first = retriever.search(&q, &shaped, &context).await.unwrap();
    let second = retriever.search(&q, &shaped, &context).await.unwrap();
    assert!(!first.from_cache);
    assert!(!second.from_cache);
}

#[tokio::test]
async fn bm25_only_skips_the_vector_stage() {
    let service = seeded_service(10).await;
    let retriever = retriever(service, Arc::new(HashEmbedder));

    let mut q = query("function handler");
    q.bm25_only = true;
    q.max_results = 5;
    let shaped = QueryShaper::new().shape(&q).unwrap();
    let page = retriever
        .search(&q, &shaped, &SearchContext::default())
        .await
        .unwrap();
    assert_eq!(page.backend, SearchBackend::Basic);
    assert_eq!(page.timings.vector_ms, 0);
}

#[tokio::test]
async fn missing_index_surfaces_as_error() {
    let service = Arc::new(InMemorySearchService::new());
    let retriever = retriever(service, Arc::new(HashEmbedder));
    let q = query("anything");
    let shaped = QueryShaper::new().shape(&q).unwrap();
    let err = retriever
        .search(&q, &shaped, &SearchContext::default())
        .await
        .unwrap_err();
    assert_eq!(err.code().as_str(), "not_found");
}
