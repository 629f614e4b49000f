//! Service wiring
//!
//! Builds every component from configuration with explicit factories and
//! owns the background-task lifecycles (feedback writer, aggregator).
//! Construction never spawns tasks; `start` does.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use mcs_application::admin::{IndexAutomation, IndexingWorker};
use mcs_application::analysis::ContextAnalyzer;
use mcs_application::feedback::{FeedbackAggregator, FeedbackRecorder, FeedbackStore, WeightsPublisher};
use mcs_application::generation::CodeGenerator;
use mcs_application::query::QueryShaper;
use mcs_application::search::{ContextualRanker, HybridRetriever, ResultExplainer, RetrieverConfig};
use mcs_domain::error::Result;
use mcs_domain::ports::{
    AuthProvider, CacheProvider, CodeChunker, EmbeddingProvider, SearchServiceClient, SessionStore,
    WeightsSource,
};
use mcs_domain::value_objects::IndexSchema;
use mcs_infrastructure::auth::{AuthService, InMemorySessionStore};
use mcs_infrastructure::config::AppConfig;
use mcs_providers::cache::TtlLruCache;
use mcs_providers::chunking::ChunkingEngine;
use mcs_providers::embedding::LazyEmbeddingProvider;
use mcs_providers::search::{ClientPool, InMemorySearchService, RestSearchClient};

/// The canonical index schema, versioned in source
pub const CANONICAL_SCHEMA_JSON: &str = include_str!("../../../schema/code-index.json");

/// Freshness half-life used by the contextual ranker
const FRESHNESS_HALF_LIFE_DAYS: f64 = 30.0;

/// Where backups and staged exports land
const BACKUP_DIR: &str = "data/backups";

/// Everything the tool handlers need, wired once at startup
pub struct AppState {
    /// Immutable configuration
    pub config: AppConfig,
    /// Query shaping service
    pub shaper: QueryShaper,
    /// Hybrid retriever
    pub retriever: HybridRetriever,
    /// Ranking explainer
    pub explainer: ResultExplainer,
    /// Shared query cache
    pub cache: Arc<dyn CacheProvider>,
    /// Search service client
    pub client: Arc<dyn SearchServiceClient>,
    /// Embedding provider
    pub embedder: Arc<dyn EmbeddingProvider>,
    /// Feedback recorder
    pub feedback: FeedbackRecorder,
    /// Adaptive weights reader
    pub weights: Arc<dyn WeightsSource>,
    /// Index lifecycle automation
    pub automation: IndexAutomation,
    /// Repository indexing worker
    pub indexer: IndexingWorker,
    /// Retrieval-grounded generator
    pub generator: CodeGenerator,
    /// File context analyzer
    pub analyzer: ContextAnalyzer,
    /// Authentication service
    pub auth: Arc<dyn AuthProvider>,
    /// Session store
    pub sessions: Arc<dyn SessionStore>,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Parse the canonical schema, with the configured index name applied
    pub fn canonical_schema(&self) -> Result<IndexSchema> {
        let mut schema: IndexSchema = serde_json::from_str(CANONICAL_SCHEMA_JSON)?;
        schema.name = self.config.search.index_name.clone();
        Ok(schema)
    }
}

/// Built server with background-task lifecycles
pub struct ServerRuntime {
    /// Shared handler state
    pub state: Arc<AppState>,
    feedback_store: FeedbackStore,
    aggregator: FeedbackAggregator,
}

impl ServerRuntime {
    /// Wire every component and start the background tasks.
    ///
    /// With no `search.endpoint` configured the in-memory search service
    /// backs the process (local development and tests); the canonical index
    /// is created in it so searches work immediately.
    pub async fn start(config: AppConfig) -> Result<Self> {
        let mut feedback_store = FeedbackStore::new(&config.feedback.dir);
        feedback_store.start()?;
        let feedback = feedback_store.recorder()?;

        let publisher = Arc::new(WeightsPublisher::new());
        let mut aggregator = FeedbackAggregator::new(
            &config.feedback.dir,
            config.feedback.window_days,
            Duration::from_secs(config.feedback.aggregation_interval_secs),
            Arc::clone(&publisher),
        );
        aggregator.start();

        // Admin client writes; the read client uses the query key when one
        // is provisioned. Both come from the process-wide pool, and the
        // in-memory backend serves both roles in local development.
        let (client, read_client): (Arc<dyn SearchServiceClient>, Arc<dyn SearchServiceClient>) =
            if config.search.endpoint.is_empty() {
                info!("no search endpoint configured; using the in-memory backend");
                let service = Arc::new(InMemorySearchService::new());
                let mut schema: IndexSchema = serde_json::from_str(CANONICAL_SCHEMA_JSON)?;
                schema.name = config.search.index_name.clone();
                service.create_or_update_index(&schema).await?;
                let shared: Arc<dyn SearchServiceClient> = service;
                (Arc::clone(&shared), shared)
            } else {
                let pool = ClientPool::new();
                let timeout = Duration::from_secs(config.search.timeout_secs);
                let admin: Arc<RestSearchClient> = pool.get_or_create(
                    &config.search.endpoint,
                    &config.search.admin_key,
                    &config.search.index_name,
                    &config.search.api_version,
                    timeout,
                );
                let query_key = config
                    .search
                    .query_key
                    .clone()
                    .unwrap_or_else(|| config.search.admin_key.clone());
                let read: Arc<RestSearchClient> = pool.get_or_create(
                    &config.search.endpoint,
                    &query_key,
                    &config.search.index_name,
                    &config.search.api_version,
                    timeout,
                );
                (admin as Arc<dyn SearchServiceClient>, read as Arc<dyn SearchServiceClient>)
            };

        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::new(LazyEmbeddingProvider::new(config.embedding.clone()));
        let cache: Arc<dyn CacheProvider> = Arc::new(TtlLruCache::new(
            Duration::from_secs(config.cache.ttl_seconds),
            config.cache.max_entries,
        ));
        let chunker: Arc<dyn CodeChunker> = Arc::new(ChunkingEngine::new());

        let ranker = ContextualRanker::new(
            Arc::clone(&publisher) as Arc<dyn WeightsSource>,
            FRESHNESS_HALF_LIFE_DAYS,
        );
        let retriever = HybridRetriever::new(
            Arc::clone(&read_client),
            Arc::clone(&embedder),
            Arc::clone(&cache),
            ranker,
            RetrieverConfig {
                index_name: config.search.index_name.clone(),
                vector_field: "content_vector".to_string(),
                semantic_configuration: config.search.semantic_configuration.clone(),
                timeout: Duration::from_secs(config.search.timeout_secs),
                cache_enabled: config.cache.enabled,
                debug_timings: config.logging.debug_timings,
            },
        );

        let automation = IndexAutomation::new(Arc::clone(&client), Arc::clone(&embedder), BACKUP_DIR);
        let indexer = IndexingWorker::new(
            Arc::clone(&client),
            Arc::clone(&chunker),
            Arc::clone(&embedder),
            config.indexing.clone(),
            config.search.index_name.clone(),
        );
        let generator =
            CodeGenerator::new(Arc::clone(&read_client), config.search.index_name.clone());
        let analyzer = ContextAnalyzer::new(
            Arc::clone(&chunker),
            Arc::clone(&read_client),
            config.search.index_name.clone(),
        );

        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        let auth: Arc<dyn AuthProvider> =
            Arc::new(AuthService::new(config.auth.clone(), Arc::clone(&sessions)));

        let state = Arc::new(AppState {
            config,
            shaper: QueryShaper::new(),
            retriever,
            explainer: ResultExplainer::new(),
            cache,
            client,
            embedder,
            feedback,
            weights: publisher,
            automation,
            indexer,
            generator,
            analyzer,
            auth,
            sessions,
            started_at: Instant::now(),
        });

        Ok(Self {
            state,
            feedback_store,
            aggregator,
        })
    }

    /// Force one aggregation pass outside the periodic schedule.
    ///
    /// Operational hook: lets admins (and tests) fold freshly recorded
    /// feedback into the weights snapshot immediately.
    pub async fn run_aggregation_once(&self) -> mcs_domain::value_objects::WeightsSnapshot {
        self.aggregator.run_once().await
    }

    /// Stop background tasks deterministically
    pub async fn shutdown(&mut self) {
        self.aggregator.stop().await;
        self.feedback_store.stop().await;
        info!("server runtime stopped");
    }
}
