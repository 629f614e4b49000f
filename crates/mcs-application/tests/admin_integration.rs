//! Index automation and indexing worker tests against the in-memory
//! search service.

use std::sync::Arc;

use async_trait::async_trait;
use mcs_application::admin::{IndexAutomation, IndexingWorker};
use mcs_domain::entities::CodeChunk;
use mcs_domain::error::Result;
use mcs_domain::ports::{DocumentBatch, EmbeddingProvider, SearchServiceClient};
use mcs_domain::value_objects::{Embedding, FieldDefinition, IndexSchema};
use mcs_infrastructure::config::IndexingConfig;
use mcs_providers::chunking::ChunkingEngine;
use mcs_providers::embedding::NullEmbeddingProvider;
use mcs_providers::search::InMemorySearchService;

const INDEX: &str = "code-index";
const DIMS: usize = 4;

struct FixedEmbedder;

#[async_trait]
impl EmbeddingProvider for FixedEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Option<Embedding>>> {
        Ok(texts
            .iter()
            .map(|_| Some(Embedding::new(vec![0.5; DIMS], "fixed")))
            .collect())
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn provider_name(&self) -> &str {
        "fixed"
    }
}

fn schema() -> IndexSchema {
    let mut id = FieldDefinition::simple("id", "Edm.String");
    id.key = true;
    let mut vector = FieldDefinition::simple("content_vector", "Collection(Edm.Single)");
    vector.dimensions = Some(DIMS);
    IndexSchema {
        name: INDEX.to_string(),
        fields: vec![
            id,
            FieldDefinition::simple("repository", "Edm.String").filterable(),
            FieldDefinition::simple("file_path", "Edm.String").filterable(),
            FieldDefinition::simple("language", "Edm.String").filterable(),
            FieldDefinition::simple("start_line", "Edm.Int32"),
            FieldDefinition::simple("end_line", "Edm.Int32"),
            FieldDefinition::simple("content", "Edm.String").searchable(),
            FieldDefinition::simple("last_modified", "Edm.DateTimeOffset").filterable(),
            vector,
        ],
        vector_search: None,
        semantic_configurations: Vec::new(),
        scoring_profiles: Vec::new(),
    }
}

fn automation(
    service: Arc<InMemorySearchService>,
    embedder: Arc<dyn EmbeddingProvider>,
    dir: &std::path::Path,
) -> IndexAutomation {
    IndexAutomation::new(service, embedder, dir)
}

async fn seed_documents(service: &InMemorySearchService, count: usize, with_vectors: bool) {
    seed_documents_from(service, 0, count, with_vectors).await;
}

async fn seed_documents_from(
    service: &InMemorySearchService,
    start: usize,
    count: usize,
    with_vectors: bool,
) {
    let docs: Vec<serde_json::Value> = (start..start + count)
        .map(|i| {
            let mut chunk = CodeChunk::new(
                "backend",
                format!("src/file_{i:03}.rs"),
                1,
                20,
                format!("fn item_{i}() {{}}"),
                chrono::Utc::now(),
            );
            if with_vectors {
                chunk.content_vector = Some(vec![0.1; DIMS]);
            }
            serde_json::to_value(&chunk).unwrap()
        })
        .collect();
    service
        .index_documents(INDEX, &DocumentBatch::upload(docs))
        .await
        .unwrap();
}

#[tokio::test]
async fn ensure_index_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let service = Arc::new(InMemorySearchService::new());
    let automation = automation(service.clone(), Arc::new(NullEmbeddingProvider::new()), tmp.path());

    let first = automation.ensure_index(&schema(), true).await.unwrap();
    assert!(first.created);
    assert!(!first.updated);

    let second = automation.ensure_index(&schema(), true).await.unwrap();
    assert!(!second.created);
    assert!(!second.updated);
    assert!(!second.differs);

    // Round-trip: the live schema matches what we declared.
    let live = service.get_index(INDEX).await.unwrap();
    assert!(live.matches(&schema()));
}

#[tokio::test]
async fn ensure_index_updates_on_drift() {
    let tmp = tempfile::tempdir().unwrap();
    let service = Arc::new(InMemorySearchService::new());
    let automation = automation(service.clone(), Arc::new(NullEmbeddingProvider::new()), tmp.path());

    automation.ensure_index(&schema(), true).await.unwrap();

    let mut wider = schema();
    wider.fields.push(FieldDefinition::simple("tags", "Collection(Edm.String)"));
    let report = automation.ensure_index(&wider, true).await.unwrap();
    assert!(report.updated);
    assert!(report.differs);

    // Without permission to update, drift is only reported.
    let narrower = schema();
    let report = automation.ensure_index(&narrower, false).await.unwrap();
    assert!(!report.updated);
    assert!(report.differs);
}

#[tokio::test]
async fn recreate_index_backs_up_documents() {
    let tmp = tempfile::tempdir().unwrap();
    let service = Arc::new(InMemorySearchService::new());
    let automation = automation(service.clone(), Arc::new(NullEmbeddingProvider::new()), tmp.path());

    automation.ensure_index(&schema(), true).await.unwrap();
    seed_documents(&service, 7, false).await;

    let report = automation.recreate_index(&schema(), true).await.unwrap();
    assert_eq!(report.backed_up, Some(7));
    let backup_path = report.backup_path.unwrap();
    let backup = std::fs::read_to_string(&backup_path).unwrap();
    assert_eq!(backup.lines().count(), 7);

    // The new index starts empty.
    assert_eq!(service.document_count(INDEX).await, 0);
}

#[tokio::test]
async fn schema_validation_reports_missing_fields() {
    let tmp = tempfile::tempdir().unwrap();
    let service = Arc::new(InMemorySearchService::new());
    let automation = automation(service.clone(), Arc::new(NullEmbeddingProvider::new()), tmp.path());

    let report = automation.validate_index_schema(INDEX, None).await.unwrap();
    assert!(!report.exists);
    assert!(!report.valid);

    automation.ensure_index(&schema(), true).await.unwrap();
    let report = automation.validate_index_schema(INDEX, None).await.unwrap();
    assert!(report.exists);
    assert!(report.valid, "missing: {:?}", report.missing_fields);
    assert!(report.has_vector_config);
}

#[tokio::test]
async fn backfill_fills_only_missing_vectors() {
    let tmp = tempfile::tempdir().unwrap();
    let service = Arc::new(InMemorySearchService::new());
    let automation = automation(service.clone(), Arc::new(FixedEmbedder), tmp.path());

    automation.ensure_index(&schema(), true).await.unwrap();
    seed_documents_from(&service, 0, 10, false).await;
    seed_documents_from(&service, 10, 10, true).await;

    let report = automation
        .backfill_embeddings(INDEX, 4, false, None, false, None)
        .await
        .unwrap();
    assert!(report.complete);
    assert_eq!(report.failed, 0);
    assert_eq!(report.updated, 10);

    // Second run converges: nothing left to fill.
    let second = automation
        .backfill_embeddings(INDEX, 4, false, None, false, None)
        .await
        .unwrap();
    assert!(second.complete);
    assert_eq!(second.updated, 0);

    let validation = automation
        .validate_embeddings(INDEX, 100, DIMS)
        .await
        .unwrap();
    assert!(validation.coverage > 0.99, "coverage {}", validation.coverage);
    assert_eq!(validation.valid_dimension, validation.with_vector);
}

#[tokio::test]
async fn backfill_dry_run_changes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let service = Arc::new(InMemorySearchService::new());
    let automation = automation(service.clone(), Arc::new(FixedEmbedder), tmp.path());

    automation.ensure_index(&schema(), true).await.unwrap();
    seed_documents(&service, 5, false).await;

    let report = automation
        .backfill_embeddings(INDEX, 4, false, None, true, None)
        .await
        .unwrap();
    assert!(report.dry_run);
    assert_eq!(report.updated, 5);

    let validation = automation.validate_embeddings(INDEX, 100, DIMS).await.unwrap();
    assert_eq!(validation.with_vector, 0);
}

#[tokio::test]
async fn clear_repository_documents_removes_exactly_that_repository() {
    let tmp = tempfile::tempdir().unwrap();
    let service = Arc::new(InMemorySearchService::new());
    let automation = automation(service.clone(), Arc::new(NullEmbeddingProvider::new()), tmp.path());

    automation.ensure_index(&schema(), true).await.unwrap();
    seed_documents(&service, 5, false).await;
    let other = CodeChunk::new("frontend", "app/page.tsx", 1, 10, "const x = 1;", chrono::Utc::now());
    service
        .index_documents(
            INDEX,
            &DocumentBatch::upload(vec![serde_json::to_value(&other).unwrap()]),
        )
        .await
        .unwrap();

    let dry = automation
        .clear_repository_documents(INDEX, "backend", true)
        .await
        .unwrap();
    assert_eq!(dry.matched, 5);
    assert_eq!(dry.deleted, 0);
    assert_eq!(service.document_count(INDEX).await, 6);

    let real = automation
        .clear_repository_documents(INDEX, "backend", false)
        .await
        .unwrap();
    assert_eq!(real.deleted, 5);
    assert_eq!(service.document_count(INDEX).await, 1);
}

#[tokio::test]
async fn indexing_worker_uploads_repository_chunks() {
    let tmp = tempfile::tempdir().unwrap();
    let repo = tmp.path().join("repo");
    std::fs::create_dir_all(repo.join("src")).unwrap();
    std::fs::write(
        repo.join("src/lib.rs"),
        "/// Entry point of the library code.\npub fn run_service() -> u32 {\n    let value = compute_value();\n    value + 1\n}\n\nfn compute_value() -> u32 {\n    42\n}\n",
    )
    .unwrap();
    std::fs::write(
        repo.join("src/util.py"),
        "def helper_function(argument):\n    \"\"\"Return the doubled argument value.\"\"\"\n    return argument * 2\n",
    )
    .unwrap();
    std::fs::write(repo.join("notes.txt"), "plain text notes about the repo").unwrap();

    let service = Arc::new(InMemorySearchService::new());
    service
        .create_or_update_index(&schema())
        .await
        .unwrap();

    let worker = IndexingWorker::new(
        service.clone(),
        Arc::new(ChunkingEngine::new()),
        Arc::new(NullEmbeddingProvider::new()),
        IndexingConfig::default(),
        INDEX,
    );
    let report = worker.index_repository(&repo, "demo").await.unwrap();

    assert!(report.files_seen >= 3);
    assert!(report.uploaded >= 3, "uploaded {}", report.uploaded);
    assert_eq!(report.failed, 0, "errors: {:?}", report.errors);
    assert_eq!(service.document_count(INDEX).await, report.uploaded);
}

#[tokio::test]
async fn changed_files_path_skips_traversal() {
    let tmp = tempfile::tempdir().unwrap();
    let repo = tmp.path().join("repo");
    std::fs::create_dir_all(repo.join("src")).unwrap();
    std::fs::write(
        repo.join("src/changed.rs"),
        "pub fn changed_entry_point() -> &'static str {\n    \"updated body with enough length\"\n}\n",
    )
    .unwrap();
    std::fs::write(repo.join("src/untouched.rs"), "pub fn untouched() -> u8 {\n    7\n}\n").unwrap();

    let service = Arc::new(InMemorySearchService::new());
    service.create_or_update_index(&schema()).await.unwrap();

    let worker = IndexingWorker::new(
        service.clone(),
        Arc::new(ChunkingEngine::new()),
        Arc::new(NullEmbeddingProvider::new()),
        IndexingConfig::default(),
        INDEX,
    );
    let report = worker
        .index_changed_files(
            &[std::path::PathBuf::from("src/changed.rs")],
            &repo,
            "demo",
        )
        .await
        .unwrap();

    assert_eq!(report.files_seen, 1);
    assert!(report.uploaded >= 1);
    // The untouched file was never read.
    assert_eq!(service.document_count(INDEX).await, report.uploaded);
}
