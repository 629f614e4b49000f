//! Repository indexing worker
//!
//! Walks a repository honoring include globs and ignore rules, chunks each
//! file off the event loop, optionally embeds chunk batches and uploads
//! them through the search client. A bounded channel between the walker and
//! the uploader provides back-pressure; uploads run on a pool of bounded
//! size. Single-file failures are logged and counted, never fatal.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use mcs_domain::entities::CodeChunk;
use mcs_domain::error::{Error, Result};
use mcs_domain::ports::{CodeChunker, DocumentBatch, EmbeddingProvider, SearchServiceClient};
use mcs_infrastructure::config::IndexingConfig;

/// Errors kept in the report before truncation
const MAX_REPORTED_ERRORS: usize = 25;

/// Aggregate outcome of an indexing run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexingReport {
    /// Files considered by the walker
    pub files_seen: usize,
    /// Chunks accepted by the search service
    pub uploaded: usize,
    /// Chunks rejected or files that failed to read/chunk
    pub failed: usize,
    /// Files skipped by size, globs or limits
    pub skipped: usize,
    /// Chunks produced by the chunker
    pub chunks_created: usize,
    /// First errors encountered (truncated)
    pub errors: Vec<String>,
}

impl IndexingReport {
    fn record_error(&mut self, context: &str, path: &Path, error: impl std::fmt::Display) {
        if self.errors.len() < MAX_REPORTED_ERRORS {
            self.errors
                .push(format!("{context} {}: {error}", path.display()));
        }
    }
}

/// Repository indexing worker
pub struct IndexingWorker {
    client: Arc<dyn SearchServiceClient>,
    chunker: Arc<dyn CodeChunker>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: IndexingConfig,
    index_name: String,
}

impl IndexingWorker {
    /// Create a worker uploading into `index_name`
    pub fn new(
        client: Arc<dyn SearchServiceClient>,
        chunker: Arc<dyn CodeChunker>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: IndexingConfig,
        index_name: impl Into<String>,
    ) -> Self {
        Self {
            client,
            chunker,
            embedder,
            config,
            index_name: index_name.into(),
        }
    }

    /// Walk and index a repository
    pub async fn index_repository(&self, root: &Path, repository: &str) -> Result<IndexingReport> {
        let files = self.discover_files(root)?;
        info!(repository, files = files.len(), "indexing repository");
        self.index_files(&files, root, repository).await
    }

    /// Index an explicit list of changed files, skipping traversal
    pub async fn index_changed_files(
        &self,
        files: &[PathBuf],
        root: &Path,
        repository: &str,
    ) -> Result<IndexingReport> {
        let resolved: Vec<PathBuf> = files
            .iter()
            .map(|f| if f.is_absolute() { f.clone() } else { root.join(f) })
            .collect();
        self.index_files(&resolved, root, repository).await
    }

    /// Files eligible for indexing under `root`
    fn discover_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(Error::not_found(format!(
                "repository path {}",
                root.display()
            )));
        }
        let include = build_globset(&self.config.include_globs)?;
        let exclude = build_globset(&self.config.ignore_globs)?;
        let max_bytes = self.config.max_file_size_mb * 1024 * 1024;

        let mut files = Vec::new();
        for entry in ignore::WalkBuilder::new(root).hidden(true).build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(error = %e, "walker entry error");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            if let Some(include) = &include {
                if !include.is_match(relative) {
                    continue;
                }
            }
            if let Some(exclude) = &exclude {
                if exclude.is_match(relative) {
                    continue;
                }
            }
            if entry
                .metadata()
                .map(|m| m.len() > max_bytes)
                .unwrap_or(false)
            {
                continue;
            }
            files.push(path.to_path_buf());
            if self.config.max_files > 0 && files.len() >= self.config.max_files {
                break;
            }
        }
        Ok(files)
    }

    async fn index_files(
        &self,
        files: &[PathBuf],
        root: &Path,
        repository: &str,
    ) -> Result<IndexingReport> {
        let mut report = IndexingReport {
            files_seen: files.len(),
            ..IndexingReport::default()
        };

        // Bounded channel: the walker stalls when uploaders fall behind.
        let (tx, mut rx) = mpsc::channel::<Vec<CodeChunk>>(self.config.workers * 2);

        let walker = {
            let files = files.to_vec();
            let root = root.to_path_buf();
            let repository = repository.to_string();
            let chunker = Arc::clone(&self.chunker);
            let batch_size = self.config.batch_size;
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut batch: Vec<CodeChunk> = Vec::new();
                let mut outcome = WalkOutcome::default();
                for path in files {
                    let content = match tokio::fs::read_to_string(&path).await {
                        Ok(content) => content,
                        Err(e) => {
                            outcome.errors.push(format!("read {}: {e}", path.display()));
                            outcome.failed_files += 1;
                            continue;
                        }
                    };
                    let relative = path
                        .strip_prefix(&root)
                        .unwrap_or(&path)
                        .to_string_lossy()
                        .replace('\\', "/");
                    let chunker = Arc::clone(&chunker);
                    let repo = repository.clone();
                    let chunks = tokio::task::spawn_blocking(move || {
                        chunker.chunk(&content, &repo, &relative)
                    })
                    .await
                    .unwrap_or_default();

                    if chunks.is_empty() {
                        outcome.skipped_files += 1;
                        continue;
                    }
                    outcome.chunks += chunks.len();
                    batch.extend(chunks);
                    while batch.len() >= batch_size {
                        let rest = batch.split_off(batch_size);
                        let full = std::mem::replace(&mut batch, rest);
                        if tx.send(full).await.is_err() {
                            return outcome;
                        }
                    }
                }
                if !batch.is_empty() {
                    let _ = tx.send(batch).await;
                }
                outcome
            })
        };
        drop(tx);

        // Uploader pool of bounded size.
        let mut uploads: JoinSet<(usize, usize, Option<String>)> = JoinSet::new();
        while let Some(batch) = rx.recv().await {
            while uploads.len() >= self.config.workers {
                if let Some(Ok((ok, failed, error))) = uploads.join_next().await {
                    report.uploaded += ok;
                    report.failed += failed;
                    if let Some(error) = error {
                        if report.errors.len() < MAX_REPORTED_ERRORS {
                            report.errors.push(error);
                        }
                    }
                }
            }
            let client = Arc::clone(&self.client);
            let embedder = Arc::clone(&self.embedder);
            let index = self.index_name.clone();
            uploads.spawn(async move { upload_batch(client, embedder, &index, batch).await });
        }
        while let Some(joined) = uploads.join_next().await {
            if let Ok((ok, failed, error)) = joined {
                report.uploaded += ok;
                report.failed += failed;
                if let Some(error) = error {
                    if report.errors.len() < MAX_REPORTED_ERRORS {
                        report.errors.push(error);
                    }
                }
            }
        }

        if let Ok(outcome) = walker.await {
            report.failed += outcome.failed_files;
            report.skipped += outcome.skipped_files;
            report.chunks_created = outcome.chunks;
            for error in outcome.errors.into_iter().take(MAX_REPORTED_ERRORS) {
                if report.errors.len() < MAX_REPORTED_ERRORS {
                    report.errors.push(error);
                }
            }
        }

        info!(
            repository,
            uploaded = report.uploaded,
            failed = report.failed,
            skipped = report.skipped,
            "indexing finished"
        );
        Ok(report)
    }
}

#[derive(Default)]
struct WalkOutcome {
    failed_files: usize,
    skipped_files: usize,
    chunks: usize,
    errors: Vec<String>,
}

/// Embed (when enabled) and upload one chunk batch.
///
/// Returns `(succeeded, failed, first_error)`.
async fn upload_batch(
    client: Arc<dyn SearchServiceClient>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: &str,
    mut chunks: Vec<CodeChunk>,
) -> (usize, usize, Option<String>) {
    if embedder.is_enabled() {
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        match embedder.embed_batch(&texts).await {
            Ok(embeddings) if !embeddings.is_empty() => {
                for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
                    chunk.content_vector = embedding.map(|e| e.vector);
                }
            }
            Ok(_) => {}
            Err(e) => {
                // Vectors are optional; upload lexical-only chunks.
                warn!(error = %e, "batch embedding failed; uploading without vectors");
            }
        }
    }

    let documents: Vec<serde_json::Value> = chunks
        .iter()
        .filter_map(|c| serde_json::to_value(c).ok())
        .collect();
    let count = documents.len();
    match client
        .index_documents(index, &DocumentBatch::merge_or_upload(documents))
        .await
    {
        Ok(result) => {
            let error = result.errors.first().cloned();
            (result.succeeded, result.failed, error)
        }
        Err(e) => (0, count, Some(e.to_string())),
    }
}

fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| Error::validation_field("globs", format!("bad pattern {pattern}: {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map(Some)
        .map_err(|e| Error::validation_field("globs", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn globset_rejects_bad_patterns() {
        assert!(build_globset(&["[".to_string()]).is_err());
        assert!(build_globset(&[]).unwrap().is_none());
        let set = build_globset(&["**/*.rs".to_string()]).unwrap().unwrap();
        assert!(set.is_match("src/lib.rs"));
        assert!(!set.is_match("src/lib.py"));
    }

    #[test]
    fn report_truncates_errors() {
        let mut report = IndexingReport::default();
        for i in 0..100 {
            report.record_error("read", Path::new("x"), format!("error {i}"));
        }
        assert_eq!(report.errors.len(), MAX_REPORTED_ERRORS);
    }
}
