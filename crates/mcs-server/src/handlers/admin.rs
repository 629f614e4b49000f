//! Index administration tool handlers
//!
//! Action-based tools carry their own confirmation gates: destructive
//! actions without `confirm=true` return the confirmation envelope and
//! perform nothing.

use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use mcs_domain::error::{Error, Result};
use mcs_domain::ports::{DataSource, DocumentBatch, Skillset};
use mcs_domain::value_objects::{IndexSchema, SemanticConfiguration, SemanticFields};

use crate::args::*;
use crate::init::AppState;

/// The body of the confirmation-gate envelope for an action
fn needs_confirmation(tool: &str, action: &str) -> Value {
    json!({
        "confirmation_required": true,
        "message": format!("{tool} action '{action}' is destructive; call again with confirm=true"),
    })
}

/// `manage_index`: ensure / recreate / validate / list / delete
pub async fn manage_index(state: &AppState, args: ManageIndexArgs) -> Result<Value> {
    match args.action.as_str() {
        "ensure" | "create" => {
            let schema = required_schema(&args.index_definition)?;
            let report = state
                .automation
                .ensure_index(&schema, args.update_if_different)
                .await?;
            Ok(serde_json::to_value(report)?)
        }
        "recreate" => {
            if !args.confirm {
                return Ok(needs_confirmation("manage_index", "recreate"));
            }
            let schema = required_schema(&args.index_definition)?;
            let report = state
                .automation
                .recreate_index(&schema, args.backup_documents)
                .await?;
            Ok(serde_json::to_value(report)?)
        }
        "delete" => {
            if !args.confirm {
                return Ok(needs_confirmation("manage_index", "delete"));
            }
            let name = args
                .index_name
                .as_deref()
                .ok_or_else(|| Error::validation_field("index_name", "required for delete"))?;
            state.client.delete_index(name).await?;
            Ok(json!({ "deleted": true, "index": name }))
        }
        "validate" => {
            let name = args
                .index_name
                .clone()
                .unwrap_or_else(|| state.config.search.index_name.clone());
            let report = state.automation.validate_index_schema(&name, None).await?;
            Ok(serde_json::to_value(report)?)
        }
        "list" => {
            let indexes = state.client.list_indexes().await?;
            let mut summaries = Vec::new();
            for schema in indexes {
                let stats = state.client.get_index_stats(&schema.name).await.ok();
                summaries.push(json!({
                    "name": schema.name,
                    "fields": schema.fields.len(),
                    "document_count": stats.map(|s| s.document_count),
                }));
            }
            Ok(json!({ "indexes": summaries }))
        }
        other => Err(Error::validation_field(
            "action",
            format!("invalid action '{other}'"),
        )),
    }
}

fn required_schema(definition: &Option<Value>) -> Result<IndexSchema> {
    let value = definition
        .clone()
        .ok_or_else(|| Error::validation_field("index_definition", "required for this action"))?;
    serde_json::from_value(value)
        .map_err(|e| Error::validation_field("index_definition", format!("not a schema: {e}")))
}

/// `manage_documents`: upload / delete / cleanup / count
pub async fn manage_documents(state: &AppState, args: ManageDocumentsArgs) -> Result<Value> {
    match args.action.as_str() {
        "upload" => {
            let documents = args
                .documents
                .clone()
                .filter(|d| !d.is_empty())
                .ok_or_else(|| Error::validation_field("documents", "required for upload"))?;
            let batch = if args.merge {
                DocumentBatch::merge_or_upload(documents)
            } else {
                DocumentBatch::upload(documents)
            };
            let result = state.client.index_documents(&args.index_name, &batch).await?;
            Ok(serde_json::to_value(result)?)
        }
        "delete" => {
            if !args.confirm {
                return Ok(needs_confirmation("manage_documents", "delete"));
            }
            let keys = args
                .document_keys
                .clone()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| Error::validation_field("document_keys", "required for delete"))?;
            let result = state.client.delete_documents(&args.index_name, &keys).await?;
            Ok(serde_json::to_value(result)?)
        }
        "cleanup" => {
            if !args.dry_run && !args.confirm {
                return Ok(needs_confirmation("manage_documents", "cleanup"));
            }
            let days_old = args
                .days_old
                .ok_or_else(|| Error::validation_field("days_old", "required for cleanup"))?;
            let date_field = args
                .date_field
                .as_deref()
                .ok_or_else(|| Error::validation_field("date_field", "required for cleanup"))?;
            let report = state
                .automation
                .cleanup_old_documents(&args.index_name, date_field, days_old, args.dry_run)
                .await?;
            Ok(serde_json::to_value(report)?)
        }
        "count" => {
            let stats = state.client.get_index_stats(&args.index_name).await?;
            Ok(json!({
                "index": args.index_name,
                "document_count": stats.document_count,
            }))
        }
        other => Err(Error::validation_field(
            "action",
            format!("invalid action '{other}'"),
        )),
    }
}

/// `manage_indexer`: list / status / run / reset / create / delete
pub async fn manage_indexer(state: &AppState, args: ManageIndexerArgs) -> Result<Value> {
    let name_required = || {
        args.name
            .clone()
            .ok_or_else(|| Error::validation_field("name", "required for this action"))
    };
    match args.action.as_str() {
        "list" => {
            let indexers = state.client.list_indexers().await?;
            Ok(json!({ "indexers": indexers }))
        }
        "status" => {
            let status = state.client.get_indexer_status(&name_required()?).await?;
            Ok(serde_json::to_value(status)?)
        }
        "run" => {
            let name = name_required()?;
            state.client.run_indexer(&name).await?;
            Ok(json!({ "started": true, "indexer": name }))
        }
        "reset" => {
            let name = name_required()?;
            state.client.reset_indexer(&name).await?;
            Ok(json!({ "reset": true, "indexer": name }))
        }
        "create" => {
            let definition = args
                .definition
                .clone()
                .ok_or_else(|| Error::validation_field("definition", "required for create"))?;
            state.client.create_or_update_indexer(&definition).await?;
            Ok(json!({ "created": true }))
        }
        "delete" => {
            if !args.confirm {
                return Ok(needs_confirmation("manage_indexer", "delete"));
            }
            let name = name_required()?;
            state.client.delete_indexer(&name).await?;
            Ok(json!({ "deleted": true, "indexer": name }))
        }
        other => Err(Error::validation_field(
            "action",
            format!("invalid action '{other}'"),
        )),
    }
}

/// `create_datasource`
pub async fn create_datasource(state: &AppState, args: CreateDatasourceArgs) -> Result<Value> {
    let datasource = DataSource {
        name: args.name.clone(),
        source_type: args.source_type.clone(),
        connection_string: args.connection_string.clone(),
        container: args.container.clone(),
        description: args.description.clone(),
    };
    state.client.create_or_update_datasource(&datasource).await?;
    Ok(json!({ "created": true, "name": datasource.name }))
}

/// `create_skillset`
pub async fn create_skillset(state: &AppState, args: CreateSkillsetArgs) -> Result<Value> {
    let skillset = Skillset {
        name: args.name.clone(),
        description: args.description.clone(),
        skills: args.skills.clone(),
    };
    state.client.create_or_update_skillset(&skillset).await?;
    Ok(json!({ "created": true, "name": skillset.name, "skills": skillset.skills.len() }))
}

/// `rebuild_index`: drop and recreate from the canonical schema, then
/// optionally re-index a repository.
///
/// The registry-level confirmation gate has already passed when this runs.
pub async fn rebuild_index(state: &AppState, args: RebuildIndexArgs) -> Result<Value> {
    let schema = state.canonical_schema()?;
    let report = state.automation.recreate_index(&schema, args.backup).await?;

    let reindexed = match &args.repository {
        Some(path) => {
            let root = PathBuf::from(path);
            let name = repo_name_of(&root, None);
            let indexing = state.indexer.index_repository(&root, &name).await?;
            Some(serde_json::to_value(indexing)?)
        }
        None => None,
    };

    Ok(json!({
        "rebuilt": true,
        "index": schema.name,
        "backup": report,
        "reindexed": reindexed,
    }))
}

fn repo_name_of(root: &Path, explicit: Option<&str>) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| {
            root.file_name()
                .map(|n| n.to_string_lossy().to_string())
        })
        .unwrap_or_else(|| "repository".to_string())
}

/// `index_repository`
pub async fn index_repository(state: &AppState, args: IndexRepositoryArgs) -> Result<Value> {
    let root = PathBuf::from(&args.repo_path);
    let name = repo_name_of(&root, args.repo_name.as_deref());
    let report = state.indexer.index_repository(&root, &name).await?;
    Ok(serde_json::to_value(report)?)
}

/// `index_changed_files`
pub async fn index_changed_files(state: &AppState, args: IndexChangedFilesArgs) -> Result<Value> {
    let root = PathBuf::from(&args.repo_path);
    let name = repo_name_of(&root, args.repo_name.as_deref());
    let files: Vec<PathBuf> = args.files.iter().map(PathBuf::from).collect();
    let report = state.indexer.index_changed_files(&files, &root, &name).await?;
    Ok(serde_json::to_value(report)?)
}

/// `backfill_embeddings`
pub async fn backfill_embeddings(state: &AppState, args: BackfillEmbeddingsArgs) -> Result<Value> {
    let index = args
        .index_name
        .clone()
        .unwrap_or_else(|| state.config.search.index_name.clone());
    let report = state
        .automation
        .backfill_embeddings(
            &index,
            args.batch_size,
            args.include_context,
            args.max_docs,
            args.dry_run,
            args.cursor.clone(),
        )
        .await?;
    Ok(serde_json::to_value(report)?)
}

/// `validate_embeddings`
pub async fn validate_embeddings(state: &AppState, args: ValidateEmbeddingsArgs) -> Result<Value> {
    let index = args
        .index_name
        .clone()
        .unwrap_or_else(|| state.config.search.index_name.clone());
    let report = state
        .automation
        .validate_embeddings(&index, args.sample_size, state.config.embedding.dimensions)
        .await?;
    Ok(serde_json::to_value(report)?)
}

/// `validate_index_schema`
pub async fn validate_index_schema(
    state: &AppState,
    args: ValidateIndexSchemaArgs,
) -> Result<Value> {
    let index = args
        .index_name
        .clone()
        .unwrap_or_else(|| state.config.search.index_name.clone());
    let expected: Option<IndexSchema> = match args.expected {
        Some(value) => Some(
            serde_json::from_value(value)
                .map_err(|e| Error::validation_field("expected", format!("not a schema: {e}")))?,
        ),
        None => None,
    };
    let report = state
        .automation
        .validate_index_schema(&index, expected.as_ref())
        .await?;
    Ok(serde_json::to_value(report)?)
}

/// `backup_index_schema`
pub async fn backup_index_schema(state: &AppState, args: BackupIndexSchemaArgs) -> Result<Value> {
    let index = args
        .index_name
        .clone()
        .unwrap_or_else(|| state.config.search.index_name.clone());
    let path = state.automation.backup_index_schema(&index).await?;
    Ok(json!({ "backed_up": true, "index": index, "path": path }))
}

/// `clear_repository_documents`
///
/// The registry-level confirmation gate has already passed when this runs.
pub async fn clear_repository_documents(
    state: &AppState,
    args: ClearRepositoryDocumentsArgs,
) -> Result<Value> {
    let report = state
        .automation
        .clear_repository_documents(
            &state.config.search.index_name,
            &args.repository,
            args.dry_run,
        )
        .await?;
    Ok(serde_json::to_value(report)?)
}

/// `configure_semantic_search`: replace the semantic configuration on the
/// live index
pub async fn configure_semantic_search(
    state: &AppState,
    args: ConfigureSemanticSearchArgs,
) -> Result<Value> {
    let index = state.config.search.index_name.clone();
    let mut schema = state.client.get_index(&index).await?;
    schema.semantic_configurations = vec![SemanticConfiguration {
        name: args.configuration_name.clone(),
        prioritized_fields: SemanticFields {
            title_field: args.title_field.clone(),
            content_fields: args.content_fields.clone(),
            keywords_fields: args.keywords_fields.clone(),
        },
    }];
    state.client.create_or_update_index(&schema).await?;
    Ok(json!({
        "configured": true,
        "index": index,
        "configuration": args.configuration_name,
    }))
}
