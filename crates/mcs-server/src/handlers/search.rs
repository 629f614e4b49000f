//! Search tool handlers

use std::time::Instant;

use serde_json::{json, Value};

use mcs_application::search::SearchContext;
use mcs_domain::error::Result;
use mcs_domain::value_objects::SearchQuery;
use mcs_infrastructure::RequestContext;

use crate::args::{SearchCodeArgs, SearchCodeRawArgs};
use crate::formatter;
use crate::init::AppState;

fn query_from_args(args: &SearchCodeArgs) -> SearchQuery {
    let mut query = SearchQuery::new(args.query.clone());
    query.intent = args.intent;
    query.language = args.language.clone();
    query.repository = args.repository.clone();
    query.max_results = args.max_results;
    query.skip = args.skip;
    query.orderby = args.orderby.clone();
    query.detail_level = args.detail_level;
    query.bm25_only = args.bm25_only;
    query.include_dependencies = args.include_dependencies;
    query.snippet_lines = args.snippet_lines;
    if let Some(terms) = &args.exact_terms {
        query.exact_terms = terms.clone();
    }
    query
}

/// `search_code`: the full pipeline with formatted output
pub async fn search_code(
    state: &AppState,
    _ctx: &RequestContext,
    args: SearchCodeArgs,
) -> Result<Value> {
    let started = Instant::now();
    let query = query_from_args(&args);
    let shaped = state.shaper.shape(&query)?;
    let context = SearchContext {
        current_file: args.current_file.clone(),
        workspace_root: args.workspace_root.clone(),
        current_imports: Vec::new(),
        disable_cache: args.disable_cache,
    };

    let mut page = state.retriever.search(&query, &shaped, &context).await?;
    if !args.include_dependencies {
        for item in &mut page.items {
            item.dependencies.clear();
        }
    }
    let mut response = formatter::format_search_response(
        &query,
        &page,
        started.elapsed().as_millis() as u64,
        args.include_timings,
    );
    if args.disable_cache {
        response["cache_disabled"] = json!(true);
    }
    Ok(response)
}

/// `search_code_raw`: unformatted items for programmatic callers
pub async fn search_code_raw(
    state: &AppState,
    _ctx: &RequestContext,
    args: SearchCodeRawArgs,
) -> Result<Value> {
    let mut query = SearchQuery::new(args.query.clone());
    query.intent = args.intent;
    query.language = args.language.clone();
    query.repository = args.repository.clone();
    query.max_results = args.max_results;
    let shaped = state.shaper.shape(&query)?;

    let page = state
        .retriever
        .search(&query, &shaped, &SearchContext::default())
        .await?;
    Ok(json!({
        "results": page.items,
        "count": page.items.len(),
        "total": page.total,
        "query": query.text,
        "query_id": page.query_id,
        "intent": shaped.intent,
        "backend": page.backend.as_str(),
    }))
}
