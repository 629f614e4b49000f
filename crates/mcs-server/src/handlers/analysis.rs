//! Analysis tool handlers

use std::path::Path;

use serde_json::{json, Value};

use mcs_application::search::{ExplainMode, SearchContext};
use mcs_domain::error::Result;
use mcs_domain::value_objects::{DetailLevel, SearchQuery};
use mcs_infrastructure::RequestContext;

use crate::args::{AnalyzeContextArgs, ExplainRankingArgs, PreviewQueryArgs};
use crate::init::AppState;

/// `explain_ranking`: search, then explain every returned result
pub async fn explain_ranking(
    state: &AppState,
    _ctx: &RequestContext,
    args: ExplainRankingArgs,
) -> Result<Value> {
    let mode: ExplainMode = args.mode.parse()?;

    let mut query = SearchQuery::new(args.query.clone());
    query.intent = args.intent;
    query.language = args.language.clone();
    query.repository = args.repository.clone();
    query.max_results = args.max_results;
    query.detail_level = DetailLevel::Full;
    let shaped = state.shaper.shape(&query)?;

    let page = state
        .retriever
        .search(&query, &shaped, &SearchContext::default())
        .await?;
    let explanations = state.explainer.explain_all(&page.items, mode);

    Ok(json!({
        "mode": args.mode,
        "query": query.text,
        "query_id": page.query_id,
        "weights_version": state.weights.latest().version,
        "explanations": explanations,
    }))
}

/// `preview_query_processing`: show shaping without searching
pub fn preview_query_processing(state: &AppState, args: PreviewQueryArgs) -> Result<Value> {
    let mut query = SearchQuery::new(args.query.clone());
    query.intent = args.intent;
    query.language = args.language.clone();
    query.repository = args.repository.clone();
    let shaped = state.shaper.shape(&query)?;

    Ok(json!({
        "input_query": shaped.original,
        "sanitized_query": shaped.text,
        "detected_intent": shaped.intent,
        "intent_supplied": shaped.intent_supplied,
        "exact_terms": shaped.exact_terms,
        "rewritten_queries": shaped.rewrites,
        "filter": shaped.filter,
        "applied_rules": shaped.applied_rules,
    }))
}

/// `analyze_context`: file imports, definitions and related chunks
pub async fn analyze_context(state: &AppState, args: AnalyzeContextArgs) -> Result<Value> {
    let report = state
        .analyzer
        .analyze(
            Path::new(&args.file_path),
            args.include_dependencies,
            args.depth,
        )
        .await?;
    Ok(serde_json::to_value(report)?)
}
