//! Tool dispatch
//!
//! The single enforcement point for access rules: tier check, MFA check,
//! confirmation gate, argument validation and error-to-envelope
//! translation. Handlers below this point only see validated arguments and
//! a request-scoped context.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::Validate;

use mcs_domain::error::{Error, Result};
use mcs_domain::value_objects::{Principal, Tier};
use mcs_infrastructure::logging::audit_admin_tool;
use mcs_infrastructure::RequestContext;

use crate::envelope;
use crate::handlers;
use crate::init::AppState;

use super::registry::find_tool;

/// Dispatch one tool invocation and produce the response envelope.
///
/// In dev mode a synthetic admin principal replaces whatever the transport
/// extracted; admin capability is carried on the request context only.
pub async fn dispatch_tool(
    state: &Arc<AppState>,
    name: &str,
    args: Value,
    principal: Principal,
) -> Value {
    let principal = if state.config.server.dev_mode {
        Principal::dev()
    } else {
        principal
    };
    let ctx = RequestContext::new(
        principal,
        Duration::from_secs(state.config.search.timeout_secs),
    );

    let Some(spec) = find_tool(name) else {
        return envelope::err(&Error::not_found(format!("tool {name}")), &ctx.correlation_id);
    };

    if !ctx.principal.tier.meets(spec.tier) {
        return envelope::err(
            &Error::forbidden(format!(
                "insufficient permissions: {} requires the {} tier, caller has {}",
                spec.name,
                spec.tier,
                ctx.principal.tier
            )),
            &ctx.correlation_id,
        );
    }

    if spec.tier == Tier::Admin
        && state.config.auth.require_mfa_for_admin
        && !ctx.principal.mfa_verified
    {
        return envelope::err(
            &Error::forbidden("MFA verification required for admin operations"),
            &ctx.correlation_id,
        );
    }

    // First call without confirm performs no side effect.
    if spec.destructive && args.get("confirm").and_then(Value::as_bool) != Some(true) {
        return envelope::confirmation_required(spec.name, "to perform the operation");
    }

    let result = invoke(state, &ctx, spec.name, args).await;
    if spec.tier == Tier::Admin {
        audit_admin_tool(
            &ctx.principal.user_id,
            spec.name,
            &ctx.correlation_id,
            result.is_ok(),
        );
    }
    match result {
        Ok(data) => envelope::ok(data),
        Err(error) => envelope::err(&error, &ctx.correlation_id),
    }
}

/// Parse and validate tool arguments; unknown fields are rejected
fn parse<T: DeserializeOwned + Validate>(args: Value) -> Result<T> {
    let parsed: T = serde_json::from_value(args)
        .map_err(|e| Error::validation(format!("invalid arguments: {e}")))?;
    parsed
        .validate()
        .map_err(|e| Error::validation(e.to_string()))?;
    Ok(parsed)
}

async fn invoke(
    state: &Arc<AppState>,
    ctx: &RequestContext,
    name: &str,
    args: Value,
) -> Result<Value> {
    match name {
        // Search
        "search_code" => handlers::search::search_code(state, ctx, parse(args)?).await,
        "search_code_raw" => handlers::search::search_code_raw(state, ctx, parse(args)?).await,
        // Analysis
        "explain_ranking" => handlers::analysis::explain_ranking(state, ctx, parse(args)?).await,
        "preview_query_processing" => {
            handlers::analysis::preview_query_processing(state, parse(args)?)
        }
        "analyze_context" => handlers::analysis::analyze_context(state, parse(args)?).await,
        // Generation
        "generate_code" => handlers::generation::generate_code(state, parse(args)?).await,
        // Feedback
        "submit_feedback" => handlers::feedback::submit_feedback(state, parse(args)?).await,
        "track_search_click" => handlers::feedback::track_search_click(state, parse(args)?).await,
        "track_search_outcome" => {
            handlers::feedback::track_search_outcome(state, parse(args)?).await
        }
        // Cache
        "cache_stats" => {
            let _: crate::args::NoArgs = parse(args)?;
            handlers::cache::cache_stats(state).await
        }
        "cache_clear" => handlers::cache::cache_clear(state, parse(args)?).await,
        // Index administration
        "manage_index" => handlers::admin::manage_index(state, parse(args)?).await,
        "manage_documents" => handlers::admin::manage_documents(state, parse(args)?).await,
        "manage_indexer" => handlers::admin::manage_indexer(state, parse(args)?).await,
        "create_datasource" => handlers::admin::create_datasource(state, parse(args)?).await,
        "create_skillset" => handlers::admin::create_skillset(state, parse(args)?).await,
        "rebuild_index" => handlers::admin::rebuild_index(state, parse(args)?).await,
        "index_repository" => handlers::admin::index_repository(state, parse(args)?).await,
        "index_changed_files" => handlers::admin::index_changed_files(state, parse(args)?).await,
        "backfill_embeddings" => handlers::admin::backfill_embeddings(state, parse(args)?).await,
        "validate_embeddings" => handlers::admin::validate_embeddings(state, parse(args)?).await,
        "validate_index_schema" => {
            handlers::admin::validate_index_schema(state, parse(args)?).await
        }
        "backup_index_schema" => handlers::admin::backup_index_schema(state, parse(args)?).await,
        "clear_repository_documents" => {
            handlers::admin::clear_repository_documents(state, parse(args)?).await
        }
        "configure_semantic_search" => {
            handlers::admin::configure_semantic_search(state, parse(args)?).await
        }
        // Service management
        "health_check" => {
            let _: crate::args::NoArgs = parse(args)?;
            handlers::service::health_check(state).await
        }
        "index_status" => {
            let _: crate::args::NoArgs = parse(args)?;
            handlers::service::index_status(state).await
        }
        "get_service_info" => {
            let _: crate::args::NoArgs = parse(args)?;
            handlers::service::get_service_info(state)
        }
        other => Err(Error::not_found(format!("tool {other}"))),
    }
}
