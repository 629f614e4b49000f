//! Dispatcher tests: authorization matrix, confirmation gate, envelope
//! shape and end-to-end tool behavior over the in-memory backend.

use std::sync::Arc;

use serde_json::{json, Value};

use mcs_domain::value_objects::{Principal, Tier};
use mcs_infrastructure::config::{AppConfig, FeedbackConfig};
use mcs_server::tools::dispatch_tool;
use mcs_server::ServerRuntime;

fn principal(tier: Tier, mfa: bool) -> Principal {
    Principal {
        user_id: format!("{tier}-user"),
        email: format!("{tier}@corp.example"),
        tier,
        mfa_verified: mfa,
        expires_at: None,
        session_id: None,
    }
}

fn admin() -> Principal {
    principal(Tier::Admin, true)
}

async fn runtime(dev_mode: bool) -> (ServerRuntime, tempfile::TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = AppConfig {
        feedback: FeedbackConfig {
            dir: tmp.path().join("feedback").display().to_string(),
            ..Default::default()
        },
        ..AppConfig::default()
    };
    config.server.dev_mode = dev_mode;
    let runtime = ServerRuntime::start(config).await.unwrap();
    (runtime, tmp)
}

async fn call(runtime: &ServerRuntime, tool: &str, args: Value, principal: Principal) -> Value {
    dispatch_tool(&runtime.state, tool, args, principal).await
}

/// Upload a few chunks through the admin tool surface
async fn seed_corpus(runtime: &ServerRuntime, count: usize) {
    let documents: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "id": format!("doc-{i:03}"),
                "repository": "backend",
                "file_path": format!("src/mod_{i}.rs"),
                "language": "rust",
                "start_line": 1,
                "end_line": 20,
                "content": format!("fn handler_{i}() {{ /* function body */ }}"),
                "function_name": format!("handler_{i}"),
                "last_modified": chrono::Utc::now().to_rfc3339(),
            })
        })
        .collect();
    let response = call(
        runtime,
        "manage_documents",
        json!({ "action": "upload", "index_name": "code-index", "documents": documents }),
        admin(),
    )
    .await;
    assert_eq!(response["ok"], true, "seed failed: {response}");
}

#[tokio::test]
async fn empty_query_returns_validation_envelope() {
    let (mut runtime, _tmp) = runtime(false).await;
    for query in ["", "   "] {
        let response = call(
            &runtime,
            "search_code",
            json!({ "query": query }),
            principal(Tier::Public, false),
        )
        .await;
        assert_eq!(response["ok"], false);
        assert_eq!(response["code"], "validation");
        assert!(response["correlation_id"].is_string());
    }
    // Missing query entirely is also a validation failure.
    let response = call(
        &runtime,
        "search_code",
        json!({}),
        principal(Tier::Public, false),
    )
    .await;
    assert_eq!(response["code"], "validation");
    runtime.shutdown().await;
}

#[tokio::test]
async fn search_pagination_contract() {
    let (mut runtime, _tmp) = runtime(false).await;
    seed_corpus(&runtime, 25).await;

    let first = call(
        &runtime,
        "search_code",
        json!({ "query": "function", "max_results": 10, "skip": 0 }),
        principal(Tier::Public, false),
    )
    .await;
    assert_eq!(first["ok"], true, "search failed: {first}");
    let data = &first["data"];
    assert_eq!(data["count"], 10);
    assert!(data["total"].as_u64().unwrap() >= 25);
    assert_eq!(data["has_more"], true);
    assert_eq!(data["next_skip"], 10);

    let second = call(
        &runtime,
        "search_code",
        json!({ "query": "function", "max_results": 10, "skip": 10 }),
        principal(Tier::Public, false),
    )
    .await;
    let second_items = second["data"]["items"].as_array().unwrap();
    assert_eq!(second_items.len(), 10);

    let first_ids: Vec<&str> = first["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|i| i["id"].as_str())
        .collect();
    for item in second_items {
        assert!(!first_ids.contains(&item["id"].as_str().unwrap()));
    }
    runtime.shutdown().await;
}

#[tokio::test]
async fn tier_matrix_is_enforced() {
    let (mut runtime, _tmp) = runtime(false).await;

    // Public caller cannot use developer tools.
    let response = call(
        &runtime,
        "track_search_click",
        json!({ "query_id": "q", "doc_id": "d", "rank": 1 }),
        principal(Tier::Public, false),
    )
    .await;
    assert_eq!(response["ok"], false);
    assert_eq!(response["code"], "forbidden");

    // Developer caller cannot use admin tools.
    let response = call(
        &runtime,
        "rebuild_index",
        json!({ "confirm": true }),
        principal(Tier::Developer, false),
    )
    .await;
    assert_eq!(response["code"], "forbidden");

    // Admin without MFA is rejected when MFA is required.
    let response = call(
        &runtime,
        "get_service_info",
        json!({}),
        principal(Tier::Admin, false),
    )
    .await;
    assert_eq!(response["code"], "forbidden");
    assert!(response["error"].as_str().unwrap().contains("MFA"));

    // Admin with MFA passes.
    let response = call(&runtime, "get_service_info", json!({}), admin()).await;
    assert_eq!(response["ok"], true);

    // Service tier subsumes admin.
    let response = call(
        &runtime,
        "get_service_info",
        json!({}),
        principal(Tier::Service, true),
    )
    .await;
    assert_eq!(response["ok"], true);
    runtime.shutdown().await;
}

#[tokio::test]
async fn destructive_tools_are_confirmation_gated() {
    let (mut runtime, _tmp) = runtime(false).await;
    seed_corpus(&runtime, 5).await;

    // First call without confirm: successful envelope, no side effect.
    let response = call(&runtime, "rebuild_index", json!({}), admin()).await;
    assert_eq!(response["ok"], true);
    assert_eq!(response["data"]["confirmation_required"], true);

    let status = call(&runtime, "index_status", json!({}), admin()).await;
    assert_eq!(status["data"]["document_count"], 5, "side effect leaked");

    // Confirmed call performs the rebuild.
    let response = call(&runtime, "rebuild_index", json!({ "confirm": true }), admin()).await;
    assert_eq!(response["ok"], true, "rebuild failed: {response}");
    assert_eq!(response["data"]["rebuilt"], true);

    let status = call(&runtime, "index_status", json!({}), admin()).await;
    assert_eq!(status["data"]["document_count"], 0);
    runtime.shutdown().await;
}

#[tokio::test]
async fn action_level_confirmation_gates() {
    let (mut runtime, _tmp) = runtime(false).await;
    seed_corpus(&runtime, 3).await;

    let response = call(
        &runtime,
        "manage_documents",
        json!({ "action": "delete", "index_name": "code-index", "document_keys": ["doc-000"] }),
        admin(),
    )
    .await;
    assert_eq!(response["data"]["confirmation_required"], true);

    let response = call(
        &runtime,
        "manage_documents",
        json!({
            "action": "delete",
            "index_name": "code-index",
            "document_keys": ["doc-000"],
            "confirm": true,
        }),
        admin(),
    )
    .await;
    assert_eq!(response["ok"], true);
    assert_eq!(response["data"]["succeeded"], 1);
    runtime.shutdown().await;
}

#[tokio::test]
async fn unknown_tool_and_unknown_fields() {
    let (mut runtime, _tmp) = runtime(false).await;

    let response = call(&runtime, "drop_all_tables", json!({}), admin()).await;
    assert_eq!(response["code"], "not_found");

    let response = call(
        &runtime,
        "search_code",
        json!({ "query": "x", "unexpected_field": 1 }),
        principal(Tier::Public, false),
    )
    .await;
    assert_eq!(response["code"], "validation");
    runtime.shutdown().await;
}

#[tokio::test]
async fn dev_mode_substitutes_a_synthetic_admin() {
    let (mut runtime, _tmp) = runtime(true).await;

    // An anonymous principal reaches admin tools in dev mode.
    let response = call(
        &runtime,
        "get_service_info",
        json!({}),
        Principal::anonymous(),
    )
    .await;
    assert_eq!(response["ok"], true);
    assert_eq!(response["data"]["dev_mode"], true);
    runtime.shutdown().await;
}

#[tokio::test]
async fn vector_down_search_degrades_to_basic_backend() {
    // Default config has no embedding API key: the provider is disabled.
    let (mut runtime, _tmp) = runtime(false).await;
    seed_corpus(&runtime, 5).await;

    let response = call(
        &runtime,
        "search_code",
        json!({ "query": "authentication middleware function" }),
        principal(Tier::Public, false),
    )
    .await;
    assert_eq!(response["ok"], true);
    assert_eq!(response["data"]["backend"], "basic");
    assert_eq!(response["data"]["semantic_used"], false);
    runtime.shutdown().await;
}

#[tokio::test]
async fn feedback_influences_subsequent_ranking() {
    let (mut runtime, _tmp) = runtime(false).await;

    // Two equally matching docs; one is a named function, one is plain.
    let documents = json!([
        {
            "id": "plain-doc",
            "repository": "backend",
            "file_path": "src/notes.rs",
            "language": "rust",
            "start_line": 1,
            "end_line": 10,
            "content": "telemetry pipeline overview text",
        },
        {
            "id": "func-doc",
            "repository": "backend",
            "file_path": "src/pipeline.rs",
            "language": "rust",
            "start_line": 1,
            "end_line": 10,
            "content": "telemetry pipeline overview text",
            "function_name": "telemetry_pipeline",
        },
    ]);
    let seeded = call(
        &runtime,
        "manage_documents",
        json!({ "action": "upload", "index_name": "code-index", "documents": documents }),
        admin(),
    )
    .await;
    assert_eq!(seeded["ok"], true);

    let search_args = json!({
        "query": "telemetry pipeline",
        "intent": "understand",
        "disable_cache": true,
    });

    // Users consistently click the function result and report success.
    for i in 0..100 {
        let response = call(
            &runtime,
            "track_search_click",
            json!({
                "query_id": format!("q-{i}"),
                "doc_id": "func-doc",
                "rank": 2,
                "intent": "understand",
                "context": { "field": "function_name" },
            }),
            principal(Tier::Developer, false),
        )
        .await;
        assert_eq!(response["ok"], true);
    }
    let response = call(
        &runtime,
        "track_search_outcome",
        json!({ "query_id": "q-0", "outcome": "success", "intent": "understand" }),
        principal(Tier::Developer, false),
    )
    .await;
    assert_eq!(response["ok"], true);

    let snapshot = runtime.run_aggregation_once().await;
    assert!(snapshot.version >= 1);

    let after = call(
        &runtime,
        "search_code",
        search_args,
        principal(Tier::Public, false),
    )
    .await;
    let items = after["data"]["items"].as_array().unwrap();
    let relevance_of = |id: &str| {
        items
            .iter()
            .find(|i| i["id"] == id)
            .and_then(|i| i["relevance"].as_f64())
            .unwrap()
    };
    assert!(
        relevance_of("func-doc") > relevance_of("plain-doc"),
        "adaptive weights must rank the clicked shape higher: {items:?}"
    );
    assert_eq!(items[0]["id"], "func-doc");
    runtime.shutdown().await;
}

#[tokio::test]
async fn explain_ranking_returns_factors() {
    let (mut runtime, _tmp) = runtime(false).await;
    seed_corpus(&runtime, 5).await;

    let response = call(
        &runtime,
        "explain_ranking",
        json!({ "query": "function handler", "mode": "enhanced", "max_results": 3 }),
        principal(Tier::Public, false),
    )
    .await;
    assert_eq!(response["ok"], true);
    let explanations = response["data"]["explanations"].as_array().unwrap();
    assert!(!explanations.is_empty());
    assert!(explanations[0]["factors"].as_array().is_some());
    runtime.shutdown().await;
}

#[tokio::test]
async fn preview_query_processing_reports_shaping() {
    let (mut runtime, _tmp) = runtime(false).await;
    let response = call(
        &runtime,
        "preview_query_processing",
        json!({ "query": "fix crash in getUserName(" }),
        principal(Tier::Public, false),
    )
    .await;
    assert_eq!(response["ok"], true);
    let data = &response["data"];
    assert_eq!(data["detected_intent"], "debug");
    assert!(data["exact_terms"]
        .as_array()
        .unwrap()
        .iter()
        .any(|t| t == "getUserName"));
    assert!(data["rewritten_queries"].as_array().unwrap().len() >= 2);
    runtime.shutdown().await;
}

#[tokio::test]
async fn cache_tools_round_trip() {
    let (mut runtime, _tmp) = runtime(false).await;
    seed_corpus(&runtime, 3).await;

    // Populate the cache with a search.
    call(
        &runtime,
        "search_code",
        json!({ "query": "function" }),
        principal(Tier::Public, false),
    )
    .await;

    let stats = call(&runtime, "cache_stats", json!({}), principal(Tier::Public, false)).await;
    assert_eq!(stats["ok"], true);
    assert!(stats["data"]["cache_stats"]["total_entries"].as_u64().unwrap() >= 1);

    let cleared = call(
        &runtime,
        "cache_clear",
        json!({ "scope": "search" }),
        admin(),
    )
    .await;
    assert_eq!(cleared["ok"], true);
    assert!(cleared["data"]["entries_removed"].as_u64().unwrap() >= 1);

    let bad_scope = call(
        &runtime,
        "cache_clear",
        json!({ "scope": "everything" }),
        admin(),
    )
    .await;
    assert_eq!(bad_scope["code"], "validation");
    runtime.shutdown().await;
}
