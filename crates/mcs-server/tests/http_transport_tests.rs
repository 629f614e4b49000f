//! HTTP transport tests: endpoint auth, envelope normalization and the
//! tier-filtered tool listing, driven through the router without a socket.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use mcs_domain::value_objects::Tier;
use mcs_infrastructure::config::{ApiKeyEntry, AppConfig, FeedbackConfig};
use mcs_server::transport::http::router;
use mcs_server::ServerRuntime;

async fn runtime_with(configure: impl FnOnce(&mut AppConfig)) -> (ServerRuntime, tempfile::TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = AppConfig {
        feedback: FeedbackConfig {
            dir: tmp.path().join("feedback").display().to_string(),
            ..Default::default()
        },
        ..AppConfig::default()
    };
    configure(&mut config);
    let runtime = ServerRuntime::start(config).await.unwrap();
    (runtime, tmp)
}

fn app(runtime: &ServerRuntime) -> Router {
    router(runtime.state.clone())
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

fn post_json(path: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn health_is_unauthenticated() {
    let (mut runtime, _tmp) = runtime_with(|_| {}).await;
    let response = app(&runtime).oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["components"]["search_backend"], "in_memory");
    runtime.shutdown().await;
}

#[tokio::test]
async fn tool_calls_require_credentials() {
    let (mut runtime, _tmp) = runtime_with(|_| {}).await;
    let response = app(&runtime)
        .oneshot(post_json("/mcp/tool/search_code", None, json!({"query": "x"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["code"], "unauthorized");
    runtime.shutdown().await;
}

#[tokio::test]
async fn api_keys_authenticate_and_tier_limits_apply() {
    let (mut runtime, _tmp) = runtime_with(|config| {
        config.auth.api_keys = vec![ApiKeyEntry {
            key: "sk-dev".to_string(),
            name: "ci".to_string(),
            tier: Tier::Developer,
        }];
    })
    .await;

    // Developer key can search.
    let response = app(&runtime)
        .oneshot(post_json(
            "/mcp/tool/search_code",
            Some("sk-dev"),
            json!({"query": "anything at all"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], true);

    // ...but not administer the index.
    let response = app(&runtime)
        .oneshot(post_json(
            "/mcp/tool/rebuild_index",
            Some("sk-dev"),
            json!({"confirm": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["code"], "forbidden");
    runtime.shutdown().await;
}

#[tokio::test]
async fn tool_listing_is_tier_filtered() {
    let (mut runtime, _tmp) = runtime_with(|config| {
        config.auth.api_keys = vec![ApiKeyEntry {
            key: "sk-dev".to_string(),
            name: "ci".to_string(),
            tier: Tier::Developer,
        }];
    })
    .await;

    let response = app(&runtime)
        .oneshot(
            Request::builder()
                .uri("/mcp/tools")
                .header(header::AUTHORIZATION, "Bearer sk-dev")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["user_tier"], "developer");
    let names: Vec<&str> = body["data"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert!(names.contains(&"search_code"));
    assert!(names.contains(&"submit_feedback"));
    assert!(!names.contains(&"rebuild_index"));
    runtime.shutdown().await;
}

#[tokio::test]
async fn m2m_exchange_grants_service_access() {
    let (mut runtime, _tmp) = runtime_with(|config| {
        config.auth.jwt_secret = Some("signing-secret".to_string());
        config.auth.api_keys = vec![ApiKeyEntry {
            key: "svc-secret".to_string(),
            name: "pipeline".to_string(),
            tier: Tier::Service,
        }];
    })
    .await;

    let response = app(&runtime)
        .oneshot(post_json(
            "/auth/m2m/token",
            None,
            json!({"client_id": "pipeline", "client_secret": "svc-secret"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let token = body["data"]["access_token"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["token_type"], "Bearer");

    // The issued token reaches admin-tier tooling (service subsumes admin,
    // and the credential exchange itself is the second factor).
    let response = app(&runtime)
        .oneshot(post_json(
            "/mcp/tool/get_service_info",
            Some(&token),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], true);
    runtime.shutdown().await;
}

#[tokio::test]
async fn bad_m2m_credentials_are_rejected() {
    let (mut runtime, _tmp) = runtime_with(|config| {
        config.auth.jwt_secret = Some("signing-secret".to_string());
    })
    .await;
    let response = app(&runtime)
        .oneshot(post_json(
            "/auth/m2m/token",
            None,
            json!({"client_id": "ghost", "client_secret": "wrong"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    runtime.shutdown().await;
}

#[tokio::test]
async fn magic_link_without_provider_is_unavailable() {
    let (mut runtime, _tmp) = runtime_with(|_| {}).await;
    let response = app(&runtime)
        .oneshot(post_json(
            "/auth/login",
            None,
            json!({"email": "user@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["code"], "dependency_unavailable");
    runtime.shutdown().await;
}

#[tokio::test]
async fn dev_mode_opens_the_surface_locally() {
    let (mut runtime, _tmp) = runtime_with(|config| {
        config.server.dev_mode = true;
    })
    .await;
    let response = app(&runtime)
        .oneshot(post_json("/mcp/tool/get_service_info", None, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["dev_mode"], true);
    runtime.shutdown().await;
}

#[tokio::test]
async fn envelope_statuses_mirror_codes() {
    let (mut runtime, _tmp) = runtime_with(|config| {
        config.server.dev_mode = true;
    })
    .await;

    // Validation failure.
    let response = app(&runtime)
        .oneshot(post_json("/mcp/tool/search_code", None, json!({"query": ""})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown tool.
    let response = app(&runtime)
        .oneshot(post_json("/mcp/tool/nonexistent", None, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    runtime.shutdown().await;
}
