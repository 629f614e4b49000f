//! HTTP + SSE transport
//!
//! REST surface over the same dispatcher as stdio:
//!
//! | Method | Path | Auth |
//! |--------|------|------|
//! | `GET`  | `/health` | none |
//! | `POST` | `/auth/login` | none |
//! | `GET`  | `/auth/callback` | none |
//! | `POST` | `/auth/verify-mfa` | bearer |
//! | `POST` | `/auth/m2m/token` | none |
//! | `GET`  | `/mcp/tools` | bearer |
//! | `POST` | `/mcp/tool/{name}` | bearer |
//! | `GET`  | `/mcp/sse` | bearer |
//!
//! Every error is normalized into the standard envelope; the HTTP status
//! mirrors the envelope code for REST ergonomics.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path as AxumPath, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use dashmap::DashMap;
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::info;

use mcs_domain::error::{Error, ErrorCode};
use mcs_domain::value_objects::Principal;

use crate::envelope;
use crate::handlers;
use crate::init::AppState;
use crate::tools::{dispatch_tool, tools_for_tier};

/// SSE keepalive interval
const SSE_KEEPALIVE: Duration = Duration::from_secs(30);

/// Per-user SSE queue depth
const SSE_QUEUE_DEPTH: usize = 64;

/// Shared state for the HTTP transport
#[derive(Clone)]
pub struct HttpState {
    app: Arc<AppState>,
    /// Per-user SSE event queues
    queues: Arc<DashMap<String, mpsc::Sender<Value>>>,
}

impl HttpState {
    /// Push an event to one user's SSE queue, when connected
    pub fn notify_user(&self, user_id: &str, event: Value) {
        if let Some(queue) = self.queues.get(user_id) {
            let _ = queue.try_send(event);
        }
    }
}

/// HTTP status mirroring an envelope code
fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::DependencyUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: &Error) -> (StatusCode, Json<Value>) {
    let body = envelope::err(error, &uuid::Uuid::new_v4().to_string());
    (status_for(error.code()), Json(body))
}

/// Bearer token from the Authorization header or `token` query parameter
fn bearer_token(headers: &HeaderMap, query_token: Option<&str>) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .or_else(|| query_token.map(str::to_string))
}

/// Resolve the caller's principal; dev mode short-circuits to the
/// synthetic admin
async fn authenticate(
    state: &HttpState,
    headers: &HeaderMap,
    query_token: Option<&str>,
) -> Result<Principal, Error> {
    if state.app.config.server.dev_mode {
        return Ok(Principal::dev());
    }
    let token = bearer_token(headers, query_token)
        .ok_or_else(|| Error::unauthorized("authentication required"))?;
    state.app.auth.validate_token(&token).await
}

/// Build the router
pub fn router(app: Arc<AppState>) -> Router {
    let state = HttpState {
        app,
        queues: Arc::new(DashMap::new()),
    };

    let cors = if state.app.config.server.allowed_origins.is_empty() {
        tower_http::cors::CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any)
    } else {
        let origins: Vec<axum::http::HeaderValue> = state
            .app
            .config
            .server
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        tower_http::cors::CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any)
    };

    Router::new()
        .route("/health", get(handle_health))
        .route("/auth/login", post(handle_login))
        .route("/auth/callback", get(handle_callback))
        .route("/auth/verify-mfa", post(handle_verify_mfa))
        .route("/auth/m2m/token", post(handle_m2m_token))
        .route("/mcp/tools", get(handle_list_tools))
        .route("/mcp/tool/{name}", post(handle_call_tool))
        .route("/mcp/sse", get(handle_sse))
        .layer(cors)
        .with_state(state)
}

/// Serve the HTTP transport until the process exits
pub async fn serve(app: Arc<AppState>) -> anyhow::Result<()> {
    let address = format!(
        "{}:{}",
        app.config.server.host, app.config.server.port
    );
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(address, "HTTP transport listening");
    axum::serve(listener, router(app)).await?;
    Ok(())
}

// ============ GET /health ============

async fn handle_health(State(state): State<HttpState>) -> impl IntoResponse {
    match handlers::service::health_check(&state.app).await {
        Ok(body) => (StatusCode::OK, Json(body)),
        Err(e) => error_response(&e),
    }
}

// ============ POST /auth/login ============

#[derive(Deserialize)]
struct LoginBody {
    email: String,
}

async fn handle_login(
    State(state): State<HttpState>,
    Json(body): Json<LoginBody>,
) -> impl IntoResponse {
    match state.app.auth.send_magic_link(&body.email).await {
        Ok(ticket) => (
            StatusCode::OK,
            Json(envelope::ok(json!({
                "sent": true,
                "email": ticket.email,
                "request_id": ticket.request_id,
            }))),
        ),
        Err(e) => error_response(&e),
    }
}

// ============ GET /auth/callback ============

#[derive(Deserialize)]
struct CallbackQuery {
    token: String,
}

async fn handle_callback(
    State(state): State<HttpState>,
    Query(query): Query<CallbackQuery>,
) -> impl IntoResponse {
    match state.app.auth.complete_authentication(&query.token).await {
        Ok(principal) => (
            StatusCode::OK,
            Json(envelope::ok(json!({
                "session_token": principal.session_id,
                "user_id": principal.user_id,
                "email": principal.email,
                "tier": principal.tier,
                "expires_at": principal.expires_at,
            }))),
        ),
        Err(e) => error_response(&e),
    }
}

// ============ POST /auth/verify-mfa ============

#[derive(Deserialize)]
struct VerifyMfaBody {
    user_id: String,
    totp_code: String,
}

async fn handle_verify_mfa(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Json(body): Json<VerifyMfaBody>,
) -> impl IntoResponse {
    let principal = match authenticate(&state, &headers, None).await {
        Ok(principal) => principal,
        Err(e) => return error_response(&e),
    };
    if principal.user_id != body.user_id {
        return error_response(&Error::forbidden("user mismatch"));
    }

    match state.app.auth.verify_totp(&body.user_id, &body.totp_code).await {
        Ok(true) => {
            if let Some(session_id) = &principal.session_id {
                let _ = state.app.sessions.set_mfa_verified(session_id).await;
            } else if let Some(token) = bearer_token(&headers, None) {
                let _ = state.app.sessions.set_mfa_verified(&token).await;
            }
            (
                StatusCode::OK,
                Json(envelope::ok(json!({ "verified": true }))),
            )
        }
        Ok(false) => error_response(&Error::unauthorized("invalid TOTP code")),
        Err(e) => error_response(&e),
    }
}

// ============ POST /auth/m2m/token ============

#[derive(Deserialize)]
struct M2mBody {
    client_id: String,
    client_secret: String,
}

async fn handle_m2m_token(
    State(state): State<HttpState>,
    Json(body): Json<M2mBody>,
) -> impl IntoResponse {
    match state
        .app
        .auth
        .issue_m2m_token(&body.client_id, &body.client_secret)
        .await
    {
        Ok(token) => (
            StatusCode::OK,
            Json(envelope::ok(json!({
                "access_token": token,
                "token_type": "Bearer",
                "expires_in": 3600,
            }))),
        ),
        Err(e) => error_response(&e),
    }
}

// ============ GET /mcp/tools ============

async fn handle_list_tools(
    State(state): State<HttpState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let principal = match authenticate(&state, &headers, None).await {
        Ok(principal) => principal,
        Err(e) => return error_response(&e),
    };

    let tools: Vec<Value> = tools_for_tier(principal.tier)
        .into_iter()
        .map(|spec| {
            json!({
                "name": spec.name,
                "description": spec.description,
                "tier": spec.tier,
                "inputSchema": serde_json::to_value(spec.schema()).unwrap_or(Value::Null),
            })
        })
        .collect();

    (
        StatusCode::OK,
        Json(envelope::ok(json!({
            "tools": tools,
            "user_tier": principal.tier,
            "total": tools.len(),
        }))),
    )
}

// ============ POST /mcp/tool/{name} ============

async fn handle_call_tool(
    State(state): State<HttpState>,
    AxumPath(name): AxumPath<String>,
    headers: HeaderMap,
    body: Option<Json<Value>>,
) -> impl IntoResponse {
    let principal = match authenticate(&state, &headers, None).await {
        Ok(principal) => principal,
        Err(e) => return error_response(&e),
    };
    let args = body.map(|Json(v)| v).unwrap_or_else(|| json!({}));

    let response = dispatch_tool(&state.app, &name, args, principal.clone()).await;

    // Long-running admin operations also announce completion on the
    // caller's event stream, when one is connected.
    if crate::tools::find_tool(&name)
        .is_some_and(|spec| spec.tier == mcs_domain::value_objects::Tier::Admin)
    {
        state.notify_user(
            &principal.user_id,
            json!({
                "type": "tool_completed",
                "data": { "tool": name, "ok": response["ok"] },
            }),
        );
    }

    let status = if response["ok"].as_bool().unwrap_or(false) {
        StatusCode::OK
    } else {
        response["code"]
            .as_str()
            .and_then(|code| match code {
                "validation" => Some(StatusCode::BAD_REQUEST),
                "unauthorized" => Some(StatusCode::UNAUTHORIZED),
                "forbidden" => Some(StatusCode::FORBIDDEN),
                "not_found" => Some(StatusCode::NOT_FOUND),
                "conflict" => Some(StatusCode::CONFLICT),
                "dependency_unavailable" => Some(StatusCode::SERVICE_UNAVAILABLE),
                "timeout" => Some(StatusCode::GATEWAY_TIMEOUT),
                _ => None,
            })
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    };
    (status, Json(response))
}

// ============ GET /mcp/sse ============

#[derive(Deserialize)]
struct SseQuery {
    token: Option<String>,
}

async fn handle_sse(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Query(query): Query<SseQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, Json<Value>)> {
    let principal = authenticate(&state, &headers, query.token.as_deref())
        .await
        .map_err(|e| error_response(&e))?;

    let (tx, mut rx) = mpsc::channel::<Value>(SSE_QUEUE_DEPTH);
    let user_id = principal.user_id.clone();
    state.queues.insert(user_id.clone(), tx);
    let queues = Arc::clone(&state.queues);

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("connected").data(
            json!({ "user_id": principal.user_id, "tier": principal.tier }).to_string(),
        ));

        loop {
            match tokio::time::timeout(SSE_KEEPALIVE, rx.recv()).await {
                Ok(Some(event)) => {
                    let kind = event
                        .get("type")
                        .and_then(Value::as_str)
                        .unwrap_or("message")
                        .to_string();
                    let data = event.get("data").cloned().unwrap_or(event);
                    yield Ok(Event::default().event(kind).data(data.to_string()));
                }
                // Sender dropped: disconnect cleanly.
                Ok(None) => break,
                // Quiet interval: keepalive ping.
                Err(_) => {
                    yield Ok(Event::default().event("ping").data(
                        json!({ "timestamp": chrono::Utc::now().to_rfc3339() }).to_string(),
                    ));
                }
            }
        }
        queues.remove(&user_id);
    };

    Ok(Sse::new(stream))
}
