//! The relay's HTTP surface.
//!
//! One axum router serves the chat gateway, chat/message CRUD, the
//! client-bootstrap key endpoint, and the token-gated admin API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/chat` | Run one chat turn against a provider |
//! | `GET`  | `/api/chats` | List chats, newest first |
//! | `POST` | `/api/chats` | Create a chat |
//! | `DELETE` | `/api/chats/{id}` | Delete a chat and its messages |
//! | `GET`  | `/api/chats/{id}/messages` | List a chat's messages, oldest first |
//! | `GET`  | `/api/config/keys` | Provider credentials for browser clients |
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/api/admin/rate-limit` | Current global rate limit |
//! | `PUT`  | `/api/admin/rate-limit` | Replace the global rate limit |
//! | `GET`  | `/api/admin/stats` | Aggregate counters |
//! | `POST` | `/api/admin/clear` | Drop all stored chats and messages |
//! | `POST` | `/api/admin/broadcast` | Accept a broadcast (no delivery channel yet) |
//!
//! # Error Contract
//!
//! All error responses are JSON:
//!
//! ```json
//! { "error": "chat not found: abc123" }
//! ```
//!
//! with an optional `details` object (vendor status and body for failed
//! provider calls). Statuses: 400 invalid request, 401 unauthorized,
//! 404 not found, 429 rate limited, 500 internal/provider failure,
//! 502 provider unreachable.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted: the expected caller is
//! a browser-based chat UI served from a different origin.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Path, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::{Config, ProviderKeys};
use crate::models::{Chat, ChatMessage, Message, Role};
use crate::provider::{self, ProviderError, ProviderKind};
use crate::ratelimit::RateLimiter;
use crate::store::memory::InMemoryStore;
use crate::store::sqlite::SqliteStore;
use crate::store::ChatStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub keys: Arc<ProviderKeys>,
    pub store: Arc<dyn ChatStore>,
    pub limiter: Arc<RateLimiter>,
    pub http: reqwest::Client,
}

impl AppState {
    /// Builds state from configuration: opens the store (SQLite when a
    /// database path is configured, in-memory otherwise), reads provider
    /// credentials from the environment, and constructs the shared
    /// outbound HTTP client.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store: Arc<dyn ChatStore> = match &config.db.path {
            Some(path) => {
                info!(path = %path.display(), "using SQLite store");
                Arc::new(SqliteStore::connect(path).await?)
            }
            None => {
                info!("no db.path configured; chats are kept in memory only");
                Arc::new(InMemoryStore::new())
            }
        };

        Ok(Self {
            config: Arc::new(config.clone()),
            keys: Arc::new(ProviderKeys::from_env()),
            store,
            limiter: Arc::new(RateLimiter::new(config.rate_limit.per_minute)),
            http: provider::http_client(config.provider.timeout_secs)?,
        })
    }
}

/// Starts the relay HTTP server.
///
/// Binds to `[server].bind`, spawns the limiter sweep task, and serves
/// until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let state = AppState::from_config(config).await?;

    // Reclaim limiter entries for clients that have gone quiet.
    let limiter = state.limiter.clone();
    let sweep_every = Duration::from_secs(config.rate_limit.sweep_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_every);
        ticker.tick().await; // the first tick fires immediately
        loop {
            ticker.tick().await;
            limiter.sweep_expired();
        }
    });

    let app = build_router(state);
    let bind_addr = &config.server.bind;

    info!(bind = %bind_addr, "relay listening");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Assembles the full router. Public so integration tests can serve the
/// same routes on an ephemeral listener.
pub fn build_router(state: AppState) -> Router {
    let cors = tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let admin = Router::new()
        .route("/rate-limit", get(handle_get_rate_limit))
        .route("/rate-limit", put(handle_set_rate_limit))
        .route("/stats", get(handle_stats))
        .route("/clear", post(handle_clear))
        .route("/broadcast", post(handle_broadcast))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin_token,
        ));

    Router::new()
        .route("/api/chat", post(handle_chat_turn))
        .route("/api/chats", get(handle_list_chats).post(handle_create_chat))
        .route("/api/chats/{id}", delete(handle_delete_chat))
        .route("/api/chats/{id}/messages", get(handle_list_messages))
        .route("/api/config/keys", get(handle_config_keys))
        .route("/health", get(handle_health))
        .nest("/api/admin", admin)
        .layer(cors)
        .with_state(state)
}

// ============ Error type ============

/// Everything that can go wrong while handling a request.
///
/// Implements [`IntoResponse`] so handlers simply return
/// `Result<T, ApiError>` and the JSON error body is produced here.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing fields in the request payload.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Per-client request quota exceeded for the current window.
    #[error("rate limit exceeded; try again in a minute")]
    RateLimited,

    /// The referenced chat does not exist.
    #[error("chat not found: {0}")]
    ChatNotFound(String),

    /// Admin token missing or wrong.
    #[error("unauthorized")]
    Unauthorized,

    /// The provider adapter failed; see [`ProviderError`] for the split.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Storage or other unclassified internal failure. Logged in full,
    /// returned to the client as a generic message.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        // Log the full chain before discarding it; clients only ever see a
        // generic message for internal failures.
        error!(error = ?e, "converting storage error to ApiError::Internal");
        ApiError::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, details) = match &self {
            ApiError::InvalidRequest(m) => {
                (StatusCode::BAD_REQUEST, format!("invalid request: {}", m), None)
            }
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate limit exceeded; try again in a minute".to_string(),
                None,
            ),
            ApiError::ChatNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("chat not found: {}", id), None)
            }
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "unauthorized".to_string(), None)
            }
            ApiError::Provider(e) => provider_error_response(e),
            ApiError::Internal(m) => {
                error!(message = %m, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({ "error": message });
        if let Some(details) = details {
            body["details"] = details;
        }
        (status, Json(body)).into_response()
    }
}

/// Maps a provider failure to an HTTP status for the caller.
///
/// A vendor 429 (or a quota/rate phrase in its error body) is relayed as
/// 429 so clients back off; auth failures are relayed as 401 so the caller
/// knows its key is bad; everything else is a 500 with the vendor's status
/// and raw body attached as `details` for diagnostics.
fn provider_error_response(e: &ProviderError) -> (StatusCode, String, Option<serde_json::Value>) {
    match e {
        ProviderError::Unsupported(name) => (
            StatusCode::BAD_REQUEST,
            format!("unsupported provider: {}", name),
            None,
        ),
        ProviderError::EmptyConversation => (
            StatusCode::BAD_REQUEST,
            "invalid request: messages must not be empty".to_string(),
            None,
        ),
        ProviderError::MissingApiKey(kind) => (
            StatusCode::UNAUTHORIZED,
            format!("no API key configured for provider {}", kind),
            None,
        ),
        ProviderError::CallFailed { status, body } => {
            let lower = body.to_lowercase();
            let mapped = if *status == 429 || lower.contains("quota") || lower.contains("rate limit")
            {
                StatusCode::TOO_MANY_REQUESTS
            } else if *status == 401
                || *status == 403
                || lower.contains("unauthorized")
                || lower.contains("api key")
            {
                StatusCode::UNAUTHORIZED
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (
                mapped,
                "provider call failed".to_string(),
                Some(json!({ "providerStatus": status, "providerBody": body })),
            )
        }
        ProviderError::EmptyResponse => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "no response from AI model".to_string(),
            None,
        ),
        ProviderError::Transport(e) => (
            StatusCode::BAD_GATEWAY,
            format!("provider request failed: {}", e),
            None,
        ),
    }
}

// ============ Admin auth ============

type HmacSha256 = Hmac<Sha256>;

/// Compares a presented admin token against the configured one without
/// leaking the match length through timing. Both sides are folded through
/// HMAC-SHA256 and compared with `Mac::verify_slice`.
fn token_matches(expected: &str, presented: &str) -> bool {
    let tag = {
        let mut mac = HmacSha256::new_from_slice(expected.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(b"chat-relay admin token");
        mac.finalize().into_bytes()
    };
    let mut mac =
        HmacSha256::new_from_slice(presented.as_bytes()).expect("HMAC can take key of any size");
    mac.update(b"chat-relay admin token");
    mac.verify_slice(&tag).is_ok()
}

/// Middleware guarding `/api/admin/*`. Requires `Authorization: Bearer
/// <token>` matching `[admin].token`; with no token configured, every
/// admin request is rejected.
async fn require_admin_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.config.admin.token.as_deref() else {
        warn!("admin request rejected: no admin.token configured");
        return ApiError::Unauthorized.into_response();
    };

    let presented = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if token_matches(expected, token) => next.run(request).await,
        _ => ApiError::Unauthorized.into_response(),
    }
}

// ============ Client identity ============

/// Buckets rate-limit counters by caller identity: the first
/// `X-Forwarded-For` hop when a proxy added one, the socket address
/// otherwise.
fn client_key(headers: &HeaderMap, addr: &SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| addr.ip().to_string())
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /api/chat ============

/// Incoming chat-turn payload. Field types are permissive (defaults rather
/// than hard deserialization failures) so validation errors surface as 400
/// with a message naming the field.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatTurnRequest {
    #[serde(default)]
    chat_id: String,
    #[serde(default)]
    messages: Vec<IncomingMessage>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    provider: Option<String>,
}

#[derive(Deserialize)]
struct IncomingMessage {
    #[serde(default)]
    role: String,
    #[serde(default)]
    content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatTurnResponse {
    message: String,
    message_id: String,
    model: String,
}

/// Runs one chat turn: rate-limit the caller, validate, persist the user's
/// message, call the provider, persist the reply.
///
/// The user's message is persisted before the provider call on purpose —
/// a vendor failure does not invalidate what the user typed, so a failed
/// turn leaves the user message in place with no assistant reply.
async fn handle_chat_turn(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<ChatTurnRequest>,
) -> Result<Json<ChatTurnResponse>, ApiError> {
    // Gate before any side effect so rejected callers cost nothing
    // downstream.
    let key = client_key(&headers, &addr);
    if !state.limiter.check(&key) {
        warn!(client = %key, "rate limited");
        return Err(ApiError::RateLimited);
    }

    let (chat_id, messages) = validate_turn(&req)?;

    if state.store.get_chat(&chat_id).await?.is_none() {
        return Err(ApiError::ChatNotFound(chat_id));
    }

    // The user's input is durable regardless of what the vendor does next.
    if let Some(last) = messages.last().filter(|m| m.role == Role::User) {
        state
            .store
            .append_message(&Message {
                id: Uuid::new_v4().to_string(),
                chat_id: chat_id.clone(),
                role: Role::User,
                content: last.content.clone(),
                model: None,
                created_at: Utc::now(),
            })
            .await?;
    }

    let (kind, endpoint, api_key, model) = resolve_provider(&state, &req)?;

    let reply = provider::send(&state.http, kind, &endpoint, &api_key, &model, &messages).await?;

    let assistant = Message {
        id: Uuid::new_v4().to_string(),
        chat_id: chat_id.clone(),
        role: Role::Assistant,
        content: reply.clone(),
        model: Some(model.clone()),
        created_at: Utc::now(),
    };
    state.store.append_message(&assistant).await?;

    info!(chat = %chat_id, provider = %kind, model = %model, reply_len = reply.len(), "chat turn complete");

    Ok(Json(ChatTurnResponse {
        message: reply,
        message_id: assistant.id,
        model,
    }))
}

/// Checks the payload shape and converts incoming messages to typed roles.
fn validate_turn(req: &ChatTurnRequest) -> Result<(String, Vec<ChatMessage>), ApiError> {
    if req.chat_id.is_empty() {
        return Err(ApiError::InvalidRequest("chatId is required".to_string()));
    }
    if req.messages.is_empty() {
        return Err(ApiError::InvalidRequest(
            "messages must not be empty".to_string(),
        ));
    }

    let mut messages = Vec::with_capacity(req.messages.len());
    for m in &req.messages {
        let role = Role::parse(&m.role).ok_or_else(|| {
            ApiError::InvalidRequest(format!(
                "invalid role '{}'; must be user or assistant",
                m.role
            ))
        })?;
        messages.push(ChatMessage {
            role,
            content: m.content.clone(),
        });
    }
    Ok((req.chat_id.clone(), messages))
}

/// Resolves which provider to call and with what endpoint, key, and model.
///
/// Precedence is request over config over the provider's built-in default.
/// The config-level endpoint/model overrides only apply to the configured
/// default provider; naming a different provider in the request gets that
/// provider's own defaults.
fn resolve_provider(
    state: &AppState,
    req: &ChatTurnRequest,
) -> Result<(ProviderKind, String, String, String), ApiError> {
    let defaults = &state.config.provider;
    let kind: ProviderKind = req
        .provider
        .as_deref()
        .unwrap_or(&defaults.default)
        .parse()?;
    let is_default_kind = kind.as_str() == defaults.default;

    let endpoint = req
        .endpoint
        .clone()
        .or_else(|| is_default_kind.then(|| defaults.endpoint.clone()).flatten())
        .unwrap_or_else(|| kind.default_endpoint().to_string());

    let model = req
        .model
        .clone()
        .or_else(|| is_default_kind.then(|| defaults.model.clone()).flatten())
        .unwrap_or_else(|| kind.default_model().to_string());

    let env_key = match kind {
        ProviderKind::Gemini => state.keys.gemini.clone(),
        ProviderKind::Mistral => state.keys.mistral.clone(),
        ProviderKind::Github => state.keys.github.clone(),
        _ => None,
    };
    let api_key = req
        .api_key
        .clone()
        .or(env_key)
        .ok_or(ProviderError::MissingApiKey(kind.as_str()))?;

    Ok((kind, endpoint, api_key, model))
}

// ============ Chat CRUD ============

#[derive(Deserialize)]
struct CreateChatRequest {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

async fn handle_create_chat(
    State(state): State<AppState>,
    Json(req): Json<CreateChatRequest>,
) -> Result<Json<Chat>, ApiError> {
    let chat = Chat {
        id: req.id.filter(|id| !id.is_empty()).unwrap_or_else(|| Uuid::new_v4().to_string()),
        name: req.name.filter(|n| !n.is_empty()).unwrap_or_else(|| "New Chat".to_string()),
        created_at: Utc::now(),
        user_id: None,
    };
    state.store.create_chat(&chat).await?;
    Ok(Json(chat))
}

async fn handle_list_chats(State(state): State<AppState>) -> Result<Json<Vec<Chat>>, ApiError> {
    Ok(Json(state.store.list_chats().await?))
}

async fn handle_delete_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.store.delete_chat(&id).await? {
        return Err(ApiError::ChatNotFound(id));
    }
    Ok(Json(json!({ "success": true })))
}

async fn handle_list_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    if state.store.get_chat(&id).await?.is_none() {
        return Err(ApiError::ChatNotFound(id));
    }
    Ok(Json(state.store.list_messages(&id).await?))
}

// ============ GET /api/config/keys ============

#[derive(Serialize)]
struct ConfigKeysResponse {
    gemini: Option<String>,
    mistral: Option<String>,
    github: Option<String>,
}

/// Hands the server's provider credentials to the browser client so it can
/// talk to vendors directly. Anyone who can reach this endpoint gets the
/// keys — deploy behind your own network perimeter or leave the
/// environment variables unset.
async fn handle_config_keys(State(state): State<AppState>) -> Json<ConfigKeysResponse> {
    Json(ConfigKeysResponse {
        gemini: state.keys.gemini.clone(),
        mistral: state.keys.mistral.clone(),
        github: state.keys.github.clone(),
    })
}

// ============ Admin handlers ============

#[derive(Serialize)]
struct RateLimitResponse {
    limit: u32,
}

async fn handle_get_rate_limit(State(state): State<AppState>) -> Json<RateLimitResponse> {
    Json(RateLimitResponse {
        limit: state.limiter.limit(),
    })
}

#[derive(Deserialize)]
struct SetRateLimitRequest {
    limit: u32,
}

/// Replaces the global per-client limit. Applies to every check from now
/// on; windows already in flight are not re-evaluated retroactively.
async fn handle_set_rate_limit(
    State(state): State<AppState>,
    Json(req): Json<SetRateLimitRequest>,
) -> Json<RateLimitResponse> {
    state.limiter.set_limit(req.limit);
    info!(limit = req.limit, "global rate limit updated");
    Json(RateLimitResponse {
        limit: state.limiter.limit(),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    chats: u64,
    messages: u64,
    tracked_clients: usize,
    rate_limit: u32,
}

async fn handle_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let store = state.store.stats().await?;
    Ok(Json(StatsResponse {
        chats: store.chats,
        messages: store.messages,
        tracked_clients: state.limiter.tracked_clients(),
        rate_limit: state.limiter.limit(),
    }))
}

async fn handle_clear(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    state.store.clear().await?;
    warn!("admin cleared all stored chats and messages");
    Ok(Json(json!({ "success": true })))
}

#[derive(Deserialize)]
struct BroadcastRequest {
    #[serde(default)]
    message: String,
}

/// Accepts a broadcast message. There is no delivery channel yet, so the
/// message is acknowledged and dropped.
/// TODO: deliver via SSE once the browser client subscribes to events.
async fn handle_broadcast(Json(req): Json<BroadcastRequest>) -> Json<serde_json::Value> {
    info!(len = req.message.len(), "broadcast accepted (no subscribers)");
    Json(json!({ "accepted": true, "delivered": 0 }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_match_is_exact() {
        assert!(token_matches("a-long-admin-token", "a-long-admin-token"));
        assert!(!token_matches("a-long-admin-token", "a-long-admin-tokeN"));
        assert!(!token_matches("a-long-admin-token", "a-long-admin-toke"));
        assert!(!token_matches("a-long-admin-token", ""));
    }

    #[test]
    fn client_key_prefers_forwarded_header() {
        let addr: SocketAddr = "192.0.2.9:4444".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers, &addr), "192.0.2.9");

        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        assert_eq!(client_key(&headers, &addr), "203.0.113.7");
    }

    #[test]
    fn validate_turn_rejects_bad_shapes() {
        let empty_chat = ChatTurnRequest {
            chat_id: String::new(),
            messages: vec![],
            model: None,
            endpoint: None,
            api_key: None,
            provider: None,
        };
        assert!(matches!(
            validate_turn(&empty_chat),
            Err(ApiError::InvalidRequest(_))
        ));

        let no_messages = ChatTurnRequest {
            chat_id: "c1".into(),
            ..empty_chat_request()
        };
        assert!(matches!(
            validate_turn(&no_messages),
            Err(ApiError::InvalidRequest(_))
        ));

        let bad_role = ChatTurnRequest {
            chat_id: "c1".into(),
            messages: vec![IncomingMessage {
                role: "system".into(),
                content: "hi".into(),
            }],
            ..empty_chat_request()
        };
        assert!(matches!(
            validate_turn(&bad_role),
            Err(ApiError::InvalidRequest(_))
        ));
    }

    fn empty_chat_request() -> ChatTurnRequest {
        ChatTurnRequest {
            chat_id: String::new(),
            messages: vec![],
            model: None,
            endpoint: None,
            api_key: None,
            provider: None,
        }
    }

    #[test]
    fn provider_error_status_mapping() {
        let (status, _, _) = provider_error_response(&ProviderError::CallFailed {
            status: 429,
            body: "slow down".into(),
        });
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

        let (status, _, _) = provider_error_response(&ProviderError::CallFailed {
            status: 500,
            body: "You exceeded your current quota".into(),
        });
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

        let (status, _, _) = provider_error_response(&ProviderError::CallFailed {
            status: 401,
            body: "bad key".into(),
        });
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _, details) = provider_error_response(&ProviderError::CallFailed {
            status: 503,
            body: "upstream sad".into(),
        });
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(details.unwrap()["providerStatus"], 503);

        let (status, message, _) = provider_error_response(&ProviderError::EmptyResponse);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "no response from AI model");
    }
}
