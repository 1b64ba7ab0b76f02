//! Web chat UI.
//!
//! Serves a single-page chat with one persistent session per process. The
//! orchestrator is built on the first request that needs it, exactly once.

use crate::activity::Activity;
use crate::agent::{LoopState, ToolInvocation};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::ResolvError;
use crate::orchestrator::Orchestrator;
use crate::session::{ConversationTurn, Session};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

const INDEX_HTML: &str = include_str!("../../../assets/index.html");

/// Shared application state.
struct AppState {
    settings: Settings,
    orchestrator: OnceCell<Arc<Orchestrator>>,
    session: Mutex<Option<Session>>,
}

impl AppState {
    fn new(settings: Settings) -> Self {
        Self {
            settings,
            orchestrator: OnceCell::new(),
            session: Mutex::new(None),
        }
    }

    async fn orchestrator(&self) -> Result<Arc<Orchestrator>, ApiError> {
        self.orchestrator
            .get_or_try_init(|| async {
                Orchestrator::build(self.settings.clone()).await.map(Arc::new)
            })
            .await
            .cloned()
            .map_err(|e| ApiError::internal("Failed to initialize the support agent", e))
    }
}

/// Run the web chat server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    // Fail fast on a missing key or corpus; the index itself is built lazily.
    if let Err(e) = preflight::check(Operation::Chat, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'resolv doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let app = router(Arc::new(AppState::new(settings)));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Resolv Support Chat");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Chat UI", "GET  /");
    Output::kv("Health", "GET  /health");
    Output::kv("Transcript", "GET  /api/session");
    Output::kv("Send message", "POST /api/chat");
    Output::kv("New conversation", "POST /api/reset");
    Output::kv("Activity", "GET  /api/activity");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/session", get(session))
        .route("/api/chat", post(chat))
        .route("/api/reset", post(reset))
        .route("/api/activity", get(activity))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    reply: String,
    state: LoopState,
    escalated: bool,
    tool_calls: Vec<ToolInvocation>,
    turns: Vec<ConversationTurn>,
}

#[derive(Serialize)]
struct SessionResponse {
    turns: Vec<ConversationTurn>,
}

#[derive(Serialize)]
struct ActivityResponse {
    activity: Vec<Activity>,
    total: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// An error reported to the browser as JSON.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }

    /// Log the cause and hide it behind a generic message.
    fn internal(message: &str, cause: impl std::fmt::Display) -> Self {
        error!("{}: {}", message, cause);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{}. Please try again.", message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

// === Handlers ===

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn session(State(state): State<Arc<AppState>>) -> Result<Json<SessionResponse>, ApiError> {
    let orchestrator = state.orchestrator().await?;
    let mut guard = state.session.lock().await;
    let session = guard.get_or_insert_with(|| orchestrator.new_session());

    Ok(Json(SessionResponse {
        turns: session.turns().to_vec(),
    }))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = req.message.trim();
    let orchestrator = state.orchestrator().await?;

    // Held across the turn: one turn at a time per session.
    let mut guard = state.session.lock().await;
    let session = guard.get_or_insert_with(|| orchestrator.new_session());

    let outcome = orchestrator
        .respond(session, message)
        .await
        .map_err(|e| match e {
            ResolvError::InvalidInput(reason) => ApiError::bad_request(&reason),
            e => ApiError::internal("The assistant could not answer", e),
        })?;

    Ok(Json(ChatResponse {
        reply: outcome.output,
        state: outcome.state,
        escalated: outcome.escalated,
        tool_calls: outcome.tool_calls,
        turns: session.turns().to_vec(),
    }))
}

async fn reset(State(state): State<Arc<AppState>>) -> Result<Json<SessionResponse>, ApiError> {
    let orchestrator = state.orchestrator().await?;
    let session = orchestrator.new_session();
    let turns = session.turns().to_vec();
    *state.session.lock().await = Some(session);

    Ok(Json(SessionResponse { turns }))
}

async fn activity(State(state): State<Arc<AppState>>) -> Result<Json<ActivityResponse>, ApiError> {
    let orchestrator = state.orchestrator().await?;
    let activity = orchestrator.activity().snapshot().await;

    Ok(Json(ActivityResponse {
        total: activity.len(),
        activity,
    }))
}
