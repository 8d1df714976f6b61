//! HTTP server for the chat page and its JSON API

use super::page::CHAT_PAGE_HTML;
use crate::config::Config;
use crate::session::SessionClient;
use crate::ui::{ChatController, LayoutState, Snapshot};
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

/// Shared application state
pub struct AppState {
    /// One request at a time goes through the controller
    controller: Mutex<ChatController>,
    session: Arc<SessionClient>,
    config: Config,
}

impl AppState {
    pub fn new(session: Arc<SessionClient>) -> Self {
        let config = session.config().clone();
        Self {
            controller: Mutex::new(ChatController::new(session.clone())),
            session,
            config,
        }
    }
}

/// Request for chat
#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    thread_id: Option<String>,
}

/// Response for chat: whether the message was processed plus the new state
#[derive(Debug, Serialize)]
struct ChatResponse {
    accepted: bool,
    #[serde(flatten)]
    snapshot: Snapshot,
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    profile: String,
}

#[derive(Debug, Serialize)]
struct ToolsResponse {
    connected: bool,
    tools: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ExamplesResponse {
    example_queries: Vec<String>,
    business_types: Vec<String>,
    cities: Vec<String>,
    prompt_types: BTreeMap<String, String>,
    default_analysis_type: String,
    default_num_territories: u32,
    default_distance_limit_km: f64,
}

/// Build the router over shared state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/api/state", get(get_state))
        .route("/api/chat", post(handle_chat))
        .route("/api/layout/toggle", post(toggle_layout))
        .route("/api/tools", get(list_tools))
        .route("/api/examples", get(list_examples))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server until `shutdown` resolves
pub async fn run_http_server<F>(
    host: &str,
    port: u16,
    session: Arc<SessionClient>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(Arc::new(AppState::new(session)));

    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    let addr = listener.local_addr()?;
    tracing::info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(CHAT_PAGE_HTML)
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::version(),
        profile: state.config.profile.as_str().to_string(),
    })
}

async fn get_state(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    let controller = state.controller.lock().await;
    Json(controller.snapshot().await)
}

async fn handle_chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    if req.message.len() > 10_000 {
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(serde_json::json!({"error": "message is too long"})),
        )
            .into_response();
    }

    let mut controller = state.controller.lock().await;
    let accepted = controller
        .submit(&req.message, req.thread_id.as_deref())
        .await;
    let snapshot = controller.snapshot().await;
    Json(ChatResponse { accepted, snapshot }).into_response()
}

async fn toggle_layout(State(state): State<Arc<AppState>>) -> Json<LayoutState> {
    let mut controller = state.controller.lock().await;
    Json(controller.toggle_panel())
}

async fn list_tools(State(state): State<Arc<AppState>>) -> Json<ToolsResponse> {
    Json(ToolsResponse {
        connected: state.session.is_connected().await,
        tools: state.session.tool_names().await,
    })
}

async fn list_examples(State(state): State<Arc<AppState>>) -> Json<ExamplesResponse> {
    let catalog = &state.config.catalog;
    let analysis = &state.config.analysis;
    Json(ExamplesResponse {
        example_queries: catalog.example_queries.clone(),
        business_types: catalog.business_types.clone(),
        cities: catalog.cities.clone(),
        prompt_types: catalog.prompt_types.clone(),
        default_analysis_type: analysis.default_analysis_type.clone(),
        default_num_territories: analysis.default_num_territories,
        default_distance_limit_km: analysis.default_distance_limit_km,
    })
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
