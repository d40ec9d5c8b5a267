//! HTTP front for the pipeline.
//!
//! A small JSON API over one [`SessionContext`]: start a run, poll its
//! progress, browse the history, and download a finished document.
//!
//! ```text
//! POST   /api/generate                 {"theme": "..."} -> entry
//! GET    /api/progress                 state + "✅ ... completed!" messages
//! GET    /api/history                  most recent entries with previews
//! GET    /api/history/{id}             full entry
//! DELETE /api/history/{id}
//! POST   /api/history/{id}/toggle      expand / collapse
//! GET    /api/history/{id}/download    Markdown attachment
//! ```

use crate::agent::AgentExecutor;
use crate::config::Config;
use crate::packager;
use crate::pipeline;
use crate::session::{self, HistoryEntry, SessionContext, SessionObserver, PREVIEW_CHARS};
use crate::types::{RunInput, RunState, Theme, TopicCount};
use crate::{error::Result, PipelineError};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Shared server state.
pub struct AppState {
    pub session: Arc<Mutex<SessionContext>>,
    pub executor: Arc<dyn AgentExecutor>,
    pub config: Config,
}

impl AppState {
    pub fn new(executor: Arc<dyn AgentExecutor>, config: Config) -> Self {
        Self {
            session: Arc::new(Mutex::new(SessionContext::new())),
            executor,
            config,
        }
    }

    fn session(&self) -> MutexGuard<'_, SessionContext> {
        session::lock(&self.session)
    }
}

/// JSON error body: `{"error": "...", "stage": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub stage: Option<String>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            stage: None,
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let status = match &err {
            PipelineError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            PipelineError::StageFailed { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            stage: err.stage().map(str::to_string),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message, "stage": self.stage }));
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub theme: String,
}

/// History entry as listed: preview unless expanded.
#[derive(Debug, Serialize)]
pub struct EntrySummary {
    pub id: Uuid,
    pub theme: String,
    pub topic_count: TopicCount,
    pub completed_at: DateTime<Local>,
    pub expanded: bool,
    pub content: String,
}

impl From<&HistoryEntry> for EntrySummary {
    fn from(entry: &HistoryEntry) -> Self {
        let content = if entry.expanded {
            entry.result.content.clone()
        } else {
            entry.preview(PREVIEW_CHARS)
        };
        Self {
            id: entry.id,
            theme: entry.result.theme.to_string(),
            topic_count: entry.result.topic_count,
            completed_at: entry.result.completed_at,
            expanded: entry.expanded,
            content,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProgressView {
    #[serde(flatten)]
    pub state: RunState,
    pub messages: Vec<String>,
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/generate", post(generate))
        .route("/api/progress", get(progress))
        .route("/api/history", get(history))
        .route("/api/history/{id}", get(history_entry).delete(delete_entry))
        .route("/api/history/{id}/toggle", post(toggle_entry))
        .route("/api/history/{id}/download", get(download_entry))
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(state: Arc<AppState>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "web server listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

pub async fn health(State(state): State<Arc<AppState>>) -> ApiResult<Json<serde_json::Value>> {
    let runs = state.session().history().len();
    Ok(Json(json!({ "status": "ok", "runs": runs })))
}

/// Run the whole pipeline for one theme. Responds once the run is over.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> ApiResult<Json<EntrySummary>> {
    let theme = Theme::new(req.theme)?;
    let topic_count = state.config.web_topic_range.sample()?;

    if state.session().begin_run().is_err() {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "A run is already in progress",
        ));
    }

    tracing::info!(theme = %theme, topic_count = %topic_count, "web run requested");
    // The run owns its session handle, so it is closed even if the client
    // goes away and this handler is dropped.
    let shared = state.session.clone();
    let executor = state.executor.clone();
    let run = tokio::spawn(async move {
        let observer = SessionObserver::new(shared.clone());
        let outcome = pipeline::run_article(
            executor.as_ref(),
            RunInput::new(theme, topic_count),
            &observer,
        )
        .await;
        // bind first: the guard must drop before `shared`
        let finished = session::lock(&shared).finish(outcome);
        finished
    });

    let id = match run.await {
        Ok(finished) => finished?,
        Err(e) => {
            tracing::error!(error = %e, "web run task aborted");
            session::lock(&state.session).finish(Err(PipelineError::Other(format!(
                "run task aborted: {}",
                e
            ))))?
        }
    };
    let session = state.session();
    let entry = session
        .get(id)
        .ok_or_else(|| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "entry vanished"))?;
    Ok(Json(EntrySummary::from(entry)))
}

pub async fn progress(State(state): State<Arc<AppState>>) -> ApiResult<Json<ProgressView>> {
    let session = state.session();
    Ok(Json(ProgressView {
        state: session.state().clone(),
        messages: session.progress_messages().to_vec(),
    }))
}

pub async fn history(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<EntrySummary>>> {
    let session = state.session();
    let entries = session
        .recent(state.config.history_display_limit)
        .iter()
        .map(EntrySummary::from)
        .collect();
    Ok(Json(entries))
}

fn not_found(id: Uuid) -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, format!("No history entry {}", id))
}

pub async fn history_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<HistoryEntry>> {
    let session = state.session();
    session
        .get(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found(id))
}

pub async fn delete_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.session().delete(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

pub async fn toggle_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let expanded = state
        .session()
        .toggle_expanded(id)
        .ok_or_else(|| not_found(id))?;
    Ok(Json(json!({ "id": id, "expanded": expanded })))
}

pub async fn download_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let session = state.session();
    let entry = session.get(id).ok_or_else(|| not_found(id))?;
    let result = &entry.result;
    let file_name = packager::download_file_name(&result.theme, &result.completed_at);
    let document = packager::package(&result.theme, &result.content);

    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        document,
    )
        .into_response())
}
