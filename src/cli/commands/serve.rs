//! HTTP API server with one session per client.
//!
//! Clients create a session, process a video into it, then ask questions about it.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::error::VidaskError;
use crate::orchestrator::{status_message, Orchestrator};
use crate::session::SessionStore;
use crate::vector_store::SearchHit;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
    sessions: SessionStore,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(&settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vidask doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let sessions = SessionStore::with_limits(
        settings.server.max_sessions,
        chrono::Duration::seconds(settings.server.session_idle_secs as i64),
    );
    let state = Arc::new(AppState {
        orchestrator: Orchestrator::new(settings)?,
        sessions,
    });

    tokio::spawn(sweep_sessions(state.clone()));

    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    Output::header("Vidask API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("New Session", "POST /sessions");
    Output::kv("Session", "GET  /sessions/{id}");
    Output::kv("Process", "POST /sessions/{id}/process");
    Output::kv("Ask", "POST /sessions/{id}/ask");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically drop sessions nobody has used for a while.
async fn sweep_sessions(state: Arc<AppState>) {
    let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        let removed = state.sessions.sweep_idle(Utc::now());
        if removed > 0 {
            info!(
                "Dropped {} idle session(s), {} remain",
                removed,
                state.sessions.len()
            );
        }
    }
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/process", post(process))
        .route("/sessions/{id}/ask", post(ask))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Serialize)]
struct SessionResponse {
    session_id: Uuid,
    created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    video: Option<VideoInfo>,
}

#[derive(Serialize)]
struct VideoInfo {
    video_id: String,
    title: Option<String>,
    chunk_count: usize,
    processed_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
}

#[derive(Deserialize)]
struct ProcessRequest {
    url: String,
}

#[derive(Serialize)]
struct ProcessResponse {
    status: String,
    summary: String,
    video_id: String,
    chunks_indexed: usize,
    already_processed: bool,
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    sources: Vec<SourceInfo>,
}

#[derive(Serialize)]
struct SourceInfo {
    source_offset: usize,
    score: f32,
    content: String,
}

impl From<SearchHit> for SourceInfo {
    fn from(hit: SearchHit) -> Self {
        Self {
            source_offset: hit.chunk.source_offset,
            score: hit.similarity(),
            content: hit.chunk.text,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

fn session_not_found(id: Uuid) -> Response {
    error_response(StatusCode::NOT_FOUND, format!("Session not found: {}", id))
}

/// Map an operation failure to a status code and user-facing message.
fn failure(e: &VidaskError) -> Response {
    let status = match e {
        VidaskError::InvalidInput(_) | VidaskError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
        VidaskError::NoTranscript { .. } | VidaskError::VideoNotFound { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        VidaskError::NotReady => StatusCode::CONFLICT,
        VidaskError::TooManySessions(_) => StatusCode::SERVICE_UNAVAILABLE,
        e if e.is_transient() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        warn!("Request failed: {}", e);
    }
    error_response(status, status_message(e))
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn create_session(State(state): State<Arc<AppState>>) -> Response {
    let session = match state.sessions.create() {
        Ok(session) => session,
        Err(e) => {
            warn!("Refusing new session: {}", e);
            return failure(&e);
        }
    };
    info!("Created session {}", session.id());
    (
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id: session.id(),
            created_at: session.created_at().to_rfc3339(),
            video: None,
        }),
    )
        .into_response()
}

async fn get_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    let Some(session) = state.sessions.get(&id) else {
        return session_not_found(id);
    };

    let video = session.active().await.map(|active| VideoInfo {
        video_id: active.video_id.to_string(),
        title: active.title.clone(),
        chunk_count: active.index.len(),
        processed_at: active.processed_at.to_rfc3339(),
        summary: active.summary.clone(),
    });

    Json(SessionResponse {
        session_id: session.id(),
        created_at: session.created_at().to_rfc3339(),
        video,
    })
    .into_response()
}

async fn delete_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    match state.sessions.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => session_not_found(id),
    }
}

async fn process(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ProcessRequest>,
) -> Response {
    let Some(session) = state.sessions.get(&id) else {
        return session_not_found(id);
    };

    match state.orchestrator.process(&session, &req.url).await {
        Ok(outcome) => {
            let video_id = outcome.video_id.to_string();
            let chunks_indexed = outcome.chunks_indexed;
            let already_processed = outcome.already_processed;
            let display = outcome.into_display();

            Json(ProcessResponse {
                status: display.status,
                summary: display.summary,
                video_id,
                chunks_indexed,
                already_processed,
            })
            .into_response()
        }
        Err(e) => failure(&e),
    }
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AskRequest>,
) -> Response {
    let Some(session) = state.sessions.get(&id) else {
        return session_not_found(id);
    };

    match state.orchestrator.ask(&session, &req.question).await {
        Ok(answer) => Json(AskResponse {
            answer: answer.text,
            sources: answer.sources.into_iter().map(SourceInfo::from).collect(),
        })
        .into_response(),
        Err(e) => failure(&e),
    }
}
