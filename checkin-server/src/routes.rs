//! HTTP route handlers for the check-in API.

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use checkin::core::engine::Engine;
use checkin::core::record::SessionRecord;
use checkin::core::types::{Input, Session};
use checkin::io::record_log::load_records;
use checkin::turn::{TurnContext, TurnReport, open_session, run_turn};

use crate::state::AppState;

/// Build the API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/input", post(post_input))
        .route("/sessions/{id}/reset", post(reset_session))
        .route("/records", get(list_records))
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CreateSession {
    student_id: Option<String>,
}

/// POST /api/sessions - create a session and return its opening turn.
///
/// The body is optional; a bare POST creates an anonymous session.
async fn create_session(
    State(state): State<AppState>,
    body: Option<Json<CreateSession>>,
) -> Result<(StatusCode, Json<TurnReport>), StatusCode> {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let student_id = body
        .student_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());
    let mut sessions = state.sessions.lock().await;
    let now = Utc::now();
    let id = sessions.create(student_id, now);
    let report = open_session(&mut sessions, &id, &turn_context(&state), now).map_err(internal)?;
    info!(session_id = %id, "session opened");
    Ok((StatusCode::CREATED, Json(report)))
}

#[derive(Serialize)]
struct SessionView {
    session: Session,
    /// Question the session is waiting on, if any.
    question: Option<String>,
}

/// GET /api/sessions/{id} - current session snapshot.
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, StatusCode> {
    let sessions = state.sessions.lock().await;
    let session = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let settings = state.config.flow_settings();
    let question = Engine::new(&settings).question(session);
    Ok(Json(SessionView {
        session: session.clone(),
        question,
    }))
}

/// POST /api/sessions/{id}/input - run one turn.
///
/// The session is discarded once its record has been handled.
async fn post_input(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<Input>,
) -> Result<Json<TurnReport>, StatusCode> {
    let mut sessions = state.sessions.lock().await;
    if sessions.get(&id).is_none() {
        return Err(StatusCode::NOT_FOUND);
    }
    let report = run_turn(&mut sessions, &id, &input, &turn_context(&state), Utc::now())
        .map_err(internal)?;
    if report.persisted.is_some() {
        sessions.remove(&id);
        info!(
            session_id = %id,
            state = report.state.as_str(),
            "session finalized and discarded"
        );
    }
    Ok(Json(report))
}

/// DELETE /api/sessions/{id} - drop an abandoned session without saving it.
async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    let mut sessions = state.sessions.lock().await;
    match sessions.remove(&id) {
        Some(_) => {
            info!(session_id = %id, "session deleted");
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

/// POST /api/sessions/{id}/reset - restart the session from the greeting.
async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TurnReport>, StatusCode> {
    let mut sessions = state.sessions.lock().await;
    let now = Utc::now();
    sessions.reset(&id, now).ok_or(StatusCode::NOT_FOUND)?;
    let report = open_session(&mut sessions, &id, &turn_context(&state), now).map_err(internal)?;
    info!(session_id = %id, "session reset");
    Ok(Json(report))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RecordsQuery {
    limit: Option<usize>,
}

/// GET /api/records - stored records, oldest first.
async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<RecordsQuery>,
) -> Result<Json<Vec<SessionRecord>>, StatusCode> {
    let mut records = load_records(state.record_log.path()).map_err(internal)?;
    if let Some(limit) = query.limit {
        let skip = records.len().saturating_sub(limit);
        records.drain(..skip);
    }
    Ok(Json(records))
}

fn turn_context(state: &AppState) -> TurnContext<'_> {
    TurnContext {
        config: &state.config,
        sink: state.record_log.as_ref(),
        responder: None,
    }
}

fn internal(err: anyhow::Error) -> StatusCode {
    warn!(error = %format!("{err:#}"), "request failed");
    StatusCode::INTERNAL_SERVER_ERROR
}
