//! Interview session endpoints

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::session::{SessionView, SubmitOutcome};
use crate::types::GradeRecord;

/// Request to start a session
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// User identity, supplied by the caller
    pub user: String,
}

/// Request to submit a user message
#[derive(Debug, Deserialize)]
pub struct SubmitMessageRequest {
    pub text: String,
}

/// Request to open a saved conversation for review
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub conversation_id: i64,
}

/// Response to a submitted message
#[derive(Debug, Serialize)]
pub struct SubmitMessageResponse {
    #[serde(flatten)]
    pub outcome: SubmitOutcome,
    pub session: SessionView,
}

/// POST /api/sessions - Start a new session
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>)> {
    let user = req.user.trim();
    if user.is_empty() {
        return Err(Error::InvalidRequest("user must not be empty".to_string()));
    }

    let session = state.engine().reset(user);
    let view = session.view();
    state.insert_session(session);

    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/sessions/:id - Current session state
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>> {
    let shared = state.session(&id)?;
    let session = shared.lock().await;
    Ok(Json(session.view()))
}

/// POST /api/sessions/:id/reset - Start over in the same session
pub async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>> {
    let shared = state.session(&id)?;
    let mut session = shared.lock().await;
    state.engine().reset_session(&mut session);
    tracing::info!("Session {} reset", id);
    Ok(Json(session.view()))
}

/// POST /api/sessions/:id/messages - Ask the interviewee a question
pub async fn submit_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitMessageRequest>,
) -> Result<Json<SubmitMessageResponse>> {
    let shared = state.session(&id)?;
    let mut session = shared.lock().await;

    let outcome = state.engine().submit_user_message(&mut session, &req.text).await?;

    Ok(Json(SubmitMessageResponse {
        outcome,
        session: session.view(),
    }))
}

/// POST /api/sessions/:id/end - Grade, save and seal the session
pub async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GradeRecord>> {
    let shared = state.session(&id)?;
    let mut session = shared.lock().await;

    tracing::info!("Ending session {} ({} questions)", id, session.questions.len());
    let record = state.engine().end_session(&mut session).await?;

    Ok(Json(record))
}

/// GET /api/sessions/:id/feedback - Download the feedback document
pub async fn download_feedback(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let shared = state.session(&id)?;
    let session = shared.lock().await;
    let record = session.grade.as_ref().ok_or(Error::NotGraded(id))?;

    let disposition = format!("attachment; filename=\"{}\"", record.export_filename());
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        record.feedback_export(),
    ))
}

/// POST /api/sessions/:id/review - Open a saved conversation read-only
pub async fn review_conversation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<SessionView>> {
    let shared = state.session(&id)?;
    let mut session = shared.lock().await;

    state
        .engine()
        .review_conversation(&mut session, req.conversation_id)
        .await?;

    Ok(Json(session.view()))
}

/// DELETE /api/sessions/:id - Discard a session
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if state.remove_session(&id) {
        tracing::info!("Session {} discarded", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::SessionNotFound(id))
    }
}
