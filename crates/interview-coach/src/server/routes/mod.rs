//! API routes for the coach server

pub mod conversations;
pub mod dashboard;
pub mod sessions;
pub mod slides;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{delete, get, post},
    Json, Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Interview sessions
        .route("/sessions", post(sessions::create_session))
        .route("/sessions/:id", get(sessions::get_session))
        .route("/sessions/:id", delete(sessions::delete_session))
        .route("/sessions/:id/reset", post(sessions::reset_session))
        .route("/sessions/:id/messages", post(sessions::submit_message))
        .route("/sessions/:id/end", post(sessions::end_session))
        .route("/sessions/:id/feedback", get(sessions::download_feedback))
        .route("/sessions/:id/review", post(sessions::review_conversation))
        // Saved conversations
        .route("/users/:user/conversations", get(conversations::list_user_conversations))
        .route("/conversations/:id", get(conversations::get_conversation))
        // Tutor dashboard
        .route("/dashboard/grades", get(dashboard::search_grades))
        .route("/dashboard/stats", get(dashboard::stats))
        // Slides - with larger body limit for file uploads
        .route(
            "/slides",
            post(slides::upload_slides).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/slides", get(slides::list_slides))
        .route("/slides/:id", delete(slides::delete_slides))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let engine = state.engine();
    Json(serde_json::json!({
        "name": "interview-coach",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Interview simulator with rubric grading and slide-grounded replies",
        "llm": {
            "provider": engine.llm().name(),
            "model": engine.llm().model(),
        },
        "retrieval": engine.retriever().map(|r| r.name()),
        "active_sessions": state.session_count(),
        "endpoints": {
            "POST /api/sessions": "Start a session for a user",
            "GET /api/sessions/:id": "Session transcript and status",
            "POST /api/sessions/:id/reset": "Start over in the same session",
            "POST /api/sessions/:id/messages": "Ask the interviewee a question",
            "POST /api/sessions/:id/end": "Grade, save and seal the session",
            "GET /api/sessions/:id/feedback": "Download the feedback document",
            "POST /api/sessions/:id/review": "Open a saved conversation read-only",
            "DELETE /api/sessions/:id": "Discard a session",
            "GET /api/users/:user/conversations": "List a user's saved conversations",
            "GET /api/conversations/:id": "Find a saved conversation by id",
            "GET /api/dashboard/grades": "Search grade records (q, top)",
            "GET /api/dashboard/stats": "Grade distribution and activity",
            "POST /api/slides": "Upload lecture slides (multipart)",
            "GET /api/slides": "List indexed slides",
            "DELETE /api/slides/:id": "Remove slides from the index"
        }
    }))
}
