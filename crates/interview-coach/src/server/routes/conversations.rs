//! Saved conversation endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{ConversationSummary, StoredConversation};

/// GET /api/users/:user/conversations - Sidebar of past conversations
pub async fn list_user_conversations(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<Vec<ConversationSummary>>> {
    Ok(Json(state.db().list_conversation_summaries(&user)?))
}

/// GET /api/conversations/:id - Conversation finder
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StoredConversation>> {
    Ok(Json(state.dashboard().conversation(id)?))
}
