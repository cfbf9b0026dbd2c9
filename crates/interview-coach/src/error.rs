//! Error types for the interview coach

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for coach operations
pub type Result<T> = std::result::Result<T, Error>;

/// Interview coach errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Language-model provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Retrieval provider error
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Persistence store error
    #[error("Storage error: {0}")]
    Storage(String),

    /// No live session with this id
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    /// Slide document not found
    #[error("Slide document not found: {0}")]
    DocumentNotFound(Uuid),

    /// Stored conversation not found or undecodable
    #[error("Conversation not found: {0}")]
    ConversationNotFound(i64),

    /// The session has already been graded
    #[error("Session {0} has already ended")]
    SessionEnded(Uuid),

    /// The session holds a transcript loaded for review
    #[error("Session {0} is in review mode and cannot be modified")]
    ReadOnly(Uuid),

    /// Feedback was requested before the session was graded
    #[error("Session {0} has not been graded")]
    NotGraded(Uuid),

    /// Grading was requested before any question was asked
    #[error("Session {0} has no questions to grade")]
    EmptySession(Uuid),

    /// Malformed request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Slide file parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Unsupported slide file type
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create a retrieval error
    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::Retrieval(message.into())
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::Config(_) => (StatusCode::BAD_REQUEST, "config_error"),
            Error::Llm(_) => (StatusCode::SERVICE_UNAVAILABLE, "llm_error"),
            Error::Retrieval(_) => (StatusCode::INTERNAL_SERVER_ERROR, "retrieval_error"),
            Error::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            Error::SessionNotFound(_) => (StatusCode::NOT_FOUND, "session_not_found"),
            Error::DocumentNotFound(_) => (StatusCode::NOT_FOUND, "document_not_found"),
            Error::ConversationNotFound(_) => (StatusCode::NOT_FOUND, "conversation_not_found"),
            Error::SessionEnded(_) => (StatusCode::CONFLICT, "session_ended"),
            Error::ReadOnly(_) => (StatusCode::CONFLICT, "read_only"),
            Error::NotGraded(_) => (StatusCode::NOT_FOUND, "not_graded"),
            Error::EmptySession(_) => (StatusCode::UNPROCESSABLE_ENTITY, "empty_session"),
            Error::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            Error::FileParse { .. } => (StatusCode::BAD_REQUEST, "parse_error"),
            Error::UnsupportedFileType(_) => (StatusCode::BAD_REQUEST, "unsupported_type"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
