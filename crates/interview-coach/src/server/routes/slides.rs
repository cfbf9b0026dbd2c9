//! Slide upload endpoints

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::ingestion::IngestOutcome;
use crate::server::state::AppState;
use crate::types::SlideDocument;

/// Error for one uploaded file
#[derive(Debug, Serialize)]
pub struct UploadError {
    pub filename: String,
    pub error: String,
}

/// Response for a slide upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub documents: Vec<IngestOutcome>,
    pub errors: Vec<UploadError>,
    pub total_chunks: usize,
}

/// POST /api/slides - Upload slide files into the retrieval index
pub async fn upload_slides(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut documents = Vec::new();
    let mut errors = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Internal(format!("Failed to read multipart field: {}", e)))?
    {
        let Some(filename) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };

        let data = match field.bytes().await {
            Ok(d) => d,
            Err(e) => {
                errors.push(UploadError {
                    filename,
                    error: format!("Failed to read file: {}", e),
                });
                continue;
            }
        };

        tracing::info!("Processing slide file: {} ({} bytes)", filename, data.len());

        match state.ingestor().ingest(&filename, data.to_vec()).await {
            Ok(outcome) => documents.push(outcome),
            Err(e) => {
                tracing::warn!("Failed to ingest {}: {}", filename, e);
                errors.push(UploadError {
                    filename,
                    error: e.to_string(),
                });
            }
        }
    }

    let total_chunks = documents
        .iter()
        .filter(|d| !d.duplicate)
        .map(|d| d.document.chunk_count)
        .sum();

    Ok(Json(UploadResponse {
        documents,
        errors,
        total_chunks,
    }))
}

/// GET /api/slides - List indexed slide files
pub async fn list_slides(State(state): State<AppState>) -> Result<Json<Vec<SlideDocument>>> {
    Ok(Json(state.db().list_slide_documents()?))
}

/// DELETE /api/slides/:id - Remove a slide file from the index
pub async fn delete_slides(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if state.db().delete_slide_document(&id)? {
        tracing::info!("Removed slide document {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::DocumentNotFound(id))
    }
}
