//! Axum route handlers for resume threads.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::diff::Diff;
use crate::errors::AppError;
use crate::models::sections::parse_document;
use crate::resume::ingest::{ingest_resume, IngestResponse, ResumeUpload};
use crate::resume::render::render_document_to_md;
use crate::resume::session::EditSession;
use crate::state::AppState;

const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Serialize, Deserialize)]
pub struct ThreadStateResponse {
    pub thread_id: Uuid,
    pub state: Value,
}

#[derive(Debug, Deserialize)]
pub struct ChangeCheckRequest {
    pub draft: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChangeCheckResponse {
    pub has_unsaved_changes: bool,
    pub diff: Diff,
}

/// POST /api/v1/threads
///
/// Multipart upload with a `file` field (PDF or plain text). Creates a new
/// thread whose first version is the parsed resume.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<IngestResponse>), AppError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or("resume").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
        upload = Some(ResumeUpload {
            filename,
            content_type,
            bytes,
        });
        break;
    }

    let upload = upload.ok_or_else(|| {
        AppError::Validation(format!("Multipart field '{UPLOAD_FIELD}' is required"))
    })?;

    let response = ingest_resume(&state, upload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/threads/:id
pub async fn handle_get_thread(
    State(state): State<AppState>,
    Path(thread_id): Path<Uuid>,
) -> Result<Json<ThreadStateResponse>, AppError> {
    let current = state.workflow.current_state(thread_id).await?;
    Ok(Json(ThreadStateResponse {
        thread_id,
        state: current,
    }))
}

/// GET /api/v1/threads/:id/render
///
/// Markdown rendering of the current state.
pub async fn handle_render(
    State(state): State<AppState>,
    Path(thread_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let current = state.workflow.current_state(thread_id).await?;
    let doc = parse_document(&current).map_err(|e| {
        AppError::Internal(anyhow::anyhow!(
            "Stored state of thread {thread_id} is not a resume document: {e}"
        ))
    })?;

    Ok((
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        render_document_to_md(&doc),
    ))
}

/// POST /api/v1/threads/:id/changes
///
/// Compares a client draft against the persisted state without saving.
pub async fn handle_check_changes(
    State(state): State<AppState>,
    Path(thread_id): Path<Uuid>,
    Json(request): Json<ChangeCheckRequest>,
) -> Result<Json<ChangeCheckResponse>, AppError> {
    let baseline = state.workflow.current_state(thread_id).await?;
    let session = EditSession::new(baseline).edit(request.draft);

    Ok(Json(ChangeCheckResponse {
        has_unsaved_changes: session.has_unsaved_changes(),
        diff: session.pending_diff(),
    }))
}
