//! Axum route handlers for the version history API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::VersionSummary;
use crate::state::AppState;
use crate::versioning::{RevertOutcome, SaveOutcome};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SaveVersionRequest {
    pub state: Value,
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CommitStatus {
    Saved,
    Skipped,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveVersionResponse {
    pub status: CommitStatus,
    pub version: Option<VersionSummary>,
}

impl From<SaveOutcome> for SaveVersionResponse {
    fn from(outcome: SaveOutcome) -> Self {
        match outcome {
            SaveOutcome::Saved(record) => Self {
                status: CommitStatus::Saved,
                version: Some(VersionSummary::from(&record)),
            },
            SaveOutcome::Skipped => Self {
                status: CommitStatus::Skipped,
                version: None,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VersionStateResponse {
    pub thread_id: Uuid,
    pub version_id: Uuid,
    pub state: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RevertResponse {
    pub status: CommitStatus,
    pub version: Option<VersionSummary>,
    pub state: Value,
}

impl From<RevertOutcome> for RevertResponse {
    fn from(outcome: RevertOutcome) -> Self {
        let status = if outcome.record.is_some() {
            CommitStatus::Saved
        } else {
            CommitStatus::Skipped
        };
        Self {
            status,
            version: outcome.record.as_ref().map(VersionSummary::from),
            state: outcome.state,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/threads/:id/versions
///
/// Commits the submitted state as a new version. Returns 201 when a version
/// was written and 200 when the state was unchanged.
pub async fn handle_save_version(
    State(state): State<AppState>,
    Path(thread_id): Path<Uuid>,
    Json(request): Json<SaveVersionRequest>,
) -> Result<(StatusCode, Json<SaveVersionResponse>), AppError> {
    let outcome = state
        .workflow
        .save_version(thread_id, request.state, &request.title)
        .await?;

    let status = commit_status_code(matches!(outcome, SaveOutcome::Saved(_)));
    Ok((status, Json(outcome.into())))
}

/// GET /api/v1/threads/:id/versions
pub async fn handle_list_versions(
    State(state): State<AppState>,
    Path(thread_id): Path<Uuid>,
) -> Result<Json<Vec<VersionSummary>>, AppError> {
    Ok(Json(state.workflow.history(thread_id).await?))
}

/// GET /api/v1/threads/:id/versions/:version_id
///
/// Preview of a historical version. Nothing is written.
pub async fn handle_get_version(
    State(state): State<AppState>,
    Path((thread_id, version_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<VersionStateResponse>, AppError> {
    let reconstructed = state
        .workflow
        .reconstruct_at_version(thread_id, version_id)
        .await?;

    Ok(Json(VersionStateResponse {
        thread_id,
        version_id,
        state: reconstructed,
    }))
}

/// POST /api/v1/threads/:id/versions/:version_id/revert
///
/// Same status mapping as a save: 201 when a revert version was written,
/// 200 when the thread already was at that state.
pub async fn handle_revert(
    State(state): State<AppState>,
    Path((thread_id, version_id)): Path<(Uuid, Uuid)>,
) -> Result<(StatusCode, Json<RevertResponse>), AppError> {
    let outcome = state
        .workflow
        .revert_to_version(thread_id, version_id)
        .await?;

    let status = commit_status_code(outcome.record.is_some());
    Ok((status, Json(outcome.into())))
}

fn commit_status_code(written: bool) -> StatusCode {
    if written {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    }
}
