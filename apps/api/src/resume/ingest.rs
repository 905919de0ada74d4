use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::models::resume::VersionSummary;
use crate::models::sections::parse_document;
use crate::resume::prompts::{RESUME_PARSE_PROMPT, RESUME_PARSE_SYSTEM};
use crate::state::AppState;
use crate::versioning::SaveOutcome;

pub const INITIAL_VERSION_TITLE: &str = "Initial upload";

/// A resume file received from the client.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ResumeUpload {
    pub fn is_pdf(&self) -> bool {
        self.content_type.as_deref() == Some("application/pdf")
            || self.bytes.starts_with(b"%PDF")
            || self.filename.to_ascii_lowercase().ends_with(".pdf")
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub thread_id: Uuid,
    pub version: VersionSummary,
    pub source_key: String,
    pub state: Value,
}

/// Pulls plain text out of an uploaded PDF or UTF-8 text file.
pub fn extract_text(upload: &ResumeUpload) -> Result<String, AppError> {
    if upload.bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }

    let text = if upload.is_pdf() {
        pdf_extract::extract_text_from_mem(&upload.bytes)
            .map_err(|e| AppError::UnprocessableEntity(format!("Could not read PDF: {e}")))?
    } else {
        String::from_utf8(upload.bytes.to_vec()).map_err(|_| {
            AppError::Validation("File must be a PDF or UTF-8 text".to_string())
        })?
    };

    if text.trim().is_empty() {
        return Err(AppError::UnprocessableEntity(
            "No text could be extracted from the file".to_string(),
        ));
    }
    Ok(text)
}

/// Object key for the original upload: `uploads/{thread_id}/{filename}`.
pub fn upload_key(thread_id: Uuid, filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let safe = safe.trim_matches('.');
    let safe = if safe.is_empty() { "resume" } else { safe };
    format!("uploads/{thread_id}/{safe}")
}

/// Asks the LLM to split resume text into sections. The answer must decode
/// as a non-empty resume document.
pub async fn parse_sections(llm: &LlmClient, text: &str) -> Result<Value, AppError> {
    let prompt = RESUME_PARSE_PROMPT.replace("{resume_text}", text);
    let parsed: Value = llm
        .call_json(&prompt, RESUME_PARSE_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Failed to parse resume: {e}")))?;

    let doc = parse_document(&parsed).map_err(|e| {
        AppError::UnprocessableEntity(format!("Parsed resume has an unexpected shape: {e}"))
    })?;
    if doc.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "No resume sections could be extracted".to_string(),
        ));
    }
    Ok(parsed)
}

/// Parses the uploaded resume, stores the original file and commits the
/// result as version 1 of a new thread.
///
/// Nothing is written to S3 unless the parse succeeded.
pub async fn ingest_resume(
    state: &AppState,
    upload: ResumeUpload,
) -> Result<IngestResponse, AppError> {
    let text = extract_text(&upload)?;
    let sections = parse_sections(&state.llm, &text).await?;

    let thread_id = Uuid::new_v4();
    let key = upload_key(thread_id, &upload.filename);
    let content_type = upload
        .content_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".to_string());
    state
        .s3
        .put_object()
        .bucket(&state.config.s3_bucket)
        .key(&key)
        .body(ByteStream::from(upload.bytes.clone()))
        .content_type(content_type)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("Upload failed: {e}")))?;
    info!("Stored upload at s3://{}/{}", state.config.s3_bucket, key);

    let record = match state
        .workflow
        .save_version(thread_id, sections.clone(), INITIAL_VERSION_TITLE)
        .await?
    {
        SaveOutcome::Saved(record) => record,
        SaveOutcome::Skipped => {
            return Err(AppError::UnprocessableEntity(
                "Parsed resume is empty".to_string(),
            ))
        }
    };
    info!("Created thread {thread_id} from upload '{}'", upload.filename);

    Ok(IngestResponse {
        thread_id,
        version: VersionSummary::from(&record),
        source_key: key,
        state: sections,
    })
}
