use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One immutable entry of a thread's version log.
///
/// `diff` is kept as raw JSON so replay can detect a null or malformed diff
/// instead of failing at row decode time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct VersionRecord {
    pub id: Uuid,
    pub thread_id: Uuid,
    /// Per-thread sequence number starting at 1. Replay order.
    pub seq: i64,
    pub diff: Value,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// History listing entry, without the diff payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionSummary {
    pub id: Uuid,
    pub seq: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl From<&VersionRecord> for VersionSummary {
    fn from(record: &VersionRecord) -> Self {
        Self {
            id: record.id,
            seq: record.seq,
            title: record.title.clone(),
            created_at: record.created_at,
        }
    }
}
