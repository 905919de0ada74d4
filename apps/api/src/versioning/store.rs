//! Persistence contract for the version log and the denormalized current state.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::diff::Diff;
use crate::models::resume::VersionRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Storage backend for resume threads.
///
/// Carried by `VersioningWorkflow` as `Arc<dyn VersionStore>`.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// All records of a thread in ascending `seq` order. Empty for an unknown thread.
    async fn load_versions_for_thread(
        &self,
        thread_id: Uuid,
    ) -> Result<Vec<VersionRecord>, StoreError>;

    /// Appends a record with the next `seq` for the thread.
    async fn append_version(
        &self,
        thread_id: Uuid,
        diff: &Diff,
        title: &str,
    ) -> Result<VersionRecord, StoreError>;

    /// `None` when the thread has never been saved.
    async fn load_current_state(&self, thread_id: Uuid) -> Result<Option<Value>, StoreError>;

    async fn update_current_state(&self, thread_id: Uuid, state: &Value)
        -> Result<(), StoreError>;

    /// Appends a record and replaces the current state as one unit.
    ///
    /// The default runs the two writes back to back. Backends with
    /// transactions override it so neither write lands without the other.
    async fn commit(
        &self,
        thread_id: Uuid,
        diff: &Diff,
        title: &str,
        new_state: &Value,
    ) -> Result<VersionRecord, StoreError> {
        let record = self.append_version(thread_id, diff, title).await?;
        self.update_current_state(thread_id, new_state).await?;
        Ok(record)
    }
}
